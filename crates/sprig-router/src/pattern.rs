//! Route pattern compilation
//!
//! `:name` segments become named captures matching one path segment, a bare
//! `*` matches anything (including `/`), and `*name` captures that remainder
//! under `name`. Everything else matches literally.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::RouteError;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\w+|\*\w*").expect("pattern token regex is valid"));

/// Whether a path carries parameter or wildcard markers.
pub fn is_dynamic(path: &str) -> bool {
    path.contains(':') || path.contains('*')
}

/// A pattern compiled to an anchored regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    params: Vec<String>,
}

impl CompiledPattern {
    /// # Examples
    ///
    /// ```
    /// use sprig_router::CompiledPattern;
    ///
    /// let pattern = CompiledPattern::compile("/users/:id/files/*rest").unwrap();
    /// let params = pattern.captures("/users/7/files/a/b.txt").unwrap();
    /// assert_eq!(params["id"], "7");
    /// assert_eq!(params["rest"], "a/b.txt");
    /// assert!(pattern.captures("/users/7").is_none());
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let mut source = String::from("^");
        let mut params = Vec::new();
        let mut last = 0;

        for token in TOKEN.find_iter(pattern) {
            source.push_str(&regex::escape(&pattern[last..token.start()]));

            let text = token.as_str();
            match text.strip_prefix(':') {
                Some(name) => {
                    source.push_str(&format!("(?P<{}>[^/]+)", name));
                    params.push(name.to_string());
                }
                None => {
                    let name = &text[1..];
                    if name.is_empty() {
                        source.push_str(".*");
                    } else {
                        source.push_str(&format!("(?P<{}>.*)", name));
                        params.push(name.to_string());
                    }
                }
            }

            last = token.end();
        }

        source.push_str(&regex::escape(&pattern[last..]));
        source.push('$');

        let regex = Regex::new(&source).map_err(|err| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;

        Ok(Self { regex, params })
    }

    /// Parameter names in pattern order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Named parameters when `path` matches, `None` otherwise.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }
}
