use std::collections::HashMap;

use crate::path::normalize_path;
use crate::pattern::{is_dynamic, CompiledPattern};
use crate::RouteError;

/// Path used for the fallback route unless configured otherwise.
pub const DEFAULT_NOT_FOUND_PATH: &str = "/404";

/// A registered route: normalized pattern plus caller payload.
#[derive(Debug, Clone)]
pub struct Route<H> {
    /// Normalized pattern like "/users/:id"
    pub pattern: String,
    /// Compiled matcher, `None` for literal routes
    matcher: Option<CompiledPattern>,
    pub handler: H,
}

impl<H> Route<H> {
    pub fn is_dynamic(&self) -> bool {
        self.matcher.is_some()
    }

    /// Parameter names declared by the pattern.
    pub fn params(&self) -> &[String] {
        self.matcher
            .as_ref()
            .map(CompiledPattern::params)
            .unwrap_or(&[])
    }
}

/// Result of matching a location.
#[derive(Debug, Clone)]
pub struct RouteMatch<H> {
    /// Pattern of the route that produced the match
    pub pattern: String,
    pub handler: H,
    /// Extracted named parameters
    pub params: HashMap<String, String>,
    /// Normalized location that was matched
    pub path: String,
    /// Whether this is the not-found fallback
    pub is_fallback: bool,
}

/// Route storage: literal map for O(1) hits, then patterns in registration order.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    literal: HashMap<String, Route<H>>,
    patterns: Vec<Route<H>>,
    not_found_path: String,
}

impl<H: Clone> RouteTable<H> {
    pub fn new() -> Self {
        Self {
            literal: HashMap::new(),
            patterns: Vec::new(),
            not_found_path: DEFAULT_NOT_FOUND_PATH.to_string(),
        }
    }

    /// Uses `path` as the fallback route for unmatched locations.
    ///
    /// ```
    /// use sprig_router::RouteTable;
    ///
    /// let mut table = RouteTable::new().with_not_found_path("/missing/");
    /// table.register("/missing", "missing").unwrap();
    /// let m = table.match_path("/nowhere").unwrap();
    /// assert!(m.is_fallback);
    /// assert_eq!(m.path, "/nowhere");
    /// ```
    pub fn with_not_found_path(mut self, path: &str) -> Self {
        self.not_found_path = normalize_path(path).into_owned();
        self
    }

    pub fn not_found_path(&self) -> &str {
        &self.not_found_path
    }

    /// Registers `handler` under `path`.
    ///
    /// Literal paths replace an earlier registration of the same path;
    /// dynamic paths are appended and tried in the order they were added.
    pub fn register(&mut self, path: &str, handler: H) -> Result<(), RouteError> {
        let pattern = normalize_path(path).into_owned();

        if is_dynamic(&pattern) {
            let matcher = CompiledPattern::compile(&pattern)?;
            self.patterns.push(Route {
                pattern,
                matcher: Some(matcher),
                handler,
            });
        } else {
            self.literal.insert(
                pattern.clone(),
                Route {
                    pattern,
                    matcher: None,
                    handler,
                },
            );
        }

        Ok(())
    }

    /// Resolves a location.
    ///
    /// Literal routes win over patterns, patterns are tried in registration
    /// order, and the not-found route catches the rest. Without a not-found
    /// route the miss is an error naming the location.
    pub fn match_path(&self, path: &str) -> Result<RouteMatch<H>, RouteError> {
        let path = normalize_path(path);

        if let Some(route) = self.literal.get(&*path) {
            return Ok(Self::build_match(route, HashMap::new(), &path, false));
        }

        let dynamic = self.patterns.iter().find_map(|route| {
            route
                .matcher
                .as_ref()
                .and_then(|matcher| matcher.captures(&path))
                .map(|params| (route, params))
        });
        if let Some((route, params)) = dynamic {
            return Ok(Self::build_match(route, params, &path, false));
        }

        match self.literal.get(&self.not_found_path) {
            Some(route) => {
                tracing::debug!("No route for {}, using {}", path, self.not_found_path);
                Ok(Self::build_match(route, HashMap::new(), &path, true))
            }
            None => Err(RouteError::NotFound(path.into_owned())),
        }
    }

    fn build_match(
        route: &Route<H>,
        params: HashMap<String, String>,
        path: &str,
        is_fallback: bool,
    ) -> RouteMatch<H> {
        RouteMatch {
            pattern: route.pattern.clone(),
            handler: route.handler.clone(),
            params,
            path: path.to_string(),
            is_fallback,
        }
    }

    /// Literal route registered at exactly `path` (after normalization).
    pub fn get(&self, path: &str) -> Option<&Route<H>> {
        self.literal.get(&*normalize_path(path))
    }

    /// Dynamic routes in match order.
    pub fn patterns(&self) -> &[Route<H>] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.literal.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
