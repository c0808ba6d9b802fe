// File: src/template.rs
// Purpose: `{key}` placeholder expansion for component templates

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Anything that can answer "what is the value of `key`".
pub trait PropertySource {
    fn property(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl PropertySource for [(&str, &str)] {
    fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| Cow::Borrowed(*value))
    }
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid")
});

/// Replace every `{key}` with the matching property.
///
/// Placeholders without a property are left exactly as written so they stay
/// visible in the rendered markup.
///
/// # Examples
/// ```
/// use sprig_parser::expand;
///
/// let props = [("id", "card-1"), ("title", "Hello")];
/// let html = expand(r#"<div id="{id}">{title} {missing}</div>"#, &props[..]);
/// assert_eq!(html, r#"<div id="card-1">Hello {missing}</div>"#);
/// ```
pub fn expand<P: PropertySource + ?Sized>(template: &str, properties: &P) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match properties.property(&caps[1]) {
            Some(value) => value.into_owned(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_expansion() {
        let p = props(&[("id", "x1"), ("name", "Alice")]);
        assert_eq!(
            expand(r#"<p id="{id}">Hello, {name}!</p>"#, &p),
            r#"<p id="x1">Hello, Alice!</p>"#
        );
    }

    #[test]
    fn test_missing_placeholder_left_verbatim() {
        let p = props(&[("id", "x1")]);
        assert_eq!(expand("<p>{missing}</p>", &p), "<p>{missing}</p>");
    }

    #[test]
    fn test_repeated_and_adjacent_keys() {
        let p = props(&[("a", "1"), ("b", "2")]);
        assert_eq!(expand("{a}{b}{a}", &p), "121");
    }

    #[test]
    fn test_value_is_inserted_raw() {
        let p = props(&[("innerHTML", "<b>bold</b>")]);
        assert_eq!(expand("<div>{innerHTML}</div>", &p), "<div><b>bold</b></div>");
    }

    #[test]
    fn test_expanded_values_are_not_rescanned() {
        let p = props(&[("a", "{b}"), ("b", "nope")]);
        assert_eq!(expand("{a}", &p), "{b}");
    }

    #[test]
    fn test_unbalanced_braces() {
        let p = props(&[("a", "1")]);
        assert_eq!(expand("{}", &p), "{}");
        assert_eq!(expand("{a", &p), "{a");
        assert_eq!(expand("a}", &p), "a}");
    }
}
