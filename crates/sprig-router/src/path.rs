//! Path utilities for validation and normalization
//!
//! All functions are pure: given the same input they produce the same output.

use std::borrow::Cow;

/// Validates if a path is already in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
///
/// # Examples
///
/// ```
/// use sprig_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/users/:id"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("staff"));
/// assert!(!is_valid_path("/staff/"));
/// assert!(!is_valid_path("/a//b"));
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when the input is already canonical, so matching
/// an ordinary location does not allocate.
///
/// Normalization is idempotent: `normalize_path(&normalize_path(p)) == normalize_path(p)`.
///
/// # Examples
///
/// ```
/// use sprig_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// assert!(matches!(normalize_path("/staff"), Cow::Borrowed("/staff")));
/// assert_eq!(normalize_path("/staff/"), "/staff");
/// assert_eq!(normalize_path("\\users\\7"), "/users/7");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", "/")]
    #[case("", "/")]
    #[case("///", "/")]
    #[case("/staff/", "/staff")]
    #[case("staff", "/staff")]
    #[case("/a//b///c/", "/a/b/c")]
    #[case("\\a\\b", "/a/b")]
    #[case("/users/:id/", "/users/:id")]
    fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(input), expected);
    }

    #[rstest]
    #[case("/staff/")]
    #[case("x//y/")]
    #[case("/docs/*")]
    fn test_normalize_is_idempotent(#[case] input: &str) {
        let once = normalize_path(input).into_owned();
        let twice = normalize_path(&once);
        assert_eq!(twice, once);
        assert!(matches!(twice, Cow::Borrowed(_)));
    }
}
