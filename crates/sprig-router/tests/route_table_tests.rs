//! Integration tests for sprig-router
//!
//! Covers literal/pattern precedence, registration order, normalization of
//! both patterns and locations, and the not-found policy.

use pretty_assertions::assert_eq;
use rstest::rstest;
use sprig_router::*;

fn table(routes: &[(&str, &'static str)]) -> RouteTable<&'static str> {
    let mut table = RouteTable::new();
    for (path, handler) in routes {
        table.register(path, *handler).unwrap();
    }
    table
}

#[rstest]
#[case("/staff")]
#[case("/staff/")]
#[case("/staff//")]
fn test_trailing_slash_is_ignored(#[case] location: &str) {
    let table = table(&[("/staff", "staff")]);
    let m = table.match_path(location).unwrap();
    assert_eq!(m.handler, "staff");
    assert_eq!(m.path, "/staff");
}

#[test]
fn test_registration_is_normalized() {
    let table = table(&[("/staff/", "staff")]);
    assert!(table.get("/staff").is_some());
    assert_eq!(table.match_path("/staff").unwrap().pattern, "/staff");
}

#[test]
fn test_root_route() {
    let table = table(&[("/", "home")]);
    assert_eq!(table.match_path("/").unwrap().handler, "home");
    assert_eq!(table.match_path("").unwrap().handler, "home");
}

#[test]
fn test_literal_beats_pattern_regardless_of_order() {
    let table = table(&[("/:id", "by-id"), ("/about", "about")]);

    let m = table.match_path("/about").unwrap();
    assert_eq!(m.handler, "about");
    assert!(m.params.is_empty());

    let m = table.match_path("/42").unwrap();
    assert_eq!(m.handler, "by-id");
    assert_eq!(m.params.get("id"), Some(&"42".to_string()));
}

#[test]
fn test_patterns_checked_in_registration_order() {
    let table = table(&[("/users/*", "wildcard"), ("/users/:id", "user")]);
    assert_eq!(table.match_path("/users/7").unwrap().handler, "wildcard");

    let table = self::table(&[("/users/:id", "user"), ("/users/*", "wildcard")]);
    assert_eq!(table.match_path("/users/7").unwrap().handler, "user");
    assert_eq!(table.match_path("/users/7/edit").unwrap().handler, "wildcard");
}

#[test]
fn test_multiple_params() {
    let table = table(&[("/users/:user/posts/:post", "post")]);
    let m = table.match_path("/users/ada/posts/9/").unwrap();
    assert_eq!(m.params.get("user"), Some(&"ada".to_string()));
    assert_eq!(m.params.get("post"), Some(&"9".to_string()));
    assert_eq!(m.pattern, "/users/:user/posts/:post");
    assert!(!m.is_fallback);
}

#[test]
fn test_unmatched_without_fallback_names_the_path() {
    let table = table(&[("/", "home")]);
    let err = table.match_path("/x/y").unwrap_err();
    assert_eq!(err, RouteError::NotFound("/x/y".to_string()));
    assert!(err.to_string().contains("/x/y"));
}

#[test]
fn test_unmatched_with_fallback() {
    let table = table(&[("/", "home"), ("/404", "not-found")]);
    let m = table.match_path("/x/y").unwrap();
    assert_eq!(m.handler, "not-found");
    assert!(m.is_fallback);
    assert_eq!(m.path, "/x/y");
    assert_eq!(m.pattern, "/404");
}

#[test]
fn test_direct_hit_on_fallback_route_is_not_flagged() {
    let table = table(&[("/404", "not-found")]);
    assert!(!table.match_path("/404").unwrap().is_fallback);
}

#[test]
fn test_literal_reregistration_replaces() {
    let table = table(&[("/a", "first"), ("/a/", "second")]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.match_path("/a").unwrap().handler, "second");
}

#[test]
fn test_invalid_pattern_is_reported() {
    let mut table: RouteTable<()> = RouteTable::new();
    let err = table.register("/:1bad", ()).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
    assert!(table.is_empty());
}
