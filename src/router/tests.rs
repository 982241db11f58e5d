use super::{MatchMode, Router};
use crate::dispatcher::{HandlerError, RequestContext, Responder};
use http::Method;

fn noop(_: &RequestContext, res: &mut Responder) -> Result<(), HandlerError> {
    res.json(serde_json::Value::Null)
}

#[test]
fn test_root_path() {
    let mut router = Router::new();
    router.get("/", noop).unwrap();
    let m = router.match_route(&Method::GET, "/").unwrap();
    assert_eq!(m.route.pattern_id(), "get/");
    assert!(m.params.is_empty());
    assert!(router.match_route(&Method::GET, "/x").is_none());
    assert!(router.match_route(&Method::POST, "/").is_none());
}

#[test]
fn test_parameterized_path() {
    let mut router = Router::new();
    router.get("/items/:id", noop).unwrap();
    let m = router.match_route(&Method::GET, "/items/123").unwrap();
    assert_eq!(m.get_param("id"), Some("123"));
    assert_eq!(m.params.len(), 1);
}

#[test]
fn test_nested_path() {
    let mut router = Router::new();
    router.get("/a/:b/c", noop).unwrap();
    assert_eq!(
        router
            .match_route(&Method::GET, "/a/1/c")
            .unwrap()
            .get_param("b"),
        Some("1")
    );
    assert!(router.match_route(&Method::GET, "/a/1/d").is_none());
}

#[test]
fn test_static_segments_only_grow() {
    let mut router = Router::new();
    router.get("/users/:id", noop).unwrap();
    router.post("/users", noop).unwrap();
    router.get("/admin/users", noop).unwrap();
    let statics = router.static_segments();
    assert!(statics.contains("users"));
    assert!(statics.contains("admin"));
    assert!(!statics.contains("id"));
    assert_eq!(statics.len(), 2);
}

#[test]
fn test_mode_parse() {
    assert_eq!(MatchMode::parse("per-route"), Some(MatchMode::PerRoute));
    assert_eq!(MatchMode::parse(" Global-Literals "), Some(MatchMode::GlobalLiterals));
    assert_eq!(MatchMode::parse("fastest"), None);
}
