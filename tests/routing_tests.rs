//! End-to-end behavior of compile → match → build.

use axum::http::Method;
use macro_router::pattern::{Lexer, TokenKind};
use macro_router::routing::{BuildError, CompileError, Dispatch, RouteError};
use macro_router::{Macros, Router};

mod common;

fn matched(d: Dispatch<'_, ()>) -> (String, Vec<(String, String)>) {
    match d {
        Dispatch::Matched(m) => (
            m.route.name().to_string(),
            m.params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn test_priority_follows_registration_order() {
    let router = common::router(&[
        (Method::GET, "/v/{id:int}", "int"),
        (Method::GET, "/v/{name:string}", "string"),
    ]);
    assert_eq!(matched(router.dispatch(&Method::GET, "", "/v/42")).0, "int");
    assert_eq!(matched(router.dispatch(&Method::GET, "", "/v/abc")).0, "string");

    let router = common::router(&[
        (Method::GET, "/v/{name:string}", "string"),
        (Method::GET, "/v/{id:int}", "int"),
    ]);
    assert_eq!(matched(router.dispatch(&Method::GET, "", "/v/42")).0, "string");
}

#[test]
fn test_wildcard_finality() {
    let mut router: Router<()> = Router::new(Macros::defaults());
    let err = router
        .compile(Method::GET, "", "/files/{a:path}/more", (), "bad")
        .unwrap_err();
    match err {
        RouteError::Compile { errors, .. } => {
            assert!(matches!(errors[0], CompileError::TrailingNotLast { .. }))
        }
        other => panic!("unexpected {other:?}"),
    }

    router
        .compile(Method::GET, "", "/files/{rest:path}", (), "files")
        .unwrap();
    let (_, params) = matched(router.dispatch(&Method::GET, "", "/files/a/b/c"));
    assert_eq!(params, vec![("rest".to_string(), "a/b/c".to_string())]);
}

#[test]
fn test_range_arity_and_types() {
    let mut router: Router<()> = Router::new(Macros::defaults());
    assert!(router
        .compile(Method::GET, "", "/a/{n:int range(1)}", (), "one")
        .is_err());
    assert!(router
        .compile(Method::GET, "", "/b/{n:int range(a,b)}", (), "idents")
        .is_err());
    router
        .compile(Method::GET, "", "/c/{n:int range(1,5)}", (), "ok")
        .unwrap();

    for n in 1..=5 {
        let path = format!("/c/{n}");
        assert_eq!(matched(router.dispatch(&Method::GET, "", &path)).0, "ok");
    }
    for bad in ["/c/0", "/c/6"] {
        assert!(matches!(
            router.dispatch(&Method::GET, "", bad),
            Dispatch::NotFound { .. }
        ));
    }
}

#[test]
fn test_lexer_eof_is_idempotent() {
    let mut lexer = Lexer::new("{id}");
    while lexer.next_token().kind != TokenKind::Eof {}
    for _ in 0..5 {
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Eof);
        assert_eq!(token.span.start, 4);
    }
}

#[test]
fn test_method_not_allowed_vs_not_found() {
    let router = common::router(&[(Method::GET, "/items/{id:int}", "item")]);
    match router.dispatch(&Method::POST, "", "/items/42") {
        Dispatch::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::GET]),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        router.dispatch(&Method::GET, "", "/missing"),
        Dispatch::NotFound { status: None }
    ));
}

#[test]
fn test_user_id_scenario() {
    let router = common::router(&[(Method::GET, "/api/users/{userid:uint64 min(1)}", "user")]);

    let (name, params) = matched(router.dispatch(&Method::GET, "", "/api/users/7"));
    assert_eq!(name, "user");
    assert_eq!(params, vec![("userid".to_string(), "7".to_string())]);

    assert!(matches!(
        router.dispatch(&Method::GET, "", "/api/users/0"),
        Dispatch::NotFound { status: None }
    ));
    assert!(matches!(
        router.dispatch(&Method::GET, "", "/api/users/-3"),
        Dispatch::NotFound { .. }
    ));
}

#[test]
fn test_else_code_from_sibling_routes() {
    let router = common::router(&[
        (Method::GET, "/pay/{id:int else 402}", "pay"),
        (Method::GET, "/docs/{id:int}", "docs"),
    ]);
    assert_eq!(router.dispatch(&Method::GET, "", "/pay/abc").status_code(), 402);
    assert_eq!(router.dispatch(&Method::GET, "", "/docs/abc").status_code(), 404);
}

#[test]
fn test_parse_errors_are_accumulated() {
    let mut router: Router<()> = Router::new(Macros::defaults());
    let err = router
        .compile(Method::GET, "", "/{id:nope range(1,} x", (), "bad")
        .unwrap_err();
    let text = err.to_string();
    assert!(text.lines().count() >= 3, "{text}");
    assert!(text.contains("unexpected parameter type: nope"), "{text}");
}

#[test]
fn test_string_functions_on_other_types() {
    let router = common::router(&[
        (Method::GET, "/f/{name:file suffix(.png)}", "png"),
        (Method::GET, "/s/{code:string regexp([a-z]{2}-[0-9]{1,3})}", "code"),
        (Method::GET, "/e/{kind:alphabetical eqor(cat,dog)}", "pet"),
    ]);
    assert_eq!(matched(router.dispatch(&Method::GET, "", "/f/logo.png")).0, "png");
    assert!(matches!(
        router.dispatch(&Method::GET, "", "/f/logo.jpg"),
        Dispatch::NotFound { .. }
    ));
    assert_eq!(matched(router.dispatch(&Method::GET, "", "/s/ab-12")).0, "code");
    assert!(matches!(
        router.dispatch(&Method::GET, "", "/s/ab-1234"),
        Dispatch::NotFound { .. }
    ));
    assert_eq!(matched(router.dispatch(&Method::GET, "", "/e/dog")).0, "pet");
    assert!(matches!(
        router.dispatch(&Method::GET, "", "/e/cow"),
        Dispatch::NotFound { .. }
    ));
}

#[test]
fn test_build_and_match_agree() {
    let router = common::router(&[(
        Method::GET,
        "/games/{gameID:int}/clans/{clanPublicID:int range(1,5)}",
        "clan",
    )]);
    let path = router
        .build("clan", &[("clanPublicID", "3"), ("gameID", "-12")])
        .unwrap();
    assert_eq!(path, "/games/-12/clans/3");

    let (_, params) = matched(router.dispatch(&Method::GET, "", &path));
    assert_eq!(
        params,
        vec![
            ("gameID".to_string(), "-12".to_string()),
            ("clanPublicID".to_string(), "3".to_string()),
        ]
    );

    assert!(matches!(
        router.build("clan", &[("gameID", "1")]),
        Err(BuildError::MissingParameter { .. })
    ));
    assert!(matches!(
        router.build_checked("clan", &[("gameID", "1"), ("clanPublicID", "9")]),
        Err(BuildError::InvalidValue { .. })
    ));
}
