//! Router behaviour that is decided before any statement reaches the database.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::{call, fake_app, token_for};
use studyplanner::{auth::jwt::JwtKeys, config::JwtConfig};

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let (app, _) = fake_app();
    let (status, body) = call(&app, Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Route not found" }));
}

#[tokio::test]
async fn root_describes_the_api() {
    let (app, _) = fake_app();
    let (status, body) = call(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "StudyPlanner API is running");
    assert_eq!(body["endpoints"]["courses"], "/api/courses");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (app, _) = fake_app();
    for uri in [
        "/api/courses",
        "/api/courses/1",
        "/api/courses/1/assignments",
        "/api/assignments",
        "/api/assignments/1",
        "/api/auth/me",
    ] {
        let (status, body) = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn auth_runs_before_body_validation() {
    let (app, _) = fake_app();
    let (status, _) = call(&app, Method::PUT, "/api/courses/1", None, Some("{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_authorization_header_is_rejected() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);
    for value in [format!("Token {}", token), token.clone(), "Bearer ".to_string()] {
        let req = Request::builder()
            .uri("/api/courses")
            .header(header::AUTHORIZATION, value.clone())
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", value);
    }
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() {
    let (app, _) = fake_app();
    let foreign = JwtKeys::from_config(&JwtConfig {
        secret: "someone-else".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 5,
    })
    .sign(1)
    .unwrap();
    let (status, body) = call(&app, Method::GET, "/api/assignments", Some(foreign.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn empty_course_patch_is_rejected_before_storage() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);
    let (status, body) = call(&app, Method::PUT, "/api/courses/1", Some(token.as_str()), Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "No fields to update" }));
}

#[tokio::test]
async fn empty_assignment_patch_is_rejected_before_storage() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);
    let (status, body) =
        call(&app, Method::PUT, "/api/assignments/1", Some(token.as_str()), Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");
}

#[tokio::test]
async fn values_longer_than_their_columns_are_rejected() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);

    let payload = json!({
        "name": "N".repeat(101),
        "email": "long@example.com",
        "password": "password123"
    })
    .to_string();
    let (status, body) = call(&app, Method::POST, "/api/auth/register", None, Some(payload.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "name must be at most 100 characters" }));

    let payload = json!({ "course_name": "Web", "course_code": "X".repeat(51) }).to_string();
    let (status, body) =
        call(&app, Method::POST, "/api/courses", Some(token.as_str()), Some(payload.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "course_code must be at most 50 characters");

    let payload = json!({ "course_name": "C".repeat(201) }).to_string();
    let (status, _) =
        call(&app, Method::PUT, "/api/courses/1", Some(token.as_str()), Some(payload.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let payload = json!({ "course_id": 1, "title": "T".repeat(201), "due_date": "2026-02-15" }).to_string();
    let (status, body) =
        call(&app, Method::POST, "/api/assignments", Some(token.as_str()), Some(payload.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "title must be at most 200 characters");
}

#[tokio::test]
async fn unsupported_method_on_a_known_path_uses_the_envelope() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);
    for (method, uri) in [
        (Method::PATCH, "/api/courses"),
        (Method::DELETE, "/api/assignments"),
        (Method::POST, "/api/courses/1"),
        (Method::GET, "/api/auth/register"),
    ] {
        let (status, body) = call(&app, method.clone(), uri, Some(token.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body, json!({ "success": false, "message": "Route not found" }));
    }
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/courses",
        Some(token.as_str()),
        Some(r#"{"course_name": "Web Programming"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide course_name and course_code");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/assignments",
        Some(token.as_str()),
        Some(r#"{"course_id": 1, "title": "T1"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bad_json_and_bad_ids_use_the_envelope() {
    let (app, state) = fake_app();
    let token = token_for(&state, 1);

    let (status, body) =
        call(&app, Method::POST, "/api/courses", Some(token.as_str()), Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::GET, "/api/courses/abc", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/assignments",
        Some(token.as_str()),
        Some(r#"{"course_id": 1, "title": "T1", "due_date": "15/02/2026"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_and_login_validate_input() {
    let (app, _) = fake_app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(r#"{"email": "a@example.com", "password": "password123"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide name, email, and password");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(r#"{"name": "A", "email": "not-an-email", "password": "password123"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(r#"{"email": "a@example.com"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide email and password");
}
