use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::auth_routes;
use notification_cell::RecordingNotifier;
use shared_database::AppState;
use shared_models::dentist::DentistProfile;
use shared_utils::password::verify_password;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn app(state: &Arc<AppState>) -> Router {
    auth_routes(state.clone())
}

fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::in_memory(
        TestConfig::default().to_app_config(),
        Arc::new(RecordingNotifier::new()),
    ))
}

async fn send(app: Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(state: &Arc<AppState>) -> String {
    register_session(state).await["token"].as_str().unwrap().to_string()
}

async fn register_session(state: &Arc<AppState>) -> Value {
    let (status, json) = send(
        app(state),
        "POST",
        "/register",
        None,
        Some(json!({
            "name": "Jamie Rivera",
            "email": "jamie@example.com",
            "password": "floss-daily",
            "phone": "+15550001000",
            "gender": "other"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

#[tokio::test]
async fn test_register_then_me_includes_profile() {
    let state = create_test_state();
    let token = register(&state).await;

    let (status, json) = send(app(&state), "GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "jamie@example.com");
    assert_eq!(json["user"]["profile"]["phone"], "+15550001000");
    assert_eq!(json["user"]["profile"]["gender"], "other");
}

#[tokio::test]
async fn test_me_for_dentist_returns_dentist_profile() {
    let state = create_test_state();
    let dentist = TestUser::dentist("dr@example.com");
    state.users.insert_user(dentist.to_account()).await.unwrap();
    state
        .profiles
        .save_dentist_profile(DentistProfile::new(dentist.uuid(), "DDS-9009".to_string()))
        .await
        .unwrap();
    let token = JwtTestUtils::create_test_token(&dentist, &TestConfig::default().jwt_secret, None);

    let (status, json) = send(app(&state), "GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["role"], "dentist");
    assert_eq!(json["user"]["profile"]["licenseNumber"], "DDS-9009");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let state = create_test_state();

    let (status, _) = send(app(&state), "GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let malformed = JwtTestUtils::create_malformed_token();
    let (status, _) = send(app(&state), "GET", "/me", Some(&malformed), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = JwtTestUtils::create_expired_token(&TestUser::default(), &TestConfig::default().jwt_secret);
    let (status, _) = send(app(&state), "GET", "/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A valid token for an account that no longer exists.
    let ghost = TestUser::patient("ghost@example.com");
    let token = JwtTestUtils::create_test_token(&ghost, &TestConfig::default().jwt_secret, None);
    let (status, _) = send(app(&state), "GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_account_name_and_email() {
    let state = create_test_state();
    let token = register(&state).await;
    state
        .users
        .insert_user(TestUser::patient("taken@example.com").to_account())
        .await
        .unwrap();

    let (status, json) = send(
        app(&state),
        "PUT",
        "/profile",
        Some(&token),
        Some(json!({ "name": "Jamie R.", "email": "Jamie.R@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["name"], "Jamie R.");
    assert_eq!(json["user"]["email"], "jamie.r@example.com");

    let (status, _) = send(
        app(&state),
        "PUT",
        "/profile",
        Some(&token),
        Some(json!({ "email": "taken@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let state = create_test_state();
    let token = register(&state).await;

    let (status, json) = send(
        app(&state),
        "PUT",
        "/password",
        Some(&token),
        Some(json!({ "currentPassword": "guess", "newPassword": "brush-twice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Current password is incorrect");

    let (status, _) = send(
        app(&state),
        "PUT",
        "/password",
        Some(&token),
        Some(json!({ "currentPassword": "floss-daily", "newPassword": "brush-twice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let account = state.users.find_user_by_email("jamie@example.com").await.unwrap().unwrap();
    assert!(verify_password("brush-twice", &account.password_hash).unwrap());

    let (status, _) = send(
        app(&state),
        "POST",
        "/login",
        None,
        Some(json!({ "email": "jamie@example.com", "password": "floss-daily" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_reissues_for_active_accounts() {
    let state = create_test_state();
    let session = register_session(&state).await;
    let refresh = session["refreshToken"].as_str().unwrap();

    let (status, json) = send(app(&state), "POST", "/refresh", None, Some(json!({ "refreshToken": refresh }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "jamie@example.com");
    assert!(json["token"].as_str().is_some());
    assert!(json["refreshToken"].as_str().is_some());

    // The access token cannot stand in for a refresh token.
    let (status, json) = send(
        app(&state),
        "POST",
        "/refresh",
        None,
        Some(json!({ "refreshToken": session["token"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid refresh token");

    // Nor can a refresh token open protected routes.
    let (status, _) = send(app(&state), "GET", "/me", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(app(&state), "POST", "/refresh", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Refresh token is required");

    let forged = JwtTestUtils::create_invalid_signature_token(&TestUser::default());
    let (status, json) = send(app(&state), "POST", "/refresh", None, Some(json!({ "refreshToken": forged }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid refresh token");
}
