use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{extract::State, http::StatusCode, Json};

use auth_cell::handlers::{login, logout, register};
use auth_cell::models::{LoginRequest, RegisterRequest};
use notification_cell::RecordingNotifier;
use shared_database::AppState;
use shared_models::error::AppError;
use shared_models::user::Role;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{TestConfig, TestUser};

fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::in_memory(
        TestConfig::default().to_app_config(),
        Arc::new(RecordingNotifier::new()),
    ))
}

fn registration(email: &str, phone: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Jamie Rivera".to_string(),
        email: email.to_string(),
        password: "floss-daily".to_string(),
        phone: phone.to_string(),
        birthdate: None,
        gender: None,
        address: Some("4 Canine Court".to_string()),
    }
}

fn credentials(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_creates_patient_with_profile() {
    let state = create_test_state();

    let (status, Json(body)) = register(State(state.clone()), Json(registration("Jamie@Example.com", "+15550001000")))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "jamie@example.com");
    assert_eq!(body["user"]["role"], "patient");

    let token = body["token"].as_str().unwrap();
    let principal = validate_token(token, &TestConfig::default().jwt_secret).unwrap();
    assert_eq!(principal.role.as_deref(), Some("patient"));

    let account = state.users.find_user_by_email("jamie@example.com").await.unwrap().unwrap();
    assert_eq!(account.role, Role::Patient);
    let profile = state.profiles.get_patient_profile(account.id).await.unwrap().unwrap();
    assert_eq!(profile.phone.as_deref(), Some("+15550001000"));
    assert_eq!(profile.address.as_deref(), Some("4 Canine Court"));
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let state = create_test_state();
    register(State(state.clone()), Json(registration("jamie@example.com", "+15550001000")))
        .await
        .unwrap();

    let result = register(State(state.clone()), Json(registration("JAMIE@example.com", "+15550002000"))).await;
    assert_matches!(result, Err(AppError::Conflict(msg)) if msg == "User already exists with this email");

    let result = register(State(state.clone()), Json(registration("alex@example.com", "+15550001000"))).await;
    assert_matches!(result, Err(AppError::Conflict(msg)) if msg == "User already exists with this phone number");
}

#[tokio::test]
async fn test_register_validates_fields() {
    let state = create_test_state();

    let mut request = registration("not-an-email", "+15550001000");
    let result = register(State(state.clone()), Json(request.clone())).await;
    assert_matches!(result, Err(AppError::ValidationError(msg)) if msg == "Please provide a valid email");

    request.email = "ok@example.com".to_string();
    request.password = "short".to_string();
    let result = register(State(state), Json(request)).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_login_checks_password_and_status() {
    let state = create_test_state();
    let user = TestUser::dentist("dr@example.com");
    state
        .users
        .insert_user(user.to_account_with_password("Enamel42"))
        .await
        .unwrap();

    let Json(body) = login(State(state.clone()), Json(credentials("DR@example.com", "Enamel42")))
        .await
        .unwrap();
    assert_eq!(body["user"]["role"], "dentist");
    assert!(body["token"].as_str().is_some());

    let result = login(State(state.clone()), Json(credentials("dr@example.com", "wrong"))).await;
    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Invalid credentials");

    let result = login(State(state.clone()), Json(credentials("nobody@example.com", "Enamel42"))).await;
    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Invalid credentials");

    let changes = shared_models::user::UserChanges {
        is_active: Some(false),
        ..Default::default()
    };
    state.users.update_user(user.uuid(), &changes).await.unwrap();
    let result = login(State(state), Json(credentials("dr@example.com", "Enamel42"))).await;
    assert_matches!(result, Err(AppError::Auth(msg)) if msg.starts_with("Account is deactivated"));
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let Json(body) = logout().await;
    assert_eq!(body["success"], true);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_registrations_share_no_phone() {
    for round in 0..20 {
        let state = create_test_state();
        let phone = "+15550009999";
        let first_email = format!("first{}@example.com", round);
        let second_email = format!("second{}@example.com", round);

        let first = tokio::spawn(register(State(state.clone()), Json(registration(&first_email, phone))));
        let second = tokio::spawn(register(State(state.clone()), Json(registration(&second_email, phone))));
        let outcomes = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1, "round {}", round);
        for outcome in &outcomes {
            if let Err(err) = outcome {
                assert_matches!(err, AppError::Conflict(msg) if msg == "User already exists with this phone number");
            }
        }

        // The losing registration leaves no account behind.
        let mut accounts = 0;
        for email in [&first_email, &second_email] {
            if state.users.find_user_by_email(email).await.unwrap().is_some() {
                accounts += 1;
            }
        }
        assert_eq!(accounts, 1, "round {}", round);
    }
}
