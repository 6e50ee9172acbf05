use std::sync::Arc;

use axum::{routing::get, Router};

use admin_cell::admin_routes;
use appointment_cell::router::availability_routes;
use auth_cell::auth_routes;
use catalog_cell::router::public_catalog_routes;
use dentist_cell::router::{dentist_routes, public_dentist_routes};
use patient_cell::patient_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "DentalCare+ API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/dentists", dentist_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .merge(public_dentist_routes(state.clone()))
        .merge(public_catalog_routes(state.clone()))
        .merge(availability_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use notification_cell::RecordingNotifier;
    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn app() -> Router {
        let state = AppState::in_memory(
            TestConfig::default().to_app_config(),
            Arc::new(RecordingNotifier::new()),
        );
        create_router(Arc::new(state))
    }

    async fn status_of(uri: &str, token: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let response = app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response.status()
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        assert_eq!(status_of("/", None).await, StatusCode::OK);
        assert_eq!(status_of("/dentists", None).await, StatusCode::OK);
        assert_eq!(status_of("/services", None).await, StatusCode::OK);
        // Reaches the handler, which wants its query parameters.
        assert_eq!(status_of("/available-slots", None).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn role_areas_are_guarded() {
        assert_eq!(status_of("/patients/profile", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/dentists/profile", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/admin/users", None).await, StatusCode::UNAUTHORIZED);

        let patient = TestUser::patient("p@example.com");
        let token = JwtTestUtils::create_test_token(&patient, &TestConfig::default().jwt_secret, None);
        assert_eq!(status_of("/admin/users", Some(&token)).await, StatusCode::FORBIDDEN);
        assert_eq!(status_of("/dentists/profile", Some(&token)).await, StatusCode::FORBIDDEN);
    }
}
