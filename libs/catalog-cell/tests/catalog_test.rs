use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use catalog_cell::models::{AssignServiceRequest, CatalogError, CreateServiceRequest, UpdateServiceRequest};
use catalog_cell::router::public_catalog_routes;
use catalog_cell::services::catalog::CatalogService;
use notification_cell::RecordingNotifier;
use shared_database::AppState;
use shared_models::catalog::ServiceCategory;
use shared_models::pagination::PageQuery;
use shared_utils::test_utils::{TestConfig, TestUser};

fn state() -> AppState {
    AppState::in_memory(TestConfig::default().to_app_config(), Arc::new(RecordingNotifier::new()))
}

fn cleaning() -> CreateServiceRequest {
    CreateServiceRequest {
        name: "Teeth Cleaning".to_string(),
        description: "Professional cleaning".to_string(),
        category: ServiceCategory::Preventive,
        default_duration: 30,
        default_price: 80.0,
    }
}

async fn seed_dentist(state: &AppState) -> Uuid {
    state
        .users
        .insert_user(TestUser::dentist("dentist@example.com").to_account())
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn duplicate_service_name_is_rejected() {
    let state = state();
    let catalog = CatalogService::new(&state);

    catalog.create_service(cleaning()).await.unwrap();
    let mut again = cleaning();
    again.name = "teeth cleaning".to_string();

    assert_matches!(catalog.create_service(again).await, Err(CatalogError::NameTaken));
}

#[tokio::test]
async fn rename_onto_existing_name_is_rejected() {
    let state = state();
    let catalog = CatalogService::new(&state);

    catalog.create_service(cleaning()).await.unwrap();
    let mut whitening = cleaning();
    whitening.name = "Whitening".to_string();
    let whitening = catalog.create_service(whitening).await.unwrap();

    let result = catalog
        .update_service(
            whitening.id,
            UpdateServiceRequest {
                name: Some("Teeth Cleaning".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(CatalogError::NameTaken));

    let renamed = catalog
        .update_service(
            whitening.id,
            UpdateServiceRequest {
                name: Some("Whitening".to_string()),
                default_price: Some(250.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.default_price, 250.0);
}

#[tokio::test]
async fn create_validates_duration() {
    let state = state();
    let mut request = cleaning();
    request.default_duration = 5;

    assert_matches!(
        CatalogService::new(&state).create_service(request).await,
        Err(CatalogError::Validation(_))
    );
}

#[tokio::test]
async fn assignment_defaults_to_service_price_and_duration() {
    let state = state();
    let catalog = CatalogService::new(&state);
    let dentist_id = seed_dentist(&state).await;
    let service = catalog.create_service(cleaning()).await.unwrap();

    let offered = catalog
        .assign_to_dentist(AssignServiceRequest {
            dentist_id,
            service_id: service.id,
            custom_price: None,
            custom_duration: Some(45),
        })
        .await
        .unwrap();

    assert_eq!(offered.price, 80.0);
    assert_eq!(offered.duration, 45);
    assert_eq!(offered.service.name, "Teeth Cleaning");

    let again = catalog
        .assign_to_dentist(AssignServiceRequest {
            dentist_id,
            service_id: service.id,
            custom_price: None,
            custom_duration: None,
        })
        .await;
    assert_matches!(again, Err(CatalogError::AlreadyAssigned));
}

#[tokio::test]
async fn assignment_requires_a_dentist() {
    let state = state();
    let catalog = CatalogService::new(&state);
    let patient = state
        .users
        .insert_user(TestUser::patient("patient@example.com").to_account())
        .await
        .unwrap();
    let service = catalog.create_service(cleaning()).await.unwrap();

    let result = catalog
        .assign_to_dentist(AssignServiceRequest {
            dentist_id: patient.id,
            service_id: service.id,
            custom_price: None,
            custom_duration: None,
        })
        .await;
    assert_matches!(result, Err(CatalogError::DentistNotFound));
}

#[tokio::test]
async fn assigned_service_cannot_be_deleted() {
    let state = state();
    let catalog = CatalogService::new(&state);
    let dentist_id = seed_dentist(&state).await;
    let service = catalog.create_service(cleaning()).await.unwrap();
    catalog
        .assign_to_dentist(AssignServiceRequest {
            dentist_id,
            service_id: service.id,
            custom_price: Some(95.0),
            custom_duration: None,
        })
        .await
        .unwrap();

    assert_matches!(catalog.delete_service(service.id).await, Err(CatalogError::ServiceInUse));

    catalog.remove_from_dentist(dentist_id, service.id).await.unwrap();
    assert_matches!(
        catalog.remove_from_dentist(dentist_id, service.id).await,
        Err(CatalogError::AssignmentNotFound)
    );

    catalog.delete_service(service.id).await.unwrap();
    assert_matches!(catalog.get_service(service.id).await, Err(CatalogError::ServiceNotFound));
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let state = state();
    let catalog = CatalogService::new(&state);
    for i in 0..12 {
        let mut request = cleaning();
        request.name = format!("Service {}", i);
        if i % 3 == 0 {
            request.category = ServiceCategory::Surgical;
        }
        catalog.create_service(request).await.unwrap();
    }

    let page = PageQuery { page: Some(2), limit: Some(5) }.validate().unwrap();
    let (items, pagination) = catalog.list_services(None, false, page).await.unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(pagination.total, 12);
    assert_eq!(pagination.pages, 3);

    let first = PageQuery::default().validate().unwrap();
    let (surgical, pagination) = catalog
        .list_services(Some(ServiceCategory::Surgical), false, first)
        .await
        .unwrap();
    assert_eq!(pagination.total, 4);
    assert!(surgical.iter().all(|s| s.category == ServiceCategory::Surgical));
}

#[tokio::test]
async fn public_listing_hides_inactive_services() {
    let state = state();
    let catalog = CatalogService::new(&state);
    let retired = catalog.create_service(cleaning()).await.unwrap();
    let mut xray = cleaning();
    xray.name = "X-Ray".to_string();
    catalog.create_service(xray).await.unwrap();
    catalog
        .update_service(
            retired.id,
            UpdateServiceRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let app = public_catalog_routes(Arc::new(state));
    let response = app
        .oneshot(Request::builder().uri("/services").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["services"].as_array().unwrap().len(), 1);
    assert_eq!(json["services"][0]["name"], "X-Ray");
    assert_eq!(json["pagination"]["total"], 1);
}

#[tokio::test]
async fn public_listing_rejects_bad_limit() {
    let app = public_catalog_routes(Arc::new(state()));
    let response = app
        .oneshot(Request::builder().uri("/services?limit=500").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
