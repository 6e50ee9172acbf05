use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestStore;
use shared_database::store::{AppointmentStore, CatalogStore, UserStore, SLOT_TAKEN_MESSAGE};
use shared_database::StoreError;
use shared_models::appointment::{AppointmentStatus, NewAppointment};
use shared_models::pagination::PageQuery;
use shared_models::user::{Role, UserFilter};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    }
}

fn appointment_row(dentist_id: Uuid, time: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "patientId": Uuid::new_v4(),
        "dentistId": dentist_id,
        "serviceId": Uuid::new_v4(),
        "date": "2030-01-07",
        "time": time,
        "duration": 30,
        "status": "pending",
        "notes": "",
        "createdAt": "2030-01-01T00:00:00Z",
        "updatedAt": "2030-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn find_conflicting_filters_on_slot_holding_statuses() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", "test-anon-key"))
        .and(query_param("dentistId", format!("eq.{}", dentist_id)))
        .and(query_param("date", "eq.2030-01-07"))
        .and(query_param("time", "eq.10:00"))
        .and(query_param("status", "in.(pending,scheduled,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(dentist_id, "10:00:00")])))
        .expect(1)
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&config_for(&server));
    let found = store
        .find_conflicting(
            dentist_id,
            NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
}

#[tokio::test]
async fn unique_violation_on_insert_is_a_slot_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_slot_key\""
        })))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&config_for(&server));
    let result = store
        .create_appointment(NewAppointment {
            patient_id: Uuid::new_v4(),
            dentist_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration: 30,
            status: AppointmentStatus::Pending,
            notes: String::new(),
        })
        .await;

    assert_matches!(result, Err(StoreError::Conflict(msg)) if msg == SLOT_TAKEN_MESSAGE);
}

#[tokio::test]
async fn list_users_reads_total_from_content_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.dentist"))
        .and(query_param("offset", "10"))
        .and(query_param("limit", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "10-10/11")
                .set_body_json(json!([{
                    "id": Uuid::new_v4(),
                    "name": "Dr. Smile",
                    "email": "smile@example.com",
                    "passwordHash": "hash",
                    "role": "dentist",
                    "isActive": true,
                    "createdAt": "2030-01-01T00:00:00Z",
                    "updatedAt": "2030-01-01T00:00:00Z"
                }])),
        )
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&config_for(&server));
    let page = PageQuery { page: Some(2), limit: Some(10) }.validate().unwrap();
    let (users, total) = store
        .list_users(&UserFilter { role: Some(Role::Dentist), is_active: None }, page)
        .await
        .unwrap();

    assert_eq!(total, 11);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].password_hash, "hash");
}

#[tokio::test]
async fn deleting_a_missing_service_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&config_for(&server));
    let result = store.delete_service(Uuid::new_v4()).await;

    assert_matches!(result, Err(StoreError::NotFound(_)));
}

#[tokio::test]
async fn backend_failures_surface_as_backend_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(&config_for(&server));
    let result = store.find_user_by_email("someone@example.com").await;

    assert_matches!(result, Err(StoreError::Backend(_)));
}
