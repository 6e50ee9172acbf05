use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use admin_cell::admin_routes;
use notification_cell::RecordingNotifier;
use shared_database::AppState;
use shared_models::dentist::DentistProfile;
use shared_models::patient::PatientProfile;
use shared_models::user::Role;
use shared_utils::password::verify_password;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestFixtures, TestUser};

struct Fixture {
    state: Arc<AppState>,
    admin: TestUser,
    token: String,
}

async fn fixture() -> Fixture {
    let config = TestConfig::default();
    let state = Arc::new(AppState::in_memory(
        config.to_app_config(),
        Arc::new(RecordingNotifier::new()),
    ));

    let admin = TestUser::admin("admin@dentalcare.test");
    state.users.insert_user(admin.to_account()).await.unwrap();

    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, None);
    Fixture { state, admin, token }
}

impl Fixture {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(admin_routes(self.state.clone()), method, uri, Some(&self.token), body).await
    }

    async fn seed_patient(&self, email: &str) -> TestUser {
        let patient = TestUser::patient(email);
        self.state.users.insert_user(patient.to_account()).await.unwrap();
        patient
    }
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

fn new_dentist(email: &str, license: &str) -> Value {
    json!({
        "name": "Dr. Incisor",
        "email": email,
        "password": "Enamel42",
        "licenseNumber": license,
        "specialization": ["General Dentistry", "Oral Surgery"],
        "experience": 6,
        "consultationFee": 75.0
    })
}

#[tokio::test]
async fn non_admins_are_turned_away() {
    let f = fixture().await;
    let app = admin_routes(f.state.clone());

    let (status, _) = send(app.clone(), "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let dentist = TestUser::dentist("dr@example.com");
    let token = JwtTestUtils::create_test_token(&dentist, &TestConfig::default().jwt_secret, None);
    let (status, _) = send(app.clone(), "GET", "/users/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Catalog management sits behind the same guard.
    let (status, _) = send(app, "GET", "/services", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stats_count_roles_and_activity() {
    let f = fixture().await;
    let patient = f.seed_patient("one@example.com").await;
    f.seed_patient("two@example.com").await;
    f.state.users.insert_user(TestUser::dentist("dr@example.com").to_account()).await.unwrap();

    let (status, _) = f
        .send("PUT", &format!("/users/{}/status", patient.id), Some(json!({ "isActive": false })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = f.send("GET", "/users/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["totalUsers"], 4);
    assert_eq!(json["stats"]["totalPatients"], 2);
    assert_eq!(json["stats"]["totalDentists"], 1);
    assert_eq!(json["stats"]["totalAdmins"], 1);
    assert_eq!(json["stats"]["inactiveUsers"], 1);
}

#[tokio::test]
async fn user_listing_paginates_and_filters() {
    let f = fixture().await;
    for i in 0..12 {
        f.seed_patient(&format!("patient{}@example.com", i)).await;
    }

    let (status, json) = f.send("GET", "/users?role=patient&page=3&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["users"].as_array().unwrap().len(), 2);
    assert_eq!(json["pagination"], json!({ "page": 3, "limit": 5, "total": 12, "pages": 3 }));
    assert!(json["users"][0].get("passwordHash").is_none());

    let (_, json) = f.send("GET", "/users?role=all", None).await;
    assert_eq!(json["pagination"]["total"], 13);
    assert_eq!(json["users"].as_array().unwrap().len(), 10);

    for uri in ["/users?page=0", "/users?limit=0", "/users?limit=101", "/users?role=nurse"] {
        let (status, _) = f.send("GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn admins_cannot_modify_their_own_account() {
    let f = fixture().await;
    let own = format!("/users/{}", f.admin.id);

    let (status, json) = f.send("PUT", &format!("{}/role", own), Some(json!({ "role": "patient" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Cannot change your own role");

    let (status, json) = f.send("PUT", &format!("{}/status", own), Some(json!({ "isActive": false }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Cannot change your own status");

    let (status, json) = f.send("DELETE", &own, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Cannot delete your own account");

    let account = f.state.users.find_user_by_id(f.admin.uuid()).await.unwrap().unwrap();
    assert_eq!(account.role, Role::Admin);
    assert!(account.is_active);
}

#[tokio::test]
async fn role_changes_and_deletion() {
    let f = fixture().await;
    let patient = f.seed_patient("promote@example.com").await;
    let mut profile = PatientProfile::empty(patient.uuid());
    profile.phone = Some("+15550004444".to_string());
    f.state.profiles.save_patient_profile(profile).await.unwrap();

    let (_, json) = f.send("GET", &format!("/users/{}", patient.id), None).await;
    assert_eq!(json["user"]["profile"]["phone"], "+15550004444");

    let (status, _) = f
        .send("PUT", &format!("/users/{}/role", patient.id), Some(json!({ "role": "surgeon" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = f
        .send("PUT", &format!("/users/{}/role", patient.id), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["role"], "admin");

    let (status, _) = f.send("DELETE", &format!("/users/{}", patient.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = f.send("GET", &format!("/users/{}", patient.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "User not found");
}

#[tokio::test]
async fn deleting_a_patient_removes_their_profile() {
    let f = fixture().await;
    let patient = f.seed_patient("gone@example.com").await;
    f.state
        .profiles
        .save_patient_profile(PatientProfile::empty(patient.uuid()))
        .await
        .unwrap();

    let (status, _) = f.send("DELETE", &format!("/users/{}", patient.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(f.state.profiles.get_patient_profile(patient.uuid()).await.unwrap().is_none());
}

#[tokio::test]
async fn dentist_lifecycle() {
    let f = fixture().await;

    let (status, json) = f.send("POST", "/dentists", Some(new_dentist("New@Clinic.com", "DDS-5005"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["email"], "new@clinic.com");
    assert_eq!(json["user"]["role"], "dentist");
    assert_eq!(json["user"]["profile"]["licenseNumber"], "DDS-5005");
    assert_eq!(json["user"]["profile"]["specialization"][1], "Oral Surgery");
    let id = json["user"]["id"].as_str().unwrap().to_string();

    let account = f.state.users.find_user_by_email("new@clinic.com").await.unwrap().unwrap();
    assert!(verify_password("Enamel42", &account.password_hash).unwrap());

    let (status, json) = f.send("POST", "/dentists", Some(new_dentist("new@clinic.com", "DDS-6006"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "User already exists with this email");

    let (status, json) = f.send("POST", "/dentists", Some(new_dentist("other@clinic.com", "DDS-5005"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "License number already exists");

    let mut weak = new_dentist("weak@clinic.com", "DDS-7007");
    weak["password"] = json!("enamel42");
    let (status, _) = f.send("POST", "/dentists", Some(weak)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = f
        .send(
            "PUT",
            &format!("/dentists/{}", id),
            Some(json!({ "name": "Dr. Premolar", "consultationFee": 90.0, "isActive": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["name"], "Dr. Premolar");
    assert_eq!(json["user"]["profile"]["consultationFee"], 90.0);
    assert_eq!(json["user"]["profile"]["isActive"], false);

    let (_, json) = f.send("GET", "/dentists", None).await;
    assert_eq!(json["dentists"].as_array().unwrap().len(), 1);
    assert_eq!(json["pagination"]["total"], 1);

    let (status, _) = f.send("DELETE", &format!("/dentists/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = f.send("DELETE", &format!("/dentists/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Dentist not found");
    assert!(f.state.profiles.find_dentist_by_license("DDS-5005").await.unwrap().is_none());
}

#[tokio::test]
async fn dentist_update_rejects_taken_license() {
    let f = fixture().await;
    let first = TestUser::dentist("first@clinic.com");
    let second = TestUser::dentist("second@clinic.com");
    for (dentist, license) in [(&first, "DDS-1111"), (&second, "DDS-2222")] {
        f.state.users.insert_user(dentist.to_account()).await.unwrap();
        f.state
            .profiles
            .save_dentist_profile(DentistProfile::new(dentist.uuid(), license.to_string()))
            .await
            .unwrap();
    }

    let (status, _) = f
        .send("PUT", &format!("/dentists/{}", first.id), Some(json!({ "licenseNumber": "DDS-2222" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let patient = f.seed_patient("p@example.com").await;
    let (status, _) = f
        .send("PUT", &format!("/dentists/{}", patient.id), Some(json!({ "bio": "nope" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patients_listing_includes_profiles() {
    let f = fixture().await;
    let patient = f.seed_patient("listed@example.com").await;
    let mut profile = PatientProfile::empty(patient.uuid());
    profile.address = Some("12 Floss Lane".to_string());
    f.state.profiles.save_patient_profile(profile).await.unwrap();
    f.seed_patient("bare@example.com").await;

    let (status, json) = f.send("GET", "/patients?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    let patients = json["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 2);
    let listed = patients.iter().find(|p| p["email"] == "listed@example.com").unwrap();
    assert_eq!(listed["profile"]["address"], "12 Floss Lane");
    let bare = patients.iter().find(|p| p["email"] == "bare@example.com").unwrap();
    assert!(bare["profile"].is_null());
}

#[tokio::test]
async fn catalog_management_is_mounted() {
    let f = fixture().await;
    let dentist = TestUser::dentist("dr@example.com");
    f.state.users.insert_user(dentist.to_account()).await.unwrap();
    f.state
        .profiles
        .save_dentist_profile(DentistProfile::new(dentist.uuid(), "DDS-8008".to_string()))
        .await
        .unwrap();
    let service = f
        .state
        .catalog
        .insert_service(TestFixtures::service("Whitening", 60))
        .await
        .unwrap();

    let (status, json) = f
        .send(
            "POST",
            "/services/assign",
            Some(json!({ "dentistId": dentist.id, "serviceId": service.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["duration"], 60);

    let (status, json) = f.send("GET", &format!("/dentists/{}/services", dentist.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["services"].as_array().unwrap().len(), 1);
}
