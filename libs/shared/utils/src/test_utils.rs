use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{JwtClaims, TokenUse, User};
use shared_models::catalog::{DentistServiceOffering, Service, ServiceCategory};
use shared_models::user::{Role, UserAccount};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: String::new(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            notification_timeout_secs: 2,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "patient")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: "Test User".to_string(),
            role: role.to_string(),
        }
    }

    pub fn dentist(email: &str) -> Self {
        Self::new(email, "dentist")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap_or_default()
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            name: Some(self.name.clone()),
            created_at: Some(Utc::now()),
        }
    }

    /// Identity record with an unusable password hash, for seeding stores.
    pub fn to_account(&self) -> UserAccount {
        UserAccount {
            id: self.uuid(),
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: String::new(),
            role: self.role.parse().unwrap_or(Role::Patient),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Account whose password hash verifies against `password`.
    pub fn to_account_with_password(&self, password: &str) -> UserAccount {
        UserAccount {
            password_hash: crate::password::hash_password(password).unwrap_or_default(),
            ..self.to_account()
        }
    }
}

/// Token builders for exercising the auth middleware.
pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id.clone(),
            exp: Some((now + Duration::hours(exp_hours.unwrap_or(24))).timestamp() as u64),
            email: Some(user.email.clone()),
            role: Some(user.role.clone()),
            name: Some(user.name.clone()),
            iat: Some(now.timestamp() as u64),
            token_use: TokenUse::Access,
        };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .unwrap_or_default()
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Catalog records for seeding stores in tests.
pub struct TestFixtures;

impl TestFixtures {
    pub fn service(name: &str, default_duration: u32) -> Service {
        Service {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: format!("{} service", name),
            category: ServiceCategory::Preventive,
            default_duration,
            default_price: 100.0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn offering(dentist_id: Uuid, service_id: Uuid, custom_duration: Option<u32>) -> DentistServiceOffering {
        DentistServiceOffering {
            id: Uuid::new_v4(),
            dentist_id,
            service_id,
            custom_price: None,
            custom_duration,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
