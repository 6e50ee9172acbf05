use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use shared_models::auth::{JwtClaims, TokenUse, User};
use shared_models::user::UserAccount;

/// Signs an HS256 access token for `user`, valid for `expires_in_hours`.
pub fn issue_token(user: &UserAccount, jwt_secret: &str, expires_in_hours: i64) -> Result<String, String> {
    sign(user, jwt_secret, expires_in_hours, TokenUse::Access)
}

/// Signs a refresh token. It is only accepted by [`validate_refresh_token`].
pub fn issue_refresh_token(user: &UserAccount, jwt_secret: &str, expires_in_hours: i64) -> Result<String, String> {
    sign(user, jwt_secret, expires_in_hours, TokenUse::Refresh)
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    verify(token, jwt_secret, TokenUse::Access)
}

pub fn validate_refresh_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    verify(token, jwt_secret, TokenUse::Refresh)
}

fn sign(user: &UserAccount, jwt_secret: &str, expires_in_hours: i64, token_use: TokenUse) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let claims = JwtClaims {
        sub: user.id.to_string(),
        exp: Some((now + Duration::hours(expires_in_hours)).timestamp() as u64),
        email: Some(user.email.clone()),
        role: Some(user.role.to_string()),
        name: Some(user.name.clone()),
        iat: Some(now.timestamp() as u64),
        token_use,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(jwt_secret.as_bytes()))
        .map_err(|e| format!("Failed to sign token: {}", e))
}

fn verify(token: &str, jwt_secret: &str, expected: TokenUse) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation.leeway = 0;

    let claims = decode::<JwtClaims>(token, &DecodingKey::from_secret(jwt_secret.as_bytes()), &validation)
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => "Token expired".to_string(),
                ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
                _ => "Invalid token".to_string(),
            }
        })?
        .claims;

    if claims.token_use != expected {
        debug!("Expected a {:?} token for {}, got {:?}", expected, claims.sub, claims.token_use);
        return Err("Invalid token type".to_string());
    }

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        name: claims.name,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::user::Role;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

    fn account(role: Role) -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_tokens_validate() {
        let user = account(Role::Dentist);
        let token = issue_token(&user, SECRET, 168).unwrap();

        let principal = validate_token(&token, SECRET).unwrap();
        assert_eq!(principal.id, user.id.to_string());
        assert_eq!(principal.role.as_deref(), Some("dentist"));
        assert_eq!(principal.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token(&account(Role::Patient), SECRET, -1).unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&account(Role::Patient), SECRET, 1).unwrap();
        assert_eq!(validate_token(&token, "another-secret").unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn tokens_without_expiry_are_rejected() {
        let claims = serde_json::json!({ "sub": Uuid::new_v4().to_string(), "role": "admin" });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Invalid token");
    }

    #[test]
    fn only_hs256_is_accepted() {
        let user = account(Role::Admin);
        let claims = JwtClaims {
            sub: user.id.to_string(),
            exp: Some((Utc::now() + Duration::hours(1)).timestamp() as u64),
            email: None,
            role: Some("admin".to_string()),
            name: None,
            iat: None,
            token_use: TokenUse::Access,
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Invalid token");

        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", token.split('.').nth(1).unwrap());
        assert!(validate_token(&unsigned, SECRET).is_err());
    }

    #[test]
    fn access_and_refresh_tokens_are_not_interchangeable() {
        let user = account(Role::Patient);
        let access = issue_token(&user, SECRET, 1).unwrap();
        let refresh = issue_refresh_token(&user, SECRET, 1).unwrap();

        assert_eq!(validate_refresh_token(&access, SECRET).unwrap_err(), "Invalid token type");
        assert_eq!(validate_token(&refresh, SECRET).unwrap_err(), "Invalid token type");
        assert_eq!(validate_refresh_token(&refresh, SECRET).unwrap().id, user.id.to_string());
    }

    #[test]
    fn empty_secret_cannot_issue() {
        assert!(issue_token(&account(Role::Admin), "", 1).is_err());
    }
}
