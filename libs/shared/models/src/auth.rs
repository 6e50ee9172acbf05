use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::Role;

/// What a signed token may be used for. Tokens without the claim are access tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    #[default]
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub iat: Option<u64>,
    #[serde(default, rename = "use")]
    pub token_use: TokenUse,
}

/// Authenticated principal attached to a request by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role_kind(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role_kind() == Some(role)
    }
}
