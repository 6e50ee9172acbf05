use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub jwt_refresh_secret: String,
    pub jwt_refresh_expires_in_hours: i64,
    pub port: u16,
    pub frontend_url: String,
    pub email_from: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub notification_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            jwt_secret: String::new(),
            jwt_expires_in_hours: 24 * 7,
            jwt_refresh_secret: String::new(),
            jwt_refresh_expires_in_hours: 24 * 30,
            port: 5000,
            frontend_url: "http://localhost:3000".to_string(),
            email_from: "noreply@dentalcare.com".to_string(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            notification_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using in-memory storage");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_expires_in_hours: parse_or("JWT_EXPIRES_IN_HOURS", defaults.jwt_expires_in_hours),
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_REFRESH_SECRET not set, refresh tokens will share JWT_SECRET");
                    String::new()
                }),
            jwt_refresh_expires_in_hours: parse_or(
                "JWT_REFRESH_EXPIRES_IN_HOURS",
                defaults.jwt_refresh_expires_in_hours,
            ),
            port: parse_or("PORT", defaults.port),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| {
                    warn!("FRONTEND_URL not set, using default");
                    defaults.frontend_url.clone()
                }),
            email_from: env::var("EMAIL_FROM").unwrap_or(defaults.email_from),
            smtp_host: env::var("SMTP_HOST")
                .unwrap_or_else(|_| {
                    warn!("SMTP_HOST not set, emails will only be logged");
                    String::new()
                }),
            smtp_port: parse_or("SMTP_PORT", defaults.smtp_port),
            smtp_user: env::var("SMTP_USER").unwrap_or_default(),
            smtp_pass: env::var("SMTP_PASS").unwrap_or_default(),
            notification_timeout_secs: parse_or(
                "NOTIFICATION_TIMEOUT_SECS",
                defaults.notification_timeout_secs,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    /// Key for refresh tokens, falling back to the access-token secret.
    pub fn refresh_secret(&self) -> &str {
        if self.jwt_refresh_secret.is_empty() {
            &self.jwt_secret
        } else {
            &self.jwt_refresh_secret
        }
    }

    pub fn is_database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.email_from.is_empty()
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_seven_day_tokens() {
        let config = AppConfig::default();
        assert_eq!(config.jwt_expires_in_hours, 168);
        assert_eq!(config.jwt_refresh_expires_in_hours, 720);
        assert!(!config.is_database_configured());
        assert!(!config.is_email_configured());
    }

    #[test]
    fn email_requires_host() {
        let config = AppConfig {
            smtp_host: "smtp.example.com".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_email_configured());
    }

    #[test]
    fn refresh_secret_falls_back_to_access_secret() {
        let mut config = AppConfig {
            jwt_secret: "access".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.refresh_secret(), "access");

        config.jwt_refresh_secret = "refresh".to_string();
        assert_eq!(config.refresh_secret(), "refresh");
    }
}
