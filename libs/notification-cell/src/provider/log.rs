use async_trait::async_trait;
use tracing::info;

use shared_models::notification::NotificationError;

use super::{Email, EmailProvider, SendResult};

/// Writes emails to the log instead of sending them. Used when SMTP is not configured.
#[derive(Debug, Default)]
pub struct LogProvider;

#[async_trait]
impl EmailProvider for LogProvider {
    async fn send(&self, email: &Email) -> Result<SendResult, NotificationError> {
        info!(to = %email.to, subject = %email.subject, "Email delivery skipped (no SMTP configured)");
        Ok(SendResult {
            message_id: format!("log-{}", chrono::Utc::now().timestamp_millis()),
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
