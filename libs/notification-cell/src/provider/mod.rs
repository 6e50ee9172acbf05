pub mod log;
pub mod smtp;

pub use log::LogProvider;
pub use smtp::{SmtpConfig, SmtpProvider};

use async_trait::async_trait;

use shared_models::notification::NotificationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

#[derive(Debug)]
pub struct SendResult {
    pub message_id: String,
}

/// Outbound email transport.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &Email) -> Result<SendResult, NotificationError>;

    fn name(&self) -> &'static str;
}
