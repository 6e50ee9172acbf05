use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::notification::{
    NotificationData, NotificationError, NotificationKind, NotificationSender,
};

use crate::provider::{EmailProvider, LogProvider, SmtpConfig, SmtpProvider};
use crate::templates::TemplateEngine;

/// Renders appointment notifications and hands them to an email provider.
pub struct EmailNotifier {
    provider: Arc<dyn EmailProvider>,
    templates: TemplateEngine,
}

impl EmailNotifier {
    pub fn new(
        provider: Arc<dyn EmailProvider>,
        frontend_url: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        Ok(Self {
            provider,
            templates: TemplateEngine::new(frontend_url)?,
        })
    }

    /// SMTP when credentials are configured, otherwise emails are only logged.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotificationError> {
        let provider: Arc<dyn EmailProvider> = if config.is_email_configured() {
            info!("Email notifications enabled via SMTP host {}", config.smtp_host);
            Arc::new(SmtpProvider::new(SmtpConfig::from_app_config(config))?)
        } else {
            warn!("SMTP not configured - email notifications will be logged only");
            Arc::new(LogProvider)
        };

        Self::new(provider, config.frontend_url.clone())
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

#[async_trait]
impl NotificationSender for EmailNotifier {
    async fn notify(
        &self,
        kind: NotificationKind,
        recipient_email: &str,
        data: &NotificationData,
    ) -> Result<(), NotificationError> {
        let email = self.templates.render(kind, recipient_email, data)?;
        let result = self.provider.send(&email).await?;

        debug!(
            provider = self.provider.name(),
            message_id = %result.message_id,
            "Sent {:?} notification to {}", kind, recipient_email
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
