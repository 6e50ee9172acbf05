use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use shared_models::notification::{
    NotificationData, NotificationError, NotificationKind, NotificationSender,
};

#[derive(Debug, Clone)]
pub struct RecordedNotification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub data: NotificationData,
}

/// In-process sender that records every attempt. Can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    attempts: Mutex<Vec<RecordedNotification>>,
    failure: Option<String>,
    notify: Notify,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Every attempt so far, including failed ones.
    pub fn sent(&self) -> Vec<RecordedNotification> {
        self.attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }

    /// Waits until at least `count` attempts were recorded. Returns false on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            if self.sent().len() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.sent().len() >= count;
            }
        }
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn notify(
        &self,
        kind: NotificationKind,
        recipient_email: &str,
        data: &NotificationData,
    ) -> Result<(), NotificationError> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(RecordedNotification {
                kind,
                recipient: recipient_email.to_string(),
                data: data.clone(),
            });
        }
        self.notify.notify_waiters();

        match &self.failure {
            Some(message) => Err(NotificationError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
