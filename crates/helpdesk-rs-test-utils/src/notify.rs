use async_trait::async_trait;
use helpdesk_rs_protocol::{Notification, NotifyError, Notifier};
use parking_lot::Mutex;

/// Keeps every notification it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

/// Rejects every notification.
#[derive(Debug, Clone)]
pub struct FailingNotifier {
    message: String,
}

impl FailingNotifier {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery(self.message.clone()))
    }
}
