//! Operator notification channels.

use async_trait::async_trait;
use helpdesk_rs_config::{EscalationConfig, NotifierKind};
use helpdesk_rs_protocol::{Notification, NotifyError, Notifier};
use log::{debug, info};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default outbox file name under the data directory.
const OUTBOX_FILE: &str = "outbox.jsonl";

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            "operator notification (to={}, subject={})\n{}",
            notification.recipient, notification.subject, notification.body
        );
        Ok(())
    }
}

/// Appends notifications as JSON lines for an external mailer to pick up.
pub struct OutboxNotifier {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OutboxNotifier {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, NotifyError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let line = serde_json::to_string(notification)?;
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        debug!(
            "queued notification (path={}, id={})",
            self.path.display(),
            notification.id
        );
        Ok(())
    }
}

/// POSTs notifications as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(notification)
            .send()
            .await
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook returned {status} (url={})",
                self.url
            )));
        }
        debug!("delivered notification (url={}, id={})", self.url, notification.id);
        Ok(())
    }
}

/// Build the notifier selected by the escalation config.
pub fn notifier_from_config(
    config: &EscalationConfig,
    data_root: &Path,
) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.notifier {
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
        NotifierKind::Outbox => {
            let path = config
                .outbox_path
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| data_root.join(OUTBOX_FILE));
            Ok(Arc::new(OutboxNotifier::new(path)?))
        }
        NotifierKind::Webhook => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                NotifyError::Delivery("webhook notifier requires escalation.webhook_url".into())
            })?;
            Ok(Arc::new(WebhookNotifier::new(
                url,
                Duration::from_secs(config.webhook_timeout_secs),
            )))
        }
    }
}
