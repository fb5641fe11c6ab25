use std::time::Duration;

use adwatch_core::Entry;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub link: String,
}

impl From<&Entry> for Notification {
    fn from(entry: &Entry) -> Self {
        let headline = entry.headline();
        Self {
            title: headline.clone(),
            body: headline,
            link: entry.link.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification server answered {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Delivers one alert to a channel. Callers treat failures as non-fatal.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel: &str, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone)]
pub struct NtfySettings {
    pub server: String,
    pub timeout: Duration,
    pub action_label: String,
}

impl Default for NtfySettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_NTFY_SERVER.to_string(),
            timeout: Duration::from_secs(10),
            action_label: "Open listing".to_string(),
        }
    }
}

/// Publishes to an ntfy server using its JSON API, so titles may carry
/// non-ASCII text.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    settings: NtfySettings,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PublishBody<'a> {
    topic: &'a str,
    title: &'a str,
    message: String,
    click: &'a str,
    actions: [ViewAction<'a>; 1],
}

#[derive(Serialize)]
struct ViewAction<'a> {
    action: &'static str,
    label: &'a str,
    url: &'a str,
}

impl NtfyNotifier {
    pub fn new(settings: NtfySettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self { settings, client })
    }
}

#[async_trait::async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, channel: &str, notification: &Notification) -> Result<(), NotifyError> {
        let body = PublishBody {
            topic: channel,
            title: &notification.title,
            message: format!("{}\n{}", notification.body, notification.link),
            click: &notification.link,
            actions: [ViewAction {
                action: "view",
                label: &self.settings.action_label,
                url: &notification.link,
            }],
        };

        let response = self
            .client
            .post(self.settings.server.trim_end_matches('/'))
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
