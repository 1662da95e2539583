use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const BOT_TOKEN_VAR: &str = "BOT_TOKEN";
pub const CHAT_ID_VAR: &str = "CHAT_ID";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("could not read photo {path}: {source}")]
    Photo {
        path: String,
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Request(String),
    #[error("api answered with status {status}: {description}")]
    Status { status: u16, description: String },
    #[error("api rejected the message: {0}")]
    Rejected(String),
}

/// Delivers a photo with a caption to the notification channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_photo(&self, photo: &Path, caption: &str) -> Result<(), NotifyError>;
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramCredentials {
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Both values must be present and non-blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(CredentialsError::Missing(name))
        };
        Ok(Self {
            bot_token: read(BOT_TOKEN_VAR)?,
            chat_id: read(CHAT_ID_VAR)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends photos through the Bot API `sendPhoto` method.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    api_base: String,
    credentials: TelegramCredentials,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        api_base: impl Into<String>,
        credentials: TelegramCredentials,
        timeout: Duration,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            credentials,
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendPhoto",
            self.api_base.trim_end_matches('/'),
            self.credentials.bot_token
        )
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send_photo(&self, photo: &Path, caption: &str) -> Result<(), NotifyError> {
        let bytes = tokio::fs::read(photo).await.map_err(|source| NotifyError::Photo {
            path: photo.display().to_string(),
            source,
        })?;
        let file_name = photo
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "menu.jpg".to_string());

        let form = Form::new()
            .text("chat_id", self.credentials.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(bytes).file_name(file_name));

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        // The token is part of the URL; keep it out of error messages.
        let response = client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| NotifyError::Request(e.without_url().to_string()))?;
        let parsed: Option<ApiResponse> = serde_json::from_slice(&body).ok();

        if !status.is_success() {
            let description = parsed
                .and_then(|p| p.description)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).trim().to_string());
            return Err(NotifyError::Status {
                status: status.as_u16(),
                description,
            });
        }

        match parsed {
            Some(ApiResponse { ok: true, .. }) => Ok(()),
            Some(ApiResponse { description, .. }) => Err(NotifyError::Rejected(
                description.unwrap_or_else(|| "no description".to_string()),
            )),
            None => Err(NotifyError::Rejected("unreadable api response".to_string())),
        }
    }
}
