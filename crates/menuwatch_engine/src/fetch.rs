use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use menuwatch_logging::watch_trace;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};

use crate::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, FetchProgress, Stage};

/// Browser-like identification; the hosting site serves reduced markup to unknown agents.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
);

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Accepted media types; a trailing `/*` accepts a whole family.
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

impl FetchSettings {
    /// Listing and post pages.
    pub fn pages() -> Self {
        Self::default()
    }

    /// Menu images: larger bodies, longer timeout.
    pub fn images() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            max_bytes: 20 * 1024 * 1024,
            allowed_content_types: vec![
                "image/*".to_string(),
                "application/octet-stream".to_string(),
            ],
            ..Self::default()
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards engine events to the log at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::StageEntered(stage) => watch_trace!("stage: {}", stage),
            EngineEvent::Progress(FetchProgress { stage, bytes }) => {
                watch_trace!("{}: {} bytes", stage, bytes)
            }
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        stage: Stage,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError>;
}

/// Fetcher over `reqwest`. Each call builds its own client so the redirect
/// counter it reports belongs to that call alone.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn client(&self, hops: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let limit = self.settings.redirect_limit;
        let redirects = reqwest::redirect::Policy::custom(move |attempt| {
            let followed = attempt.previous().len();
            hops.store(followed, Ordering::Relaxed);
            if followed < limit {
                attempt.follow()
            } else {
                attempt.error("too many redirects")
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(redirects)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    /// Status, declared length and media type, checked before the body is read.
    fn admit(&self, response: &reqwest::Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let limit = self.settings.max_bytes;
        if let Some(declared) = response.content_length().filter(|len| *len > limit) {
            return Err(too_large(limit, declared));
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let Some(declared) = media_type.as_deref() {
            if !media_type_allowed(&self.settings.allowed_content_types, declared) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: declared.to_owned(),
                    },
                    "unsupported content type",
                ));
            }
        }
        Ok(media_type)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        stage: Stage,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let hops = Arc::new(AtomicUsize::new(0));

        let response = self
            .client(hops.clone())?
            .get(target)
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .send()
            .await
            .map_err(classify)?;
        let content_type = self.admit(&response)?;
        let final_url = response.url().to_string();
        let bytes = read_capped(response, self.settings.max_bytes, stage, sink).await?;

        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                redirect_count: hops.load(Ordering::Relaxed),
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

async fn read_capped(
    response: reqwest::Response,
    limit: u64,
    stage: Stage,
    sink: &dyn ProgressSink,
) -> Result<Vec<u8>, FetchError> {
    sink.emit(EngineEvent::Progress(FetchProgress { stage, bytes: 0 }));

    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(classify)?;
        let total = (body.len() + chunk.len()) as u64;
        if total > limit {
            return Err(too_large(limit, total));
        }
        body.extend_from_slice(&chunk);
        sink.emit(EngineEvent::Progress(FetchProgress {
            stage,
            bytes: total,
        }));
    }
    Ok(body)
}

/// `image/*` style entries accept any subtype; parameters are ignored.
fn media_type_allowed(allowed: &[String], content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    allowed.iter().any(|entry| match entry.strip_suffix("/*") {
        Some(family) => essence
            .split_once('/')
            .is_some_and(|(top, _)| top.eq_ignore_ascii_case(family)),
        None => entry.eq_ignore_ascii_case(essence),
    })
}

fn too_large(limit: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes: limit,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn classify(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_family_wildcard_matches_any_subtype() {
        let allowed = FetchSettings::images().allowed_content_types;
        assert!(media_type_allowed(&allowed, "image/jpeg"));
        assert!(media_type_allowed(&allowed, "IMAGE/webp; q=1"));
        assert!(!media_type_allowed(&allowed, "text/html"));
    }

    #[test]
    fn page_settings_accept_html_only() {
        let allowed = FetchSettings::pages().allowed_content_types;
        assert!(media_type_allowed(&allowed, "text/html; charset=utf-8"));
        assert!(!media_type_allowed(&allowed, "image/png"));
    }
}
