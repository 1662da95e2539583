use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::LevelFilter;
use menuwatch_core::{KeywordScorer, DEFAULT_THRESHOLD};
use menuwatch_engine::{
    FetchSettings, OcrOptions, PipelineSettings, DEFAULT_TELEGRAM_API, DEFAULT_USER_AGENT,
};
use menuwatch_logging::{parse_level, watch_info, LogDestination};
use serde::Deserialize;

pub(crate) const CONFIG_FILENAME: &str = "./menuwatch.ron";

const LISTING_URL_VAR: &str = "MENUWATCH_LISTING_URL";
const POST_URL_VAR: &str = "MENUWATCH_POST_URL";
const REFERENCE_PATH_VAR: &str = "MENUWATCH_REFERENCE_PATH";
const THRESHOLD_VAR: &str = "MENUWATCH_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub listing_url: String,
    /// Pinned post; when set the listing page is never fetched.
    pub post_url: Option<String>,
    pub reference_path: PathBuf,
    pub qualification_enabled: bool,
    pub qualification_threshold: usize,
    /// Tesseract language code, e.g. `eng`.
    pub ocr_language: Option<String>,
    pub ocr_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub telegram_api_base: String,
    pub user_agent: String,
    pub log_destination: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.ericssondining.ie/blog".to_string(),
            post_url: None,
            reference_path: PathBuf::from("weekly_menu.jpg"),
            qualification_enabled: true,
            qualification_threshold: DEFAULT_THRESHOLD,
            ocr_language: None,
            ocr_timeout_secs: 120,
            page_timeout_secs: 30,
            image_timeout_secs: 60,
            notify_timeout_secs: 60,
            telegram_api_base: DEFAULT_TELEGRAM_API.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_destination: "both".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        ron::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Apply `MENUWATCH_*` overrides; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = get(LISTING_URL_VAR) {
            self.listing_url = url;
        }
        if let Some(url) = get(POST_URL_VAR) {
            self.post_url = Some(url);
        }
        if let Some(path) = get(REFERENCE_PATH_VAR) {
            self.reference_path = PathBuf::from(path);
        }
        if let Some(threshold) = get(THRESHOLD_VAR) {
            self.qualification_threshold = threshold
                .parse()
                .with_context(|| format!("{THRESHOLD_VAR} must be a non-negative integer"))?;
        }
        Ok(())
    }

    /// `None` for an unknown name; the caller reports it once logging is up.
    pub fn log_destination(&self) -> Option<LogDestination> {
        LogDestination::from_name(&self.log_destination)
    }

    pub fn log_level(&self) -> LevelFilter {
        parse_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            listing_url: self.listing_url.clone(),
            post_url: self.post_url.clone(),
        }
    }

    pub fn page_fetch(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.page_timeout_secs),
            user_agent: self.user_agent.clone(),
            ..FetchSettings::pages()
        }
    }

    pub fn image_fetch(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.image_timeout_secs),
            user_agent: self.user_agent.clone(),
            ..FetchSettings::images()
        }
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions {
            language: self.ocr_language.clone(),
            timeout: Duration::from_secs(self.ocr_timeout_secs),
        }
    }

    pub fn scorer(&self) -> KeywordScorer {
        KeywordScorer::with_threshold(self.qualification_threshold)
    }

    pub fn log_summary(&self) {
        match &self.post_url {
            Some(post) => watch_info!("Pinned post: {}", post),
            None => watch_info!("Listing page: {}", self.listing_url),
        }
        watch_info!(
            "Reference image: {}, qualification {}",
            self.reference_path.display(),
            if self.qualification_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("menuwatch.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.qualification_threshold, 1);
        assert_eq!(config.reference_path, PathBuf::from("weekly_menu.jpg"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menuwatch.ron");
        fs::write(
            &path,
            r#"(
                post_url: Some("https://example.com/post/menu-24-02-2025"),
                qualification_threshold: 3,
                log_level: "debug",
            )"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(
            config.post_url.as_deref(),
            Some("https://example.com/post/menu-24-02-2025")
        );
        assert_eq!(config.qualification_threshold, 3);
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.listing_url, AppConfig::default().listing_url);
        assert_eq!(config.image_timeout_secs, 60);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menuwatch.ron");
        fs::write(&path, "(listing_url: 42").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (LISTING_URL_VAR, "https://example.com/news"),
            (REFERENCE_PATH_VAR, "state/menu.jpg"),
            (THRESHOLD_VAR, " 2 "),
            (POST_URL_VAR, "   "),
        ]
        .into();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.listing_url, "https://example.com/news");
        assert_eq!(config.reference_path, PathBuf::from("state/menu.jpg"));
        assert_eq!(config.qualification_threshold, 2);
        assert_eq!(config.post_url, None);
        assert_eq!(config.scorer().threshold(), 2);
    }

    #[test]
    fn bad_threshold_override_is_rejected() {
        let mut config = AppConfig::default();
        let result =
            config.apply_overrides(|name| (name == THRESHOLD_VAR).then(|| "many".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn fetch_settings_follow_timeouts_and_agent() {
        let config = AppConfig {
            page_timeout_secs: 5,
            image_timeout_secs: 7,
            user_agent: "menuwatch/0.1".to_string(),
            ..AppConfig::default()
        };
        let pages = config.page_fetch();
        let images = config.image_fetch();
        assert_eq!(pages.request_timeout, Duration::from_secs(5));
        assert_eq!(images.request_timeout, Duration::from_secs(7));
        assert_eq!(images.user_agent, "menuwatch/0.1");
        assert_eq!(images.max_bytes, FetchSettings::images().max_bytes);
        assert_eq!(config.log_destination(), Some(LogDestination::Both));
    }

    #[test]
    fn unknown_log_destination_is_left_to_the_caller() {
        let config = AppConfig {
            log_destination: "syslog".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.log_destination(), None);
    }

    #[test]
    fn ocr_options_come_from_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menuwatch.ron");
        fs::write(&path, r#"(ocr_language: Some("eng+gle"), ocr_timeout_secs: 15)"#).unwrap();

        let options = AppConfig::load(&path).unwrap().ocr_options();
        assert_eq!(
            options,
            OcrOptions {
                language: Some("eng+gle".to_string()),
                timeout: Duration::from_secs(15),
            }
        );
        assert_eq!(AppConfig::default().ocr_options(), OcrOptions::default());
    }
}
