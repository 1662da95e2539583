use std::path::PathBuf;
use std::time::Duration;

use image::ImageFormat;
use menuwatch_core::{KeywordScorer, Qualification};
use menuwatch_logging::{watch_debug, watch_info, watch_warn};
use thiserror::Error;

const TESSERACT_BINARY: &str = "tesseract";
const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("text recognition exited with {status}: {stderr}")]
    Process { status: String, stderr: String },
    #[error("text recognition timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns image bytes into free text.
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, RecognitionError>;
}

/// Runs the `tesseract` executable on a PNG re-encoding of the image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    language: Option<String>,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: None,
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }

    /// Looks the executable up on `PATH`.
    pub fn detect() -> Option<Self> {
        which::which(TESSERACT_BINARY).ok().map(Self::new)
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, RecognitionError> {
        let decoded =
            image::load_from_memory(image).map_err(|e| RecognitionError::Decode(e.to_string()))?;

        let mut input = tempfile::Builder::new()
            .prefix("menuwatch-ocr-")
            .suffix(".png")
            .tempfile()?;
        decoded
            .write_to(input.as_file_mut(), ImageFormat::Png)
            .map_err(|e| RecognitionError::Decode(e.to_string()))?;

        let mut command = tokio::process::Command::new(&self.binary);
        command.arg(input.path()).arg("stdout");
        if let Some(language) = &self.language {
            command.arg("-l").arg(language);
        }
        command.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| RecognitionError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(RecognitionError::Process {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_lowercase())
    }
}

/// Decides whether downloaded bytes plausibly show a menu.
#[async_trait::async_trait]
pub trait Qualifier: Send + Sync {
    async fn qualify(&self, image: &[u8]) -> Qualification;
}

/// Used when no text recognition is available: every image is confirmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

#[async_trait::async_trait]
impl Qualifier for AlwaysConfirm {
    async fn qualify(&self, _image: &[u8]) -> Qualification {
        Qualification::skipped()
    }
}

/// Recognizes text and scores it against the menu vocabulary.
///
/// A recognition error yields an unconfirmed result.
pub struct OcrQualifier<R> {
    recognizer: R,
    scorer: KeywordScorer,
}

impl<R: TextRecognizer> OcrQualifier<R> {
    pub fn new(recognizer: R, scorer: KeywordScorer) -> Self {
        Self { recognizer, scorer }
    }
}

#[async_trait::async_trait]
impl<R: TextRecognizer> Qualifier for OcrQualifier<R> {
    async fn qualify(&self, image: &[u8]) -> Qualification {
        match self.recognizer.recognize(image).await {
            Ok(text) => {
                let result = self.scorer.score(&text);
                watch_debug!(
                    "Recognized {} chars, matched {:?}",
                    text.len(),
                    result.matched
                );
                result
            }
            Err(err) => {
                watch_warn!("Text recognition failed: {}", err);
                Qualification::failed(err.to_string())
            }
        }
    }
}

/// How a detected recognizer is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    /// Passed to tesseract as `-l`; its default language otherwise.
    pub language: Option<String>,
    pub timeout: Duration,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: None,
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

impl OcrOptions {
    fn apply(&self, recognizer: TesseractRecognizer) -> TesseractRecognizer {
        let recognizer = recognizer.with_timeout(self.timeout);
        match &self.language {
            Some(language) => recognizer.with_language(language.clone()),
            None => recognizer,
        }
    }
}

/// Resolve the qualification capability once for the whole run, looking
/// `tesseract` up on `PATH` only when qualification is enabled.
pub fn select_qualifier(
    enabled: bool,
    scorer: KeywordScorer,
    options: &OcrOptions,
) -> Box<dyn Qualifier> {
    let recognizer = if enabled {
        TesseractRecognizer::detect().map(|found| options.apply(found))
    } else {
        None
    };
    qualifier_for(enabled, recognizer, scorer)
}

/// Qualifier for an already resolved recognizer.
pub fn qualifier_for(
    enabled: bool,
    recognizer: Option<TesseractRecognizer>,
    scorer: KeywordScorer,
) -> Box<dyn Qualifier> {
    if !enabled {
        watch_info!("Content qualification disabled by configuration");
        return Box::new(AlwaysConfirm);
    }
    match recognizer {
        Some(recognizer) => {
            watch_info!(
                "Text recognition available, threshold > {}",
                scorer.threshold()
            );
            Box::new(OcrQualifier::new(recognizer, scorer))
        }
        None => {
            watch_info!("Text recognition unavailable; images are confirmed without OCR");
            Box::new(AlwaysConfirm)
        }
    }
}
