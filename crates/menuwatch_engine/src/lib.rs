//! Menuwatch engine: fetching, recognition, persistence, delivery and the run pipeline.
mod decode;
mod engine;
mod fetch;
mod notify;
mod persist;
mod pipeline;
mod qualify;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use engine::EngineHandle;
pub use fetch::{
    FetchSettings, Fetcher, LogProgressSink, ProgressSink, ReqwestFetcher, DEFAULT_USER_AGENT,
};
pub use notify::{
    CredentialsError, Notifier, NotifyError, TelegramCredentials, TelegramNotifier, BOT_TOKEN_VAR,
    CHAT_ID_VAR, DEFAULT_TELEGRAM_API,
};
pub use persist::{ensure_parent_dir, PersistError, ReferenceStore};
pub use pipeline::{
    Delivery, Pipeline, PipelineSettings, PostSource, RunContext, RunError, RunOutcome,
};
pub use qualify::{
    qualifier_for, select_qualifier, AlwaysConfirm, OcrOptions, OcrQualifier, Qualifier,
    RecognitionError, TesseractRecognizer, TextRecognizer,
};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, FetchProgress, Stage,
};
