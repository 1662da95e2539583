use menuwatch_core::ImageResolver;
use menuwatch_engine::{
    select_qualifier, Delivery, LogProgressSink, Notifier, Pipeline, ReferenceStore,
    ReqwestFetcher, RunError, RunOutcome, TelegramCredentials, TelegramNotifier,
};
use menuwatch_logging::{watch_error, watch_info, watch_warn};

use super::config::AppConfig;

pub(crate) const EXIT_OK: u8 = 0;
pub(crate) const EXIT_RUNTIME: u8 = 1;
pub(crate) const EXIT_TRANSPORT: u8 = 2;
pub(crate) const EXIT_NO_POST: u8 = 3;
pub(crate) const EXIT_NO_IMAGE: u8 = 4;
pub(crate) const EXIT_STORE: u8 = 5;
pub(crate) const EXIT_CONFIG: u8 = 6;

/// Wire the pipeline from configuration. Credentials and the recognizer are
/// resolved here, once per process.
pub(crate) fn build_pipeline(config: &AppConfig) -> Pipeline {
    let notifier = TelegramCredentials::from_env().map(|credentials| {
        Box::new(TelegramNotifier::new(
            config.telegram_api_base.clone(),
            credentials,
            config.notify_timeout(),
        )) as Box<dyn Notifier>
    });
    if let Err(err) = &notifier {
        watch_warn!("Telegram delivery unavailable: {}", err);
    }

    Pipeline::new(
        config.pipeline_settings(),
        Box::new(ReqwestFetcher::new(config.page_fetch())),
        Box::new(ReqwestFetcher::new(config.image_fetch())),
        ImageResolver::default(),
        select_qualifier(
            config.qualification_enabled,
            config.scorer(),
            &config.ocr_options(),
        ),
        ReferenceStore::new(config.reference_path.clone()),
        notifier,
        Box::new(LogProgressSink),
    )
}

/// Log the result of a run and pick the process exit code.
pub(crate) fn report(result: &Result<RunOutcome, RunError>) -> u8 {
    match result {
        Ok(RunOutcome::Unchanged) => {
            watch_info!("No new menu this run");
            EXIT_OK
        }
        Ok(RunOutcome::NotQualified) => {
            watch_info!("Image did not look like a menu; nothing published");
            EXIT_OK
        }
        Ok(RunOutcome::Published { delivery }) => {
            match delivery {
                Delivery::Sent => watch_info!("New menu published and delivered"),
                Delivery::Skipped { reason } => {
                    watch_warn!("New menu stored, delivery skipped: {}", reason)
                }
                Delivery::Failed { reason } => {
                    watch_warn!("New menu stored, delivery failed: {}", reason)
                }
            }
            EXIT_OK
        }
        Err(err) => {
            if err.is_listing_unreachable() {
                watch_error!("Listing page unreachable: {}", err);
            } else {
                watch_error!("Run failed: {}", err);
            }
            exit_code(err)
        }
    }
}

pub(crate) fn exit_code(err: &RunError) -> u8 {
    match err {
        RunError::Transport { .. } | RunError::InvalidUrl { .. } => EXIT_TRANSPORT,
        RunError::NoPost { .. } => EXIT_NO_POST,
        RunError::NoImage { .. } => EXIT_NO_IMAGE,
        RunError::Persist(_) => EXIT_STORE,
        RunError::Runtime(_) => EXIT_RUNTIME,
    }
}
