mod config;
mod run;

use std::path::Path;
use std::process::ExitCode;

use log::LevelFilter;
use menuwatch_engine::EngineHandle;
use menuwatch_logging::{
    initialize, watch_error, watch_info, watch_warn, LogDestination, DEFAULT_LOG_FILE,
};

use config::{AppConfig, CONFIG_FILENAME};

/// One scheduled check: load config, run the pipeline once, exit.
pub fn run_app() -> ExitCode {
    let _ = dotenvy::dotenv();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            initialize(
                LogDestination::Terminal,
                LevelFilter::Info,
                Path::new(DEFAULT_LOG_FILE),
            );
            watch_error!("Configuration error: {:#}", err);
            return ExitCode::from(run::EXIT_CONFIG);
        }
    };

    let destination = config.log_destination();
    initialize(
        destination.unwrap_or(LogDestination::Both),
        config.log_level(),
        Path::new(DEFAULT_LOG_FILE),
    );
    if destination.is_none() {
        watch_warn!(
            "Unknown log destination {:?}, logging to both",
            config.log_destination
        );
    }
    watch_info!("menuwatch {} starting", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let engine = match EngineHandle::new() {
        Ok(engine) => engine,
        Err(err) => {
            watch_error!("Failed to start runtime: {}", err);
            return ExitCode::from(run::EXIT_RUNTIME);
        }
    };

    let pipeline = run::build_pipeline(&config);
    let mut ctx = pipeline.new_context();
    let today = chrono::Local::now().date_naive();
    let result = engine.run_once(&pipeline, &mut ctx, today);

    ExitCode::from(run::report(&result))
}

fn load_config() -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(Path::new(CONFIG_FILENAME))?;
    config.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}
