use chrono::NaiveDate;

use crate::pipeline::{Pipeline, RunContext, RunError, RunOutcome};

/// Drives one pipeline run to completion on a current-thread runtime.
///
/// Every fetch is awaited in turn; nothing runs concurrently within a run.
pub struct EngineHandle {
    runtime: tokio::runtime::Runtime,
}

impl EngineHandle {
    pub fn new() -> Result<Self, RunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| RunError::Runtime(err.to_string()))?;
        Ok(Self { runtime })
    }

    pub fn run_once(
        &self,
        pipeline: &Pipeline,
        ctx: &mut RunContext,
        today: NaiveDate,
    ) -> Result<RunOutcome, RunError> {
        self.runtime.block_on(pipeline.run(ctx, today))
    }
}
