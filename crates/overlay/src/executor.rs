//! Background runs.
//!
//! Each run executes on its own `std::thread`; progress goes out through
//! the pipeline's event channel and the report comes back via the join
//! handle.

use std::sync::Arc;
use std::thread::JoinHandle;

use ndlayer_cloud::ArchiveSource;
use tracing::info;

use crate::error::StageFailure;
use crate::pipeline::{Pipeline, RunReport};
use crate::session::{MapSession, RunToken};

/// Start a run for `source` on a background thread.
///
/// The run token is taken before the thread starts, so calling this again
/// immediately supersedes the earlier run.
pub fn spawn_run(
    pipeline: Arc<Pipeline>,
    source: ArchiveSource,
    session: Arc<MapSession>,
) -> (RunToken, JoinHandle<Result<RunReport, StageFailure>>) {
    let token = session.begin_run();
    let run_token = token.clone();

    let handle = std::thread::spawn(move || {
        info!(%source, generation = run_token.generation(), "starting run");
        let archive = pipeline.fetch(&source)?;
        pipeline.run(&archive, &session, &run_token)
    });

    (token, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::{PipelineError, Stage};
    use crate::events::PipelineEvent;
    use crate::publisher::MemorySink;

    #[test]
    fn missing_archive_fails_fetch() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let pipeline = Arc::new(Pipeline::new(PipelineConfig::default()).unwrap().with_events(tx));
        let session = Arc::new(MapSession::new(MemorySink::new()));

        let (token, handle) = spawn_run(
            pipeline,
            ArchiveSource::parse("/no/such/archive.zip"),
            session.clone(),
        );
        assert!(session.is_current(&token));

        let failure = handle.join().unwrap().unwrap_err();
        assert_eq!(failure.stage, Stage::Fetch);
        assert!(matches!(failure.error, PipelineError::Fetch(_)));

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Failed { stage: Stage::Fetch, .. })));
    }
}
