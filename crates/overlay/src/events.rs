//! Progress events for observers of a run.

use std::time::Duration;

use crossbeam_channel::Sender;
use ndlayer_core::IndexKind;

use crate::error::{Stage, StageFailure};

/// What a run reports while it progresses. `kind` is `None` for the
/// run-wide stages (fetch, extract, decode).
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageFinished {
        kind: Option<IndexKind>,
        stage: Stage,
        elapsed: Duration,
    },
    Failed {
        kind: Option<IndexKind>,
        stage: Stage,
        message: String,
    },
    Published {
        kind: IndexKind,
        title: String,
    },
    Superseded {
        kind: IndexKind,
    },
    RunFinished {
        published: usize,
        failed: usize,
    },
}

impl From<&StageFailure> for PipelineEvent {
    fn from(f: &StageFailure) -> Self {
        Self::Failed {
            kind: f.kind,
            stage: f.stage,
            message: f.error.to_string(),
        }
    }
}

/// Optional event channel. A dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub(crate) struct Events(Option<Sender<PipelineEvent>>);

impl Events {
    pub(crate) fn new(tx: Sender<PipelineEvent>) -> Self {
        Self(Some(tx))
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}
