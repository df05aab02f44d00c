use std::sync::Arc;

use dubdeck_core::{Envelope, FinishReason, Notice, NoticeWorker};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    Finished(FinishReason),
    MediaFailed(String),
}

/// Resolves `done` once, on the first notice that ends the preview.
pub struct CliCompletionSinkWorker {
    done: Option<oneshot::Sender<PreviewOutcome>>,
}

impl CliCompletionSinkWorker {
    pub fn new(done: oneshot::Sender<PreviewOutcome>) -> Self {
        Self { done: Some(done) }
    }
}

impl NoticeWorker for CliCompletionSinkWorker {
    const SUBSCRIBER_ID: &'static str = "cli.completion_sink";

    async fn handle(&mut self, envelope: Arc<Envelope>) -> anyhow::Result<()> {
        let outcome = match &envelope.notice {
            Notice::PlaybackFinished { reason } => PreviewOutcome::Finished(*reason),
            Notice::MediaLoadFailed { reason } => PreviewOutcome::MediaFailed(reason.clone()),
            _ => return Ok(()),
        };

        if let Some(done) = self.done.take() {
            let _ = done.send(outcome);
        }
        Ok(())
    }
}
