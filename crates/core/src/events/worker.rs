use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::events::{bus::Subscription, notice::Envelope};

/// A consumer of engine notices running on its own task.
pub trait NoticeWorker: Send + Sized + 'static {
    const SUBSCRIBER_ID: &'static str;

    async fn handle(&mut self, envelope: Arc<Envelope>) -> Result<()>;

    /// Drain the subscription until it closes or `shutdown` fires. A failing
    /// `handle` is logged and the loop carries on.
    async fn run(mut self, subscription: Subscription, shutdown: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                next = subscription.recv() => match next {
                    None => return Ok(()),
                    Some(envelope) => {
                        let kind = envelope.notice.kind();
                        if let Err(e) = self.handle(envelope).await {
                            warn!(
                                worker = Self::SUBSCRIBER_ID,
                                notice = kind,
                                "handler failed: {e}"
                            );
                        }
                    }
                },
            }
        }
    }
}
