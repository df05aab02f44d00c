//! What the engine needs from a media element.
//!
//! Resources are driven by the host: the engine calls into them and the host
//! feeds their lifecycle back as [`ResourceEvent`]s.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A `play()` request the resource refused (autoplay policy, decode error, ...).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("play rejected: {reason}")]
pub struct PlayRejected {
    pub reason: String,
}

impl PlayRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub trait MediaResource {
    fn position(&self) -> f64;
    fn set_position(&mut self, t: f64);
    fn duration(&self) -> Option<f64>;
    fn is_playing(&self) -> bool;
    fn play(&mut self) -> Result<(), PlayRejected>;
    fn pause(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn set_volume(&mut self, volume: f64);
}

/// An audio element that can be pointed at another chunk URL.
pub trait ChunkResource: MediaResource {
    /// Begin loading `url` without blocking. The host later reports
    /// [`ResourceEvent::Loaded`] or [`ResourceEvent::LoadFailed`] carrying
    /// `ticket.id()`. Work for a cancelled ticket may be abandoned.
    fn load(&mut self, url: &str, ticket: LoadTicket);
}

/// Identifies one issued load. Completions for any other ticket are stale.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    id: u64,
    index: usize,
    cancel: CancellationToken,
}

impl LoadTicket {
    pub(crate) fn new(id: u64, index: usize, cancel: CancellationToken) -> Self {
        Self { id, index, cancel }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Periodic time-update from the resource's own clock.
    PositionProgressed,
    MetadataLoaded { duration: f64 },
    Ended,
    Loaded { ticket_id: u64, duration: Option<f64> },
    LoadFailed { ticket_id: Option<u64>, reason: String },
}
