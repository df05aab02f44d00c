use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    TrimEnd,
    ChunksExhausted,
    MediaEnded,
}

/// Something the engine wants the UI to know about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    PositionChanged { position: f64 },
    PlaybackStarted,
    PlaybackPaused,
    PlaybackFinished { reason: FinishReason },
    TrimChanged { start: f64, end: f64 },
    ChunkAdvanced { index: usize },
    ChunkLoadFailed { index: usize, reason: String },
    PlayRejected { reason: String },
    MediaLoadFailed { reason: String },
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::PositionChanged { .. } => "playback.position_changed",
            Notice::PlaybackStarted => "playback.started",
            Notice::PlaybackPaused => "playback.paused",
            Notice::PlaybackFinished { .. } => "playback.finished",
            Notice::TrimChanged { .. } => "trim.changed",
            Notice::ChunkAdvanced { .. } => "chunks.advanced",
            Notice::ChunkLoadFailed { .. } => "chunks.load_failed",
            Notice::PlayRejected { .. } => "playback.play_rejected",
            Notice::MediaLoadFailed { .. } => "media.load_failed",
        }
    }

    /// Snapshot notices only matter in their latest version.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Notice::PositionChanged { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub notice: Notice,
    pub session_id: Uuid,
    pub seq: u64,
    pub emitted_at: SystemTime,
}
