use serde::{Deserialize, Serialize};

/// Snapshot of the transport. `position` follows the video clock.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlaybackState {
    pub position: f64,
    pub playing: bool,
    pub using_secondary_audio: bool,
}

/// User mute / volume, applied to whichever source is audible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub volume: f64,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

impl AudioSettings {
    pub fn with_volume(volume: f64) -> Self {
        Self {
            volume: clamp_volume(volume),
            muted: false,
        }
    }
}

pub(crate) fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) }
}
