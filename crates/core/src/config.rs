use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cache::get_config_path,
    captions::{CaptionAligner, DEFAULT_ALIGNMENT_TOLERANCE},
    error::{DubdeckError, Result},
    playback::{AudioSettings, DEFAULT_DRIFT_THRESHOLD},
};

/// Tunables for a preview session. Every field has a default, so a partial
/// `config.json` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub drift_threshold_secs: f64,
    pub alignment_tolerance_secs: f64,
    pub initial_volume: f64,
    pub default_track_width_px: f64,
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drift_threshold_secs: DEFAULT_DRIFT_THRESHOLD,
            alignment_tolerance_secs: DEFAULT_ALIGNMENT_TOLERANCE,
            initial_volume: 0.6,
            default_track_width_px: 800.0,
            tick_interval_ms: 250,
        }
    }
}

impl EngineConfig {
    /// Load from `path`. A missing file means defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load_default() -> Result<Self> {
        Self::load(&get_config_path()).await
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(DubdeckError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if !(self.drift_threshold_secs.is_finite() && self.drift_threshold_secs >= 0.0) {
            return invalid("drift_threshold_secs must be a non-negative number");
        }
        if !(self.alignment_tolerance_secs.is_finite() && self.alignment_tolerance_secs >= 0.0) {
            return invalid("alignment_tolerance_secs must be a non-negative number");
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return invalid("initial_volume must be within [0, 1]");
        }
        if !(self.default_track_width_px.is_finite() && self.default_track_width_px > 0.0) {
            return invalid("default_track_width_px must be positive");
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        Ok(())
    }

    pub fn aligner(&self) -> CaptionAligner {
        CaptionAligner::new(self.alignment_tolerance_secs)
    }

    pub fn audio_settings(&self) -> AudioSettings {
        AudioSettings::with_volume(self.initial_volume)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
