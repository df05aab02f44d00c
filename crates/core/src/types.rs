use serde::{Deserialize, Serialize};

/// One timed caption as parsed from a subtitle file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A source caption paired with the target-language caption that starts
/// closest to it. `target_text` is empty when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedCaption {
    pub start: f64,
    pub end: f64,
    pub source_text: String,
    pub target_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionField {
    Source,
    Target,
}

impl AlignedCaption {
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position < self.end
    }
}
