use crate::types::{AlignedCaption, CaptionEntry};

/// Largest start-time gap (seconds) still treated as the same utterance.
pub const DEFAULT_ALIGNMENT_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct CaptionAligner {
    tolerance: f64,
}

impl Default for CaptionAligner {
    fn default() -> Self {
        Self::new(DEFAULT_ALIGNMENT_TOLERANCE)
    }
}

impl CaptionAligner {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Pair every source caption with the target caption whose start is
    /// nearest and strictly within tolerance. Equal gaps keep the earlier
    /// target. Output order and length follow `source`.
    pub fn align(&self, source: &[CaptionEntry], target: &[CaptionEntry]) -> Vec<AlignedCaption> {
        source
            .iter()
            .map(|entry| {
                let target_text = self
                    .closest_match(entry, target)
                    .map(|h| h.text.clone())
                    .unwrap_or_default();

                AlignedCaption {
                    start: entry.start,
                    end: entry.end,
                    source_text: entry.text.clone(),
                    target_text,
                }
            })
            .collect()
    }

    fn closest_match<'a>(
        &self,
        entry: &CaptionEntry,
        target: &'a [CaptionEntry],
    ) -> Option<&'a CaptionEntry> {
        let mut best = None;
        let mut best_delta = self.tolerance;

        for candidate in target {
            let delta = (candidate.start - entry.start).abs();
            if delta < best_delta {
                best = Some(candidate);
                best_delta = delta;
            }
        }

        best
    }
}
