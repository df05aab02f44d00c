use serde::Serialize;

use crate::{
    captions::align::CaptionAligner,
    timeline::TrimWindow,
    types::{AlignedCaption, CaptionEntry, CaptionField},
};

/// The aligned caption sequence for one pair of caption sources.
///
/// Built once per source change; afterwards only [`AlignedCaptions::edit`]
/// touches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignedCaptions {
    entries: Vec<AlignedCaption>,
}

impl AlignedCaptions {
    pub fn new(entries: Vec<AlignedCaption>) -> Self {
        Self { entries }
    }

    pub fn align(
        aligner: &CaptionAligner,
        source: &[CaptionEntry],
        target: &[CaptionEntry],
    ) -> Self {
        Self::new(aligner.align(source, target))
    }

    pub fn entries(&self) -> &[AlignedCaption] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&AlignedCaption> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the text of one field. Returns `false` for an unknown index.
    pub fn edit(&mut self, index: usize, field: CaptionField, text: impl Into<String>) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        match field {
            CaptionField::Source => entry.source_text = text.into(),
            CaptionField::Target => entry.target_text = text.into(),
        }
        true
    }

    /// Captions overlapping the trim window, with their index in the full list.
    pub fn visible_in<'a>(
        &'a self,
        trim: &TrimWindow,
    ) -> impl Iterator<Item = (usize, &'a AlignedCaption)> + 'a {
        let (start, end) = (trim.start(), trim.end());
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.end > start && c.start < end)
    }

    /// Index of the visible caption under the playhead.
    pub fn active_index(&self, trim: &TrimWindow, position: f64) -> Option<usize> {
        self.visible_in(trim)
            .find(|(_, c)| c.contains(position))
            .map(|(i, _)| i)
    }

    /// Target-language text in order, for speech synthesis.
    pub fn target_script(&self) -> String {
        self.entries
            .iter()
            .map(|c| c.target_text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
