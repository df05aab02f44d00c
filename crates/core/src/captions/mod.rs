pub mod align;
pub mod parse;
pub mod source;
pub mod track;

pub use align::{CaptionAligner, DEFAULT_ALIGNMENT_TOLERANCE};
pub use parse::{parse_captions, parse_timestamp};
pub use source::{
    CaptionSource, FileCaptionSource, HttpCaptionSource, caption_source_for, load_aligned,
};
pub use track::AlignedCaptions;
