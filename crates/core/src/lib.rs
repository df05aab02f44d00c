pub mod cache;
pub mod captions;
pub mod config;
pub mod dubbing;
pub mod error;
pub mod events;
pub mod format;
pub mod playback;
pub mod session;
pub mod timeline;
pub mod types;

pub use cache::{get_config_path, get_dubbed_dir, get_manifest_path, get_root_cache_dir};
pub use captions::{
    AlignedCaptions, CaptionAligner, CaptionSource, caption_source_for, load_aligned,
    parse_captions,
};
pub use config::EngineConfig;
pub use dubbing::{
    CachedChunkProvider, ChunkManifest, ChunkProvider, DEFAULT_CHUNK_CHARS, StaticChunkProvider,
    chunk_text, load_manifest, save_manifest, wav_duration,
};
pub use error::{DubdeckError, Result};
pub use events::{Envelope, FinishReason, Notice, NoticeBus, NoticeWorker, Subscription};
pub use format::{format_aligned_readable, format_timestamp, format_trim};
pub use playback::{
    AudioSettings, ChunkResource, LoadTicket, MediaResource, PlayRejected, PlaybackState,
    ResourceEvent, Synchronizer,
};
pub use session::PreviewSession;
pub use timeline::{DragHandle, TimelineScale, TrimWindow, ruler_ticks};
pub use types::{AlignedCaption, CaptionEntry, CaptionField};
