pub mod chunks;
pub mod resource;
pub mod state;
pub mod sync;

pub use chunks::{ChunkSequencer, SequencerOutcome, SequencerState};
pub use resource::{ChunkResource, LoadTicket, MediaResource, PlayRejected, ResourceEvent};
pub use state::{AudioSettings, PlaybackState};
pub use sync::{DEFAULT_DRIFT_THRESHOLD, Synchronizer};
