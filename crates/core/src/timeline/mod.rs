pub mod drag;
pub mod scale;
pub mod trim;

pub use drag::{DragController, DragGesture, DragHandle, TimelineTarget};
pub use scale::{TimelineScale, ruler_ticks, tick_interval};
pub use trim::{TrimUpdate, TrimWindow};
