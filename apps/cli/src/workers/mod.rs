pub mod completion_sink;
pub mod progress;
