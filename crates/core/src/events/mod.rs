pub mod bus;
pub mod inbox;
pub mod notice;
pub mod worker;

pub use bus::*;
pub use inbox::*;
pub use notice::*;
pub use worker::*;
