//! Replay aggregate: the live/replay state machine and the pointer-driven
//! seek handle that feeds it.

pub mod controller;
pub mod scrub;
pub mod state;

pub use controller::*;
pub use scrub::*;
pub use state::*;
