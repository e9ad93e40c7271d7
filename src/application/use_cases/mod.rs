pub mod data_feed;
pub mod playback;

pub use data_feed::*;
pub use playback::*;
