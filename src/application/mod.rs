pub mod annotation_bridge;
pub mod coordinator;
pub mod use_cases;

pub use annotation_bridge::*;
pub use coordinator::*;
pub use use_cases::*;
