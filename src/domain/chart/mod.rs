//! Chart-facing values: chart types, series points, visible ranges, the
//! surface contract and the viewport guard.

pub mod services;
pub mod surface;
pub mod value_objects;
pub mod viewport_guard;

pub use services::*;
pub use surface::*;
pub use value_objects::*;
pub use viewport_guard::*;
