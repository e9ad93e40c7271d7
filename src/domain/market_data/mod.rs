//! Market data aggregate: candles, the live candle store, indicators and the
//! data source contracts.

pub mod entities;
pub mod indicator_engine;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use indicator_engine::*;
pub use repositories::*;
pub use value_objects::*;
