//! Pure engine state: candles, indicators, the replay state machine and the
//! contracts of the collaborators the engine talks to.

pub mod annotations;
pub mod chart;
pub mod errors;
pub mod events;
pub mod logging;
pub mod market_data;
pub mod replay;
