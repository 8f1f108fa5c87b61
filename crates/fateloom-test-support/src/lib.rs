//! Shared test mocks and utilities for the Fateloom campaign engine.

mod clock;
mod events;
mod ids;

pub use clock::{FixedClock, fixed_time};
pub use events::EventBuilder;
pub use ids::SequenceIds;
