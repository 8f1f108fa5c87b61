//! Fateloom Fork — campaign branching and lineage.
//!
//! A fork seeds a new campaign's journal by selectively copying a source
//! campaign's events up to a resolved fork point, re-applies projections,
//! and records ancestry with bounded depth computation.

pub mod engine;

pub use engine::{ForkEngine, ForkEngineDeps, ForkOutcome, ForkPoint, ForkRequest};
