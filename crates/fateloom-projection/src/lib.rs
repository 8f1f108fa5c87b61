//! Fateloom Projection — read models derived from the journal.
//!
//! The applier consumes one stored event and updates the wired read-model
//! stores; the replayer drives the applier over a bounded or filtered
//! slice of a campaign's journal.

pub mod applier;
pub mod memory;
pub mod replay;
