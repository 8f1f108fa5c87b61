//! Identifier generation abstraction.
//!
//! Handlers and the fork engine never call `Uuid::now_v7` directly; an
//! injected generator keeps new-entity identifiers deterministic in tests.

use uuid::Uuid;

/// Abstraction over identifier generation.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn new_id(&self) -> Uuid;
}

/// Production generator backed by time-ordered UUID v7.
#[derive(Debug, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}
