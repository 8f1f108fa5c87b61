//! Test id generator — deterministic `IdGenerator` implementation.

use std::sync::Mutex;

use fateloom_core::id::IdGenerator;
use uuid::Uuid;

/// Hands out UUIDs built from a counter, in order.
#[derive(Debug)]
pub struct SequenceIds {
    next: Mutex<u128>,
}

impl SequenceIds {
    /// Creates a generator whose first id is `Uuid::from_u128(start)`.
    ///
    /// Start well above 0 so generated ids never collide with fixture ids
    /// tests build by hand.
    #[must_use]
    pub fn new(start: u128) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn new_id(&self) -> Uuid {
        let mut next = self.next.lock().expect("id counter lock poisoned");
        let id = Uuid::from_u128(*next);
        *next += 1;
        id
    }
}
