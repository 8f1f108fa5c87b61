//! Fateloom Journal — event journal backends.
//!
//! Append-time normalization, content hashing, and the cursor codec are
//! shared; `memory` is the single-process backend every test runs against,
//! `pg` is the PostgreSQL backend for durable deployments.

pub mod cursor;
pub mod hash;
pub mod memory;
pub mod normalize;
pub mod pg;
pub mod schema;
