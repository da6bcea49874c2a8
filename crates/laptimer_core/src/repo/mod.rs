//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for laps.
//! - Isolate SQLite query details from the store and screen layers.
//!
//! # Invariants
//! - The repository exposes no update or delete path; laps are append-only.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod lap_repo;
