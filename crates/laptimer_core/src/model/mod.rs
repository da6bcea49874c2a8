//! Lap domain model.
//!
//! # Responsibility
//! - Define the lap record created on every tap.
//! - Provide the time source used to stamp new laps.
//!
//! # Invariants
//! - Laps are append-only: a persisted lap is never edited or removed by core.
//! - Identity is assigned by storage, never by the in-memory value.

pub mod clock;
pub mod lap;
