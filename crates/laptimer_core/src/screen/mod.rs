//! Lap screen: binds the observed lap log to a view and taps to writes.
//!
//! # Responsibility
//! - Project each observed collection into a title and list rows.
//! - Turn tap events into persisted laps.
//! - Own every subscription for the lifetime of one activation.
//!
//! # Invariants
//! - The controller holds no lap cache; views are re-derived per emission.
//! - Deactivation releases all subscriptions and the store together.
//! - A failed write is reported and isolated; later taps still record.

mod controller;
mod projection;

pub use controller::{
    FileStoreOpener, LapView, ScreenController, ScreenError, ScreenPhase, StoreOpener, TapSource,
};
pub use projection::{rows_for, title_for};
