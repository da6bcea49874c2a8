//! Single-threaded change notification primitives.
//!
//! # Responsibility
//! - [`Observable`]: emitter that fans one value out to every live subscriber.
//! - [`Subscription`]: RAII guard; dropping it unsubscribes.
//! - [`DisposeBag`]: owns a group of subscriptions released together.
//!
//! # Invariants
//! - Subscribers are notified in registration order.
//! - Subscribers are held weakly by the emitter; only the `Subscription`
//!   keeps a callback alive. Dead entries are pruned lazily on emit.
//! - A callback that is already running is never re-entered.

mod dispose;
mod observable;

pub use dispose::DisposeBag;
pub use observable::{Observable, Subscription};
