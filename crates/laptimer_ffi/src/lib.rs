//! Flutter-facing bindings for the Laptimer core.

pub mod api;
