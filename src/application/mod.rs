//! Application layer orchestrating the payment aggregate.
//!
//! This module defines the `PaymentTracker`, the entry point the chain watcher
//! feeds. It loads the aggregate, applies one update, persists the result and
//! publishes events, serializing work per transaction hash.

pub mod tracker;
pub mod update;
