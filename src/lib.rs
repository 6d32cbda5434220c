//! # advice-card
//!
//! A small advice card backed by a remote advice endpoint. Shows the last
//! committed advice straight from a local cache, refreshes it on mount, and
//! swaps in a prefetched advice when the user asks for a new one.
//!
//! The crate owns the request-state handling (fetch, cache, display, prefetch)
//! behind a controller; the `advice-card` binary hosts it in a terminal.

pub mod advice;
pub mod config;
pub mod controller;
pub mod fetch;
pub mod lock;
pub mod store;
pub mod view;
