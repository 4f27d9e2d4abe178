//! Network transport for ocache.
//!
//! This crate provides the HTTP [`Transport`](ocache_core::Transport) the
//! worker fetches through, built on reqwest.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
