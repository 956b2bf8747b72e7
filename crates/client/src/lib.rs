//! Console API client and managed list controllers.
//!
//! Provides the REST wrapper for the console backend, the
//! [`ResourceBackend`](backend::ResourceBackend) seam the controllers fetch
//! through, search debouncing, and the per-resource
//! [`ListController`](controller::ListController).

pub mod api;
pub mod backend;
pub mod config;
pub mod controller;
pub mod debounce;
