//! Client for a remote product inventory service.
//!
//! The client keeps an advisory session ([`session`]), a product listing whose
//! fetches are debounced and ordered by a single coordinator actor
//! ([`query`]), and the list screen that composes the two ([`view`]).

#[macro_use]
mod macros;

pub mod api;
pub mod app_system;
pub mod config;
pub mod domain;
pub mod error;
pub mod local;
pub mod messages;
pub mod query;
pub mod session;
pub mod store;
pub mod view;

#[cfg(test)]
mod mock_framework;
