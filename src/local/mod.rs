//! In-process implementation of the inventory service.
//!
//! Serves the same contract as the remote API from memory, enforcing the same
//! business rules. Used for offline runs and end-to-end tests.

mod catalog;
mod client;
mod service;

pub use client::LocalInventory;
pub use service::{LocalInventoryService, MAX_MOVEMENT_QUANTITY, MAX_PAGE_SIZE};
