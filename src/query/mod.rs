//! Criteria, pagination and fetch arbitration for the product listing.

mod client;
mod service;
mod state;

pub use client::QueryClient;
pub use service::{QueryService, LOAD_FAILED};
pub use state::{FetchRequest, FilterCriteria, ListState};
