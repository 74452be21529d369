//! Application wiring, startup, and shutdown logic.

mod inventory_app;
mod telemetry;

pub use inventory_app::InventoryApp;
pub use telemetry::setup_tracing;
