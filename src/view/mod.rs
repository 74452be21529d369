//! Screen-level composition: the product list and the edit forms.

pub mod forms;
mod list;

pub use forms::{MovementForm, ProductForm};
pub use list::ListViewController;
