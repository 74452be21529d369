//! Wire-level entities shared by the API, the coordinator and the views.

pub mod auth;
pub mod movement;
pub mod page;
pub mod product;

pub use auth::*;
pub use movement::*;
pub use page::*;
pub use product::*;
