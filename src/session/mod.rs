//! Advisory session state: token persistence, expiry checks and the
//! authenticated/unauthenticated broadcast.
//!
//! Nothing here is a security boundary. The server authorizes every request on
//! its own; this module only decides what the client should show and where it
//! should navigate.

mod clock;
mod guard;
mod manager;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use guard::{Navigation, Route, RouteGuard};
pub use manager::{Session, SessionManager, SessionState, TOKEN_KEY, USERNAME_KEY};
