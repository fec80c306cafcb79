//! Application services shared by the HTTP handlers.

pub mod session;

pub use session::{Session, SessionService};
