//! HTTP middleware for the storefront.

pub mod identity;
pub mod session;

pub use identity::{Identity, RequireAuth};
pub use session::create_session_layer;
