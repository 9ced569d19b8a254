//! Domain models specific to the storefront service.

pub mod address;
pub mod session;
pub mod user;

pub use address::Address;
pub use session::{CurrentUser, session_keys};
pub use user::User;
