//! Auth handlers and supporting modules.
//!
//! The handlers own the cross-cutting control flow: login runs the limiter
//! before any credential work, refresh combines token validation with the
//! revocation blacklist, logout writes the blacklist entry. The leaf
//! components they orchestrate live at the crate root (`token`, `password`,
//! `rate_limit`, `revocation`, `audit`).

mod error;
pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod register;
pub(crate) mod session;
mod state;
pub(crate) mod storage;
pub(crate) mod types;
mod utils;

pub use error::AuthError;
pub use state::{AuthConfig, AuthState};
pub(crate) use utils::extract_client_ip;
