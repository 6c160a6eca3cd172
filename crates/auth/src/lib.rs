//! `resto-auth` - authentication gate in front of the dispatcher.
//!
//! The gate knows nothing about credentials; it delegates to a pluggable
//! [`AuthBackend`] and reports a yes/no decision plus the identity found.

pub mod backend;
pub mod gate;
pub mod token;

pub use backend::{AllowAll, AuthBackend};
pub use gate::Authentication;
pub use token::{StaticTokenBackend, TokenTableError, extract_bearer};
