//! HTTP application wiring (axum router + handler registration).
//!
//! - `binding.rs`: turns a `RestHandler` into an axum route
//! - `routes/`: the handlers this binary serves (one file per area)

use axum::Router;

use resto_auth::Authentication;

use crate::config::Settings;

pub mod binding;
pub mod routes;

pub use binding::route;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(settings: &Settings) -> Router {
    let authentication = match &settings.api_tokens {
        Some(tokens) => Authentication::with_backend(tokens.clone()),
        None => {
            tracing::warn!("RESTO_API_TOKENS not set; every request authenticates anonymously");
            Authentication::default()
        }
    };

    routes::router(&routes::Wiring {
        authentication,
        debug: settings.debug,
        max_body_bytes: settings.max_body_bytes,
    })
}
