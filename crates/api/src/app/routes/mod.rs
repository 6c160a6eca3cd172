use std::sync::Arc;

use axum::Router;

use resto_auth::Authentication;

use crate::app::route;

pub mod echo;
pub mod system;
pub mod users;

/// Shared registration inputs. Each handler gets its own copy of the gate.
#[derive(Debug, Clone)]
pub struct Wiring {
    pub authentication: Authentication,
    pub debug: bool,
    pub max_body_bytes: usize,
}

pub fn router(wiring: &Wiring) -> Router {
    let limit = wiring.max_body_bytes;
    let directory = Arc::new(users::UserDirectory::default());

    Router::new()
        .route("/ping", route(Arc::new(system::ping(wiring)), limit))
        .route("/me", route(Arc::new(system::me(wiring)), limit))
        .route("/echo", route(Arc::new(echo::handler(wiring)), limit))
        .route("/users/:user_id", route(Arc::new(users::handler(directory, wiring)), limit))
}
