use chrono::Utc;
use serde_json::json;

use resto_auth::Authentication;
use resto_core::{ApiError, Request};

use crate::handler::RestHandler;
use crate::method::Method;
use crate::operation::{OperationResult, Outcome};

use super::Wiring;

/// Liveness probe. Public: authenticates with the default backend.
pub fn ping(wiring: &Wiring) -> RestHandler {
    RestHandler::builder("ping")
        .allow(Method::Get)
        .allow(Method::Head)
        .authentication(Authentication::default())
        .debug(wiring.debug)
        .get(pong)
        .head(pong)
        .build()
}

async fn pong(_req: Request) -> OperationResult {
    Outcome::body(&json!({
        "pong": true,
        "server_time": Utc::now().to_rfc3339(),
    }))
}

/// The caller's identity as seen by the gate.
pub fn me(wiring: &Wiring) -> RestHandler {
    RestHandler::builder("me")
        .allow(Method::Get)
        .authentication(wiring.authentication.clone())
        .debug(wiring.debug)
        .get(whoami)
        .build()
}

async fn whoami(req: Request) -> OperationResult {
    let identity = req.identity().ok_or_else(ApiError::unauthorized)?;
    Outcome::body(&json!({
        "subject": identity.subject(),
        "roles": identity.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "authenticated_at": identity.authenticated_at().to_rfc3339(),
        "request_id": req.id().to_string(),
    }))
}
