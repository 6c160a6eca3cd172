use std::sync::Arc;

use serde_json::{Value, json};

use resto_core::{ApiError, CamelCaseJsonSerializer, Request};

use crate::handler::RestHandler;
use crate::method::Method;
use crate::operation::{OperationResult, Outcome};

use super::Wiring;

/// Echo service speaking camelCase on the wire.
pub fn handler(wiring: &Wiring) -> RestHandler {
    RestHandler::builder("echo")
        .allow(Method::Get)
        .allow(Method::Post)
        .authentication(wiring.authentication.clone())
        .serializer(Arc::new(CamelCaseJsonSerializer::new()))
        .debug(wiring.debug)
        .get(echo_param)
        .post(echo_payload)
        .build()
}

async fn echo_param(req: Request) -> OperationResult {
    let message = req.param("message")?;
    Outcome::body(&json!({
        "message": message,
        "received_at": req.received_at().to_rfc3339(),
    }))
}

/// Payload keys arrive snake_cased and leave camelCased again.
async fn echo_payload(req: Request) -> OperationResult {
    match req.payload() {
        Some(Value::Object(map)) => Ok(Outcome::Body(map.clone())),
        _ => Err(ApiError::bad_request()
            .with_message("Expected a JSON object body")
            .into()),
    }
}
