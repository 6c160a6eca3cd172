//! axum binding: feeds any method on a route into a [`RestHandler`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, Request as HttpRequest};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{MethodRouter, any};

use resto_core::{ApiError, Request};

use crate::handler::RestHandler;
use crate::writer::WireResponse;

/// Route every method to `handler`. Method policy is the handler's business,
/// so axum's own 405 handling is bypassed.
pub fn route(handler: Arc<RestHandler>, max_body_bytes: usize) -> MethodRouter {
    any(
        move |path: Option<Path<HashMap<String, String>>>,
              query: Option<Query<HashMap<String, String>>>,
              request: HttpRequest| {
            let handler = handler.clone();
            async move { serve(&handler, path, query, request, max_body_bytes).await }
        },
    )
}

async fn serve(
    handler: &RestHandler,
    path: Option<Path<HashMap<String, String>>>,
    query: Option<Query<HashMap<String, String>>>,
    request: HttpRequest,
    max_body_bytes: usize,
) -> WireResponse {
    let (parts, body) = request.into_parts();

    let mut req = Request::new(parts.method.as_str(), parts.uri.path())
        .with_path_args(path.map(|Path(args)| args).unwrap_or_default())
        .with_query(query.map(|Query(args)| args).unwrap_or_default());

    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(value) => req = req.with_header(name.as_str(), value),
            Err(_) => tracing::debug!(header = %name, "skipping non-text header"),
        }
    }

    match axum::body::to_bytes(body, max_body_bytes).await {
        Ok(bytes) => handler.handle(req.with_body(bytes.to_vec())).await,
        Err(err) => {
            tracing::warn!(request_id = %req.id(), error = %err, "failed to read request body");
            handler.reject(
                &req,
                ApiError::bad_request().with_message("Request body is too large or unreadable"),
            )
        }
    }
}

impl IntoResponse for WireResponse {
    fn into_response(self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = HttpResponse::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = name, "dropping header that is not valid on the wire"),
            }
        }
        response
    }
}
