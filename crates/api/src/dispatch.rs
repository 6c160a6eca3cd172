//! Dispatch state machine.
//!
//! ```text
//! ROUTING -> METHOD_CHECKED -> AUTHENTICATED -> EXECUTING -> RESOLVED
//! ```
//!
//! Any stage before execution may short-circuit with a declared error. All
//! failures (declared errors, other errors, panics) meet in
//! [`RestHandler::resolve`], the only place they are turned into a response.
//! Rendering then writes exactly one [`WireResponse`].

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::Instrument;

use resto_core::status::HTTP_STATUS_INTERNAL_SERVER_ERROR;
use resto_core::{ApiError, Envelope, ErrorClass, Headers, Request, RequestId, Response};

use crate::handler::RestHandler;
use crate::method::Method;
use crate::panic_report;
use crate::writer::{ResponseWriter, WireResponse, WriteError};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Routing,
    MethodChecked,
    Authenticated,
    Executing,
    Resolved,
}

/// Terminal state of one dispatch cycle, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Rendered inside the `{meta, response}` envelope.
    Envelope(Response),
    /// Debug-only plain-text failure report; bypasses the envelope.
    DebugTrace(String),
}

impl RestHandler {
    /// Run one request through the state machine and render the result.
    pub async fn handle(&self, request: Request) -> WireResponse {
        let request_id = request.id();
        let span = tracing::info_span!(
            "dispatch",
            handler = %self.name,
            request_id = %request_id,
            method = %request.method(),
        );

        async move {
            let resolution = self.resolve(request).await;
            self.render_or_fallback(request_id, resolution)
        }
        .instrument(span)
        .await
    }

    /// Render a declared error for a request that never entered dispatch
    /// (e.g. the transport could not read its body).
    pub fn reject(&self, request: &Request, error: ApiError) -> WireResponse {
        tracing::debug!(request_id = %request.id(), status = error.status(), "request rejected by transport");
        self.render_or_fallback(request.id(), Resolution::Envelope(error.into_response()))
    }

    /// Dispatch and unify every outcome into one [`Resolution`].
    pub async fn resolve(&self, request: Request) -> Resolution {
        let result = AssertUnwindSafe(self.dispatch(request)).catch_unwind().await;
        let (err, panic_trace) = match result {
            Ok(Ok(response)) => {
                tracing::trace!(state = ?DispatchState::Resolved, status = response.status());
                return Resolution::Envelope(response);
            }
            Ok(Err(err)) => (err, None),
            Err(payload) => (
                anyhow::anyhow!("operation panicked: {}", panic_message(payload.as_ref())),
                panic_report::take(),
            ),
        };
        self.unify(err, panic_trace)
    }

    async fn dispatch(&self, mut request: Request) -> anyhow::Result<Response> {
        tracing::trace!(state = ?DispatchState::Routing);
        let method = self.method_check(request.method())?;

        tracing::trace!(state = ?DispatchState::MethodChecked);
        self.authenticate(&mut request).await?;

        tracing::trace!(state = ?DispatchState::Authenticated);
        let Some(operation) = self.operations.get(&method) else {
            return Err(ApiError::immediate(Response::not_implemented()).into());
        };
        self.decode_payload(&mut request)?;

        tracing::trace!(state = ?DispatchState::Executing);
        let outcome = operation(request).await?;
        Ok(outcome.into_response())
    }

    /// Validate the method against the allowed list.
    ///
    /// `OPTIONS` always short-circuits with the `Allow` header; a method not
    /// in the list short-circuits with `405` and the same header.
    pub fn method_check(&self, raw: &str) -> Result<Method, ApiError> {
        let method = Method::parse(raw);

        if method == Method::Options {
            let response = Response::ok().with_header("Allow", self.allow_header());
            return Err(ApiError::immediate(response));
        }

        if !self.allowed.contains(&method) {
            let response = Response::method_not_allowed().with_header("Allow", self.allow_header());
            return Err(ApiError::immediate(response));
        }

        Ok(method)
    }

    async fn authenticate(&self, request: &mut Request) -> Result<(), ApiError> {
        match self.authentication.is_authenticated(request).await {
            (true, Some(identity)) => {
                request.bind_identity(identity);
                Ok(())
            }
            // Success without an identity leaves nothing to bind: refuse.
            (true, None) | (false, _) => Err(ApiError::unauthorized()),
        }
    }

    fn decode_payload(&self, request: &mut Request) -> Result<(), ApiError> {
        if request.body().is_empty() {
            return Ok(());
        }
        let malformed = || ApiError::bad_request().with_message("Malformed request body");
        let text = std::str::from_utf8(request.body()).map_err(|_| malformed())?;
        let payload = self.serializer.decode(text).map_err(|e| {
            tracing::debug!(error = %e, "request body did not decode");
            malformed()
        })?;
        request.set_payload(Some(payload));
        Ok(())
    }

    /// `panic_trace` is the hook's report when the failure was a panic.
    fn unify(&self, err: anyhow::Error, panic_trace: Option<String>) -> Resolution {
        if let Some(declared) = err.downcast_ref::<ApiError>() {
            if declared.class() != ErrorClass::Application {
                tracing::debug!(status = declared.status(), "declared error: {declared}");
                return Resolution::Envelope(declared.to_response());
            }
        }

        tracing::error!(error = ?err, "request failed");
        if self.debug {
            Resolution::DebugTrace(debug_report(&err, panic_trace))
        } else {
            Resolution::Envelope(ApiError::application().into_response())
        }
    }

    fn render_or_fallback(&self, request_id: RequestId, resolution: Resolution) -> WireResponse {
        match self.render(request_id, resolution) {
            Ok(wire) => {
                tracing::debug!(status = wire.status, "response rendered");
                wire
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to render response");
                let mut headers = Headers::new();
                headers.set(REQUEST_ID_HEADER, request_id.to_string());
                WireResponse {
                    status: HTTP_STATUS_INTERNAL_SERVER_ERROR,
                    reason: "Internal Server Error".to_string(),
                    headers,
                    body: Vec::new(),
                }
            }
        }
    }

    fn render(&self, request_id: RequestId, resolution: Resolution) -> Result<WireResponse, WriteError> {
        let mut writer = ResponseWriter::new(self.serializer.clone());
        match resolution {
            Resolution::Envelope(response) => {
                writer.replace_headers(response.headers().clone())?;
                writer.set_status(response.status(), Some(response.reason()))?;
                if !body_forbidden(response.status()) {
                    writer.write(Envelope::from_response(&response).to_value())?;
                }
            }
            Resolution::DebugTrace(trace) => {
                writer.set_status(HTTP_STATUS_INTERNAL_SERVER_ERROR, None)?;
                writer.set_header("Content-Type", "text/plain")?;
                writer.write(trace)?;
            }
        }
        writer.set_header(REQUEST_ID_HEADER, request_id.to_string())?;
        writer.finish()
    }
}

/// Status codes that must not carry a body.
fn body_forbidden(status: u16) -> bool {
    (100..200).contains(&status) || status == 204 || status == 304
}

/// Plain-text failure report: error chain plus a stack trace.
///
/// Prefers the panic site, then the backtrace the error captured at its
/// origin; without either, the trace is taken here.
fn debug_report(err: &anyhow::Error, panic_trace: Option<String>) -> String {
    let mut report = format!("{err:?}\n");
    match panic_trace {
        Some(trace) => {
            report.push('\n');
            report.push_str(&trace);
        }
        None if err.backtrace().status() != BacktraceStatus::Captured => {
            report.push_str("\nStack backtrace:\n");
            report.push_str(&Backtrace::force_capture().to_string());
        }
        None => {}
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};

    use resto_auth::{AuthBackend, Authentication};
    use resto_core::{CamelCaseJsonSerializer, Identity, Role};

    use super::*;
    use crate::operation::Outcome;

    /// Backend that counts calls and grants or denies everything.
    struct Counting {
        calls: Arc<AtomicUsize>,
        grant: bool,
    }

    #[async_trait]
    impl AuthBackend for Counting {
        async fn is_authenticated(&self, _request: &Request) -> Option<Identity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.grant
                .then(|| Identity::new("alice", vec![Role::new("admin")]))
        }
    }

    fn gate(grant: bool) -> (Authentication, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Authentication::with_backend(Counting {
            calls: calls.clone(),
            grant,
        });
        (gate, calls)
    }

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn envelope(wire: &WireResponse) -> Value {
        serde_json::from_slice(&wire.body).expect("envelope is json")
    }

    #[tokio::test]
    async fn mapping_result_is_enveloped_for_every_allowed_method() {
        let methods = ["get", "post", "put", "patch", "delete", "head"];
        let mut builder = RestHandler::builder("things").allow_methods(methods);
        for m in methods {
            builder = builder.operation(Method::parse(m), |_req| async {
                Ok(Outcome::from(mapping(json!({"k": "v"}))))
            });
        }
        let handler = builder.build();

        for m in methods {
            let wire = handler.handle(Request::new(m.to_uppercase(), "/things")).await;
            assert_eq!(wire.status, 200, "{m}");
            assert_eq!(
                envelope(&wire),
                json!({"meta": {"status": 200}, "response": {"k": "v"}})
            );
            assert_eq!(
                wire.headers.get("Content-Type"),
                Some("application/json; charset=UTF-8")
            );
        }
    }

    #[tokio::test]
    async fn disallowed_method_is_405_and_never_authenticates() {
        let (authentication, calls) = gate(false);
        let handler = RestHandler::builder("things")
            .allow_methods(["get", "post"])
            .authentication(authentication)
            .build();

        let wire = handler.handle(Request::new("DELETE", "/things")).await;

        assert_eq!(wire.status, 405);
        assert_eq!(wire.headers.get("Allow"), Some("GET,POST"));
        assert_eq!(
            envelope(&wire),
            json!({"meta": {"status": 405, "error": "Method Not Allowed"}, "response": null})
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn options_short_circuits_before_auth_and_operations() {
        let (authentication, calls) = gate(true);
        let invoked = Arc::new(AtomicUsize::new(0));
        let seen = invoked.clone();
        let handler = RestHandler::builder("things")
            .allow_methods(["get", "options"])
            .authentication(authentication)
            .options(move |_req| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(Outcome::NoContent) }
            })
            .build();

        let wire = handler.handle(Request::new("OPTIONS", "/things")).await;

        assert_eq!(wire.status, 200);
        assert_eq!(wire.headers.get("allow"), Some("GET,OPTIONS"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_authentication_is_401_and_skips_the_operation() {
        let (authentication, calls) = gate(false);
        let invoked = Arc::new(AtomicUsize::new(0));
        let seen = invoked.clone();
        let handler = RestHandler::builder("things")
            .allow(Method::Get)
            .authentication(authentication)
            .get(move |_req| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(Outcome::NoContent) }
            })
            .build();

        let wire = handler.handle(Request::new("GET", "/things")).await;

        assert_eq!(wire.status, 401);
        assert_eq!(
            envelope(&wire),
            json!({"meta": {"status": 401, "error": "Unauthorized"}, "response": null})
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identity_is_bound_before_the_operation_runs() {
        let (authentication, _) = gate(true);
        let handler = RestHandler::builder("me")
            .allow(Method::Get)
            .authentication(authentication)
            .get(|req| async move {
                let identity = req.identity().expect("identity bound");
                Ok(Outcome::from(mapping(json!({"subject": identity.subject()}))))
            })
            .build();

        let wire = handler.handle(Request::new("GET", "/me")).await;
        assert_eq!(envelope(&wire)["response"], json!({"subject": "alice"}));
    }

    fn failing(debug: bool) -> RestHandler {
        RestHandler::builder("boom")
            .allow(Method::Get)
            .debug(debug)
            .get(|_req| async {
                Err::<Outcome, anyhow::Error>(anyhow::anyhow!("database exploded"))
            })
            .build()
    }

    #[tokio::test]
    async fn undeclared_failure_is_generic_500_in_production() {
        let wire = failing(false).handle(Request::new("GET", "/boom")).await;

        assert_eq!(wire.status, 500);
        assert_eq!(
            envelope(&wire),
            json!({"meta": {"status": 500, "error": "Internal Server Error"}, "response": null})
        );
        assert!(!wire.body_text().contains("database exploded"));
    }

    #[tokio::test]
    async fn undeclared_failure_is_plain_text_trace_in_debug() {
        let wire = failing(true).handle(Request::new("GET", "/boom")).await;

        assert_eq!(wire.status, 500);
        assert_eq!(wire.reason, "Internal Server Error");
        assert_eq!(wire.headers.get("Content-Type"), Some("text/plain"));
        assert!(wire.body_text().contains("database exploded"));
        assert!(wire.body_text().contains("Stack backtrace:"));
        assert!(serde_json::from_slice::<Value>(&wire.body).is_err());
    }

    #[tokio::test]
    async fn declared_application_error_takes_the_debug_path_too() {
        let handler = RestHandler::builder("boom")
            .allow(Method::Get)
            .debug(true)
            .get(|_req| async { Err::<Outcome, anyhow::Error>(ApiError::application().with_message("ledger offline").into()) })
            .build();

        let wire = handler.handle(Request::new("GET", "/boom")).await;
        assert_eq!(wire.headers.get("Content-Type"), Some("text/plain"));
        assert!(wire.body_text().contains("application error"));
    }

    #[tokio::test]
    async fn declared_application_error_is_generic_in_production() {
        let handler = RestHandler::builder("boom")
            .allow(Method::Get)
            .get(|_req| async { Err::<Outcome, anyhow::Error>(ApiError::application().with_message("ledger offline").into()) })
            .build();

        let wire = handler.handle(Request::new("GET", "/boom")).await;
        assert_eq!(
            envelope(&wire),
            json!({"meta": {"status": 500, "error": "Internal Server Error"}, "response": null})
        );
    }

    #[tokio::test]
    async fn panicking_operation_still_gets_one_response() {
        let handler = RestHandler::builder("panic")
            .allow(Method::Get)
            .get(|_req| async {
                if true {
                    panic!("unexpected state");
                }
                Ok(Outcome::NoContent)
            })
            .build();

        let wire = handler.handle(Request::new("GET", "/panic")).await;
        assert_eq!(wire.status, 500);
        assert_eq!(envelope(&wire)["meta"]["error"], json!("Internal Server Error"));
    }

    #[tokio::test]
    async fn panic_in_debug_reports_site_and_backtrace() {
        let handler = RestHandler::builder("panic")
            .allow(Method::Get)
            .debug(true)
            .get(|_req| async {
                if true {
                    panic!("unexpected state");
                }
                Ok(Outcome::NoContent)
            })
            .build();

        let wire = handler.handle(Request::new("GET", "/panic")).await;
        let body = wire.body_text();

        assert_eq!(wire.status, 500);
        assert_eq!(wire.headers.get("Content-Type"), Some("text/plain"));
        assert!(body.contains("operation panicked: unexpected state"), "{body}");
        assert!(body.contains("panicked at"), "{body}");
        assert!(body.contains("dispatch.rs"), "{body}");
        assert!(body.contains("Stack backtrace:"), "{body}");
    }

    #[tokio::test]
    async fn declared_client_error_from_operation_is_enveloped() {
        let handler = RestHandler::builder("signup")
            .allow(Method::Post)
            .post(|req| async move {
                req.field("email")?;
                Ok::<_, anyhow::Error>(Outcome::NoContent)
            })
            .build();

        let wire = handler
            .handle(Request::new("POST", "/signup").with_body(r#"{"name": "Ann"}"#))
            .await;

        assert_eq!(wire.status, 422);
        assert_eq!(
            envelope(&wire),
            json!({
                "meta": {
                    "status": 422,
                    "error": "Unprocessable Entity",
                    "message": "Missing `email` param",
                },
                "response": {"message": "Missing `email` param"},
            })
        );
    }

    #[tokio::test]
    async fn immediate_response_headers_are_copied() {
        let handler = RestHandler::builder("redirect")
            .allow(Method::Get)
            .get(|_req| async {
                let response = Response::new(302)?.with_header("Location", "/elsewhere");
                Err::<Outcome, anyhow::Error>(ApiError::immediate(response).into())
            })
            .build();

        let wire = handler.handle(Request::new("GET", "/redirect")).await;
        assert_eq!((wire.status, wire.reason.as_str()), (302, "Found"));
        assert_eq!(wire.headers.get("location"), Some("/elsewhere"));
        assert_eq!(envelope(&wire), json!({"meta": {"status": 302}, "response": null}));
    }

    #[tokio::test]
    async fn allowed_method_without_operation_is_501() {
        let handler = RestHandler::builder("dav")
            .allow_methods(["get", "propfind"])
            .build();

        let wire = handler.handle(Request::new("PROPFIND", "/dav")).await;
        assert_eq!(wire.status, 501);
        assert_eq!(envelope(&wire)["meta"]["error"], json!("Not Implemented"));
    }

    #[tokio::test]
    async fn allowed_method_with_default_stub_is_405_without_allow() {
        let handler = RestHandler::builder("things").allow(Method::Put).build();

        let wire = handler.handle(Request::new("PUT", "/things")).await;
        assert_eq!(wire.status, 405);
        assert!(wire.headers.get("Allow").is_none());
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let handler = RestHandler::builder("things")
            .allow(Method::Delete)
            .delete(|_req| async { Ok(Outcome::NoContent) })
            .build();

        let wire = handler.handle(Request::new("DELETE", "/things/1")).await;
        assert_eq!((wire.status, wire.reason.as_str()), (204, "No Content"));
        assert!(wire.body.is_empty());
        assert!(wire.headers.get("Content-Type").is_none());
    }

    #[tokio::test]
    async fn camel_case_serializer_applies_in_both_directions() {
        let handler = RestHandler::builder("profile")
            .allow(Method::Post)
            .serializer(Arc::new(CamelCaseJsonSerializer::new()))
            .post(|req| async move {
                let first_name = req.field("first_name")?.clone();
                Ok::<_, anyhow::Error>(Outcome::from(mapping(json!({"first_name": first_name, "user_id": 7}))))
            })
            .build();

        let wire = handler
            .handle(Request::new("POST", "/profile").with_body(r#"{"firstName": "Ann"}"#))
            .await;

        assert_eq!(
            wire.body_text(),
            r#"{"meta":{"status":200},"response":{"firstName":"Ann","userId":7}}"#
        );
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let handler = RestHandler::builder("things")
            .allow(Method::Post)
            .post(|_req| async { Ok(Outcome::NoContent) })
            .build();

        let wire = handler
            .handle(Request::new("POST", "/things").with_body("{oops"))
            .await;

        assert_eq!(wire.status, 400);
        assert_eq!(envelope(&wire)["meta"]["message"], json!("Malformed request body"));
    }

    #[tokio::test]
    async fn custom_reason_phrase_survives_rendering() {
        let handler = RestHandler::builder("odd")
            .allow(Method::Get)
            .get(|_req| async { Ok(Outcome::from(Response::with_reason(299, "Mostly Fine"))) })
            .build();

        let wire = handler.handle(Request::new("GET", "/odd")).await;
        assert_eq!((wire.status, wire.reason.as_str()), (299, "Mostly Fine"));
    }

    #[tokio::test]
    async fn every_response_carries_the_request_id() {
        let handler = failing(true);
        let request = Request::new("GET", "/boom");
        let id = request.id().to_string();

        let wire = handler.handle(request).await;
        assert_eq!(wire.headers.get(REQUEST_ID_HEADER), Some(id.as_str()));

        let request = Request::new("TRACE", "/boom");
        let id = request.id().to_string();
        let wire = handler.handle(request).await;
        assert_eq!(wire.headers.get(REQUEST_ID_HEADER), Some(id.as_str()));
    }

    #[test]
    fn method_check_lower_cases_input() {
        let handler = RestHandler::builder("things").allow(Method::Get).build();
        assert_eq!(handler.method_check("GeT").unwrap(), Method::Get);
        assert_eq!(handler.method_check("post").unwrap_err().status(), 405);
    }

    #[test]
    fn reject_renders_declared_error() {
        let handler = RestHandler::builder("things").build();
        let request = Request::new("POST", "/things");
        let wire = handler.reject(&request, ApiError::bad_request().with_message("Request body too large"));

        assert_eq!(wire.status, 400);
        assert_eq!(envelope(&wire)["meta"]["message"], json!("Request body too large"));
    }
}
