//! Operation table: HTTP method -> handler-supplied operation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};

use resto_core::{Request, Response};

use crate::method::Method;

/// What an operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Used as-is.
    Response(Response),
    /// Wrapped in a `200 OK` response.
    Body(Map<String, Value>),
    /// Becomes `204 No Content`.
    NoContent,
}

impl Outcome {
    /// Serialize `value` into a mapping body.
    ///
    /// Anything that does not serialize to a JSON object is an error.
    pub fn body<T: Serialize>(value: &T) -> anyhow::Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self::Body(map)),
            other => anyhow::bail!("operation result is not a mapping: {other}"),
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Self::Response(response) => response,
            Self::Body(map) => Response::ok().with_body(Value::Object(map)),
            Self::NoContent => Response::no_content(),
        }
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Map<String, Value>> for Outcome {
    fn from(map: Map<String, Value>) -> Self {
        Self::Body(map)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Self::NoContent
    }
}

/// Operations fail with any error; declared ones are `resto_core::ApiError`.
pub type OperationResult = anyhow::Result<Outcome>;

/// A registered operation. Receives the request (with bound identity and
/// decoded payload) and resolves to an [`OperationResult`].
pub type Operation = Arc<dyn Fn(Request) -> BoxFuture<'static, OperationResult> + Send + Sync>;

/// Per-handler mapping from method to operation.
///
/// [`OperationTable::new`] starts with a stub for every standard method that
/// answers `405 Method Not Allowed`; registering an operation replaces the
/// stub. A method with no entry at all resolves to `501 Not Implemented`.
#[derive(Clone)]
pub struct OperationTable {
    operations: HashMap<Method, Operation>,
}

impl OperationTable {
    pub fn new() -> Self {
        let operations = Method::STANDARD
            .into_iter()
            .map(|method| (method, method_not_allowed_stub()))
            .collect();
        Self { operations }
    }

    pub fn insert<F, Fut>(&mut self, method: Method, operation: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.operations
            .insert(method, Arc::new(move |request| operation(request).boxed()));
    }

    pub fn get(&self, method: &Method) -> Option<&Operation> {
        self.operations.get(method)
    }
}

impl Default for OperationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut methods: Vec<_> = self.operations.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("OperationTable").field("methods", &methods).finish()
    }
}

fn method_not_allowed_stub() -> Operation {
    Arc::new(|_request: Request| {
        async { Ok::<_, anyhow::Error>(Outcome::Response(Response::method_not_allowed())) }.boxed()
    })
}
