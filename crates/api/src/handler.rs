//! Handler registration: allowed methods, operations, gate and serializer.

use std::future::Future;
use std::sync::Arc;

use resto_auth::Authentication;
use resto_core::{JsonSerializer, Request, Serializer};

use crate::method::Method;
use crate::operation::{OperationResult, OperationTable};

/// One registered REST handler.
///
/// Everything here is fixed at registration and read-only afterwards, so a
/// handler can be shared across concurrent requests behind an `Arc`.
#[derive(Debug)]
pub struct RestHandler {
    pub(crate) name: String,
    pub(crate) allowed: Vec<Method>,
    pub(crate) operations: OperationTable,
    pub(crate) authentication: Authentication,
    pub(crate) serializer: Arc<dyn Serializer>,
    pub(crate) debug: bool,
}

impl RestHandler {
    pub fn builder(name: impl Into<String>) -> RestHandlerBuilder {
        RestHandlerBuilder {
            name: name.into(),
            allowed: Vec::new(),
            operations: OperationTable::new(),
            authentication: None,
            serializer: None,
            debug: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed
    }

    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Value of the `Allow` header: upper-cased allowed methods, comma-joined.
    pub fn allow_header(&self) -> String {
        self.allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub struct RestHandlerBuilder {
    name: String,
    allowed: Vec<Method>,
    operations: OperationTable,
    authentication: Option<Authentication>,
    serializer: Option<Arc<dyn Serializer>>,
    debug: bool,
}

macro_rules! method_setter {
    ($fn_name:ident, $method:expr) => {
        pub fn $fn_name<F, Fut>(self, operation: F) -> Self
        where
            F: Fn(Request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = OperationResult> + Send + 'static,
        {
            self.operation($method, operation)
        }
    };
}

impl RestHandlerBuilder {
    /// Allow `method`. Duplicates are ignored; order is kept for `Allow`.
    pub fn allow(mut self, method: Method) -> Self {
        if !self.allowed.contains(&method) {
            self.allowed.push(method);
        }
        self
    }

    /// Allow methods given by name, in any case.
    pub fn allow_methods<I, S>(self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        methods
            .into_iter()
            .fold(self, |builder, m| builder.allow(Method::parse(m.as_ref())))
    }

    pub fn operation<F, Fut>(mut self, method: Method, operation: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.operations.insert(method, operation);
        self
    }

    method_setter!(head, Method::Head);
    method_setter!(options, Method::Options);
    method_setter!(get, Method::Get);
    method_setter!(post, Method::Post);
    method_setter!(put, Method::Put);
    method_setter!(patch, Method::Patch);
    method_setter!(delete, Method::Delete);

    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Debug handlers answer failures with a plain-text stack trace and
    /// install a panic hook to locate panics. Never enable in a deployed
    /// configuration.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Unset gate/serializer get fresh defaults owned by this handler
    /// (`AllowAll`, plain JSON).
    pub fn build(self) -> RestHandler {
        if self.debug {
            crate::panic_report::install();
        }
        RestHandler {
            name: self.name,
            allowed: self.allowed,
            operations: self.operations,
            authentication: self.authentication.unwrap_or_default(),
            serializer: self
                .serializer
                .unwrap_or_else(|| Arc::new(JsonSerializer::new())),
            debug: self.debug,
        }
    }
}
