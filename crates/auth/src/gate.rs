use std::fmt;
use std::sync::Arc;

use resto_core::{Identity, Request};

use crate::backend::{AllowAll, AuthBackend};

/// Authentication gate owned by one handler registration.
///
/// Each handler gets its own gate; there is no process-wide default instance.
#[derive(Clone)]
pub struct Authentication {
    backend: Arc<dyn AuthBackend>,
}

impl Authentication {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self { backend }
    }

    pub fn with_backend<B: AuthBackend + 'static>(backend: B) -> Self {
        Self::new(Arc::new(backend))
    }

    /// Ask the backend about `request`.
    ///
    /// The flag is `true` exactly when an identity was returned.
    pub async fn is_authenticated(&self, request: &Request) -> (bool, Option<Identity>) {
        let identity = self.backend.is_authenticated(request).await;
        (identity.is_some(), identity)
    }
}

impl Default for Authentication {
    fn default() -> Self {
        Self::with_backend(AllowAll)
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication").finish_non_exhaustive()
    }
}
