use async_trait::async_trait;

use resto_core::{Identity, Request};

/// Credential check capability.
///
/// Returns the identity behind the request, or `None` when the request does
/// not authenticate. Backends may await network I/O; the dispatcher waits
/// for the answer before moving on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn is_authenticated(&self, request: &Request) -> Option<Identity>;
}

/// Backend that authenticates every request as [`Identity::anonymous`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AuthBackend for AllowAll {
    async fn is_authenticated(&self, _request: &Request) -> Option<Identity> {
        Some(Identity::anonymous())
    }
}
