//! Bearer-token backend backed by a static token table.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use resto_core::{Identity, Request, Role};

use crate::backend::AuthBackend;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenTableError {
    #[error("token entry '{0}' is not of the form token=subject[:role,...]")]
    MalformedEntry(String),

    #[error("token entry '{0}' has an empty token or subject")]
    EmptyField(String),
}

#[derive(Debug, Clone)]
struct Grant {
    subject: String,
    roles: Vec<Role>,
}

/// Authenticates `Authorization: Bearer <token>` against a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenBackend {
    grants: HashMap<String, Grant>,
}

impl StaticTokenBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, subject: impl Into<String>, roles: Vec<Role>) -> Self {
        self.grants.insert(
            token.into(),
            Grant {
                subject: subject.into(),
                roles,
            },
        );
        self
    }

    /// Parse `token=subject[:role,role...]` entries separated by `;`.
    pub fn parse(table: &str) -> Result<Self, TokenTableError> {
        let mut backend = Self::new();
        for entry in table.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, grant) = entry
                .split_once('=')
                .ok_or_else(|| TokenTableError::MalformedEntry(entry.to_string()))?;
            let (subject, roles) = match grant.split_once(':') {
                Some((subject, roles)) => (subject, roles),
                None => (grant, ""),
            };
            let (token, subject) = (token.trim(), subject.trim());
            if token.is_empty() || subject.is_empty() {
                return Err(TokenTableError::EmptyField(entry.to_string()));
            }
            let roles = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| Role::new(r.to_string()))
                .collect();
            backend = backend.with_token(token, subject, roles);
        }
        Ok(backend)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[async_trait]
impl AuthBackend for StaticTokenBackend {
    async fn is_authenticated(&self, request: &Request) -> Option<Identity> {
        let Some(token) = extract_bearer(request) else {
            tracing::debug!(request_id = %request.id(), "no bearer token presented");
            return None;
        };
        match self.grants.get(token) {
            Some(grant) => Some(Identity::new(grant.subject.clone(), grant.roles.clone())),
            None => {
                tracing::warn!(request_id = %request.id(), "unknown bearer token");
                None
            }
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header, if well formed.
pub fn extract_bearer(request: &Request) -> Option<&str> {
    let header = request.headers().get("Authorization")?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: &str) -> Request {
        Request::new("GET", "/").with_header("Authorization", value)
    }

    #[test]
    fn extract_bearer_cases() {
        assert_eq!(extract_bearer(&request_with_auth("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer(&request_with_auth("Bearer   abc  ")), Some("abc"));
        assert_eq!(extract_bearer(&request_with_auth("Bearer ")), None);
        assert_eq!(extract_bearer(&request_with_auth("Basic abc")), None);
        assert_eq!(extract_bearer(&Request::new("GET", "/")), None);
    }

    #[test]
    fn parse_table() {
        let backend = StaticTokenBackend::parse("t1=alice:admin,ops; t2=bob ;").unwrap();
        assert_eq!(backend.len(), 2);
        assert_eq!(backend.grants["t1"].subject, "alice");
        assert_eq!(backend.grants["t1"].roles, vec![Role::new("admin"), Role::new("ops")]);
        assert!(backend.grants["t2"].roles.is_empty());
    }

    #[test]
    fn parse_rejects_bad_entries() {
        assert_eq!(
            StaticTokenBackend::parse("nonsense").unwrap_err(),
            TokenTableError::MalformedEntry("nonsense".to_string())
        );
        assert_eq!(
            StaticTokenBackend::parse("=alice").unwrap_err(),
            TokenTableError::EmptyField("=alice".to_string())
        );
    }

    #[tokio::test]
    async fn known_token_authenticates() {
        let backend = StaticTokenBackend::new().with_token("secret", "alice", vec![Role::new("admin")]);

        let identity = backend
            .is_authenticated(&request_with_auth("Bearer secret"))
            .await
            .unwrap();
        assert_eq!(identity.subject(), "alice");
        assert!(identity.has_role("admin"));
    }

    #[tokio::test]
    async fn unknown_or_missing_token_is_rejected() {
        let backend = StaticTokenBackend::new().with_token("secret", "alice", vec![]);

        assert!(backend.is_authenticated(&request_with_auth("Bearer nope")).await.is_none());
        assert!(backend.is_authenticated(&Request::new("GET", "/")).await.is_none());
    }
}
