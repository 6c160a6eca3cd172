//! In-memory user directory behind `/users/:user_id`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use resto_core::{ApiError, CamelCaseJsonSerializer, Request, Response};

use crate::handler::RestHandler;
use crate::method::Method;
use crate::operation::{OperationResult, Outcome};

use super::Wiring;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl UserDirectory {
    pub fn get(&self, user_id: &str) -> anyhow::Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| anyhow::anyhow!("user directory lock poisoned"))?;
        Ok(users.get(user_id).cloned())
    }

    /// Insert or replace. Returns the stored user and whether it was new.
    pub fn upsert(&self, mut user: User) -> anyhow::Result<(User, bool)> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow::anyhow!("user directory lock poisoned"))?;
        let created = match users.get(&user.user_id) {
            Some(existing) => {
                user.created_at = existing.created_at;
                false
            }
            None => true,
        };
        users.insert(user.user_id.clone(), user.clone());
        Ok((user, created))
    }

    pub fn remove(&self, user_id: &str) -> anyhow::Result<Option<User>> {
        let mut users = self
            .users
            .write()
            .map_err(|_| anyhow::anyhow!("user directory lock poisoned"))?;
        Ok(users.remove(user_id))
    }
}

pub fn handler(directory: Arc<UserDirectory>, wiring: &Wiring) -> RestHandler {
    let (for_get, for_put, for_delete) = (directory.clone(), directory.clone(), directory);

    RestHandler::builder("users")
        .allow(Method::Get)
        .allow(Method::Put)
        .allow(Method::Delete)
        .authentication(wiring.authentication.clone())
        .serializer(Arc::new(CamelCaseJsonSerializer::new()))
        .debug(wiring.debug)
        .get(move |req| get_user(for_get.clone(), req))
        .put(move |req| put_user(for_put.clone(), req))
        .delete(move |req| delete_user(for_delete.clone(), req))
        .build()
}

fn no_such_user(user_id: &str) -> ApiError {
    ApiError::not_found().with_message(format!("No user `{user_id}`"))
}

async fn get_user(directory: Arc<UserDirectory>, req: Request) -> OperationResult {
    let user_id = req.param("user_id")?;
    let user = directory.get(user_id)?.ok_or_else(|| no_such_user(user_id))?;
    Outcome::body(&user)
}

async fn put_user(directory: Arc<UserDirectory>, req: Request) -> OperationResult {
    let user_id = req.param("user_id")?.to_string();
    let email = req
        .field("email")?
        .as_str()
        .filter(|e| e.contains('@'))
        .ok_or_else(|| ApiError::unprocessable_entity().with_message("`email` must be an email address"))?
        .to_string();
    let display_name = match req.field("display_name") {
        Ok(Value::String(name)) => Some(name.clone()),
        Ok(_) => {
            return Err(ApiError::unprocessable_entity()
                .with_message("`display_name` must be a string")
                .into());
        }
        Err(_) => None,
    };
    let updated_by = req
        .identity()
        .map(|identity| identity.subject().to_string())
        .ok_or_else(ApiError::unauthorized)?;

    let now = Utc::now();
    let (user, created) = directory.upsert(User {
        user_id,
        email,
        display_name,
        updated_by,
        created_at: now,
        updated_at: now,
    })?;

    let body = serde_json::to_value(&user)?;
    if created {
        Ok(Outcome::Response(
            Response::created()
                .with_header("Location", format!("/users/{}", user.user_id))
                .with_body(body),
        ))
    } else {
        Ok(Outcome::Response(Response::ok().with_body(body)))
    }
}

async fn delete_user(directory: Arc<UserDirectory>, req: Request) -> OperationResult {
    let user_id = req.param("user_id")?;
    directory.remove(user_id)?.ok_or_else(|| no_such_user(user_id))?;
    Ok(Outcome::NoContent)
}
