//! Session lookup and role checks for the HTTP surface.
//!
//! Identity proofing is delegated to the hosted provider; this module only resolves an
//! already-issued session (bearer header or `auth-token` cookie) to a [`Principal`].

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tower_sessions::session::Id;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use crate::accounts::{Role, UserDirectory, UserId};
use crate::config::AuthConfig;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "auth-token";
const MOCK_TOKEN_PREFIX: &str = "dev-token-";
const SESSION_USER_KEY: &str = "user_id";

/// Authenticated caller resolved from a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role.is_admin())
    }

    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(|role| role.is_elevated())
    }

    pub fn owns(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Owner-or-admin rule used by the per-user read endpoints.
    pub fn can_access(&self, user_id: &UserId) -> bool {
        self.owns(user_id) || self.is_admin()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session backend unavailable: {0}")]
    Backend(String),
}

impl From<tower_sessions::session::Error> for AuthError {
    fn from(value: tower_sessions::session::Error) -> Self {
        Self::Backend(value.to_string())
    }
}

/// Session store backed by `tower-sessions`, resolved against the account directory.
///
/// The same session id works as a bearer token and as the `auth-token` cookie value.
pub struct SessionAuthenticator {
    directory: Arc<dyn UserDirectory>,
    store: MemoryStore,
    config: AuthConfig,
}

impl SessionAuthenticator {
    pub fn new(directory: Arc<dyn UserDirectory>, config: AuthConfig) -> Self {
        Self {
            directory,
            store: MemoryStore::default(),
            config,
        }
    }

    /// Layer that loads the cookie session into request extensions.
    pub fn session_layer(&self) -> SessionManagerLayer<MemoryStore> {
        SessionManagerLayer::new(self.store.clone())
            .with_name(SESSION_COOKIE)
            .with_http_only(true)
            .with_secure(self.config.secure_cookies)
    }

    /// Persist a session for `user_id` and return its token.
    pub async fn open_session(&self, user_id: &UserId) -> Result<String, AuthError> {
        let session = Session::new(None, Arc::new(self.store.clone()), None);
        session.insert(SESSION_USER_KEY, user_id).await?;
        session.save().await?;
        session
            .id()
            .map(|id| id.to_string())
            .ok_or_else(|| AuthError::Backend("session id was not assigned".to_string()))
    }

    async fn bearer_user(&self, token: &str) -> Result<Option<UserId>, AuthError> {
        if self.config.allow_mock_auth {
            if let Some(raw) = token.strip_prefix(MOCK_TOKEN_PREFIX) {
                if !raw.is_empty() {
                    return Ok(Some(UserId::new(raw)));
                }
            }
        }

        let Ok(id) = token.parse::<Id>() else {
            return Ok(None);
        };
        let session = Session::new(Some(id), Arc::new(self.store.clone()), None);
        Ok(session.get::<UserId>(SESSION_USER_KEY).await?)
    }

    /// Resolve the caller from the bearer header, falling back to the cookie session.
    pub async fn authenticate(&self, parts: &Parts) -> Result<Option<Principal>, AuthError> {
        let user_id = match parts.headers.typed_get::<Authorization<Bearer>>() {
            Some(Authorization(bearer)) => self.bearer_user(bearer.token().trim()).await?,
            None => match parts.extensions.get::<Session>() {
                Some(session) => session.get::<UserId>(SESSION_USER_KEY).await?,
                None => None,
            },
        };
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let user = self
            .directory
            .user(&user_id)
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        Ok(user.map(|user| Principal::new(user.id, user.roles)))
    }
}

/// Router state pairing a workflow service with the session authenticator.
pub struct RouteState<S> {
    pub service: Arc<S>,
    pub auth: Arc<SessionAuthenticator>,
}

impl<S> RouteState<S> {
    pub fn new(service: Arc<S>, auth: Arc<SessionAuthenticator>) -> Self {
        Self { service, auth }
    }
}

impl<S> Clone for RouteState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth: Arc::clone(&self.auth),
        }
    }
}

/// Extractor for handlers that need a signed-in caller; rejects with `401` otherwise.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Principal);

#[async_trait]
impl<S> FromRequestParts<RouteState<S>> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &RouteState<S>,
    ) -> Result<Self, Self::Rejection> {
        state
            .auth
            .authenticate(parts)
            .await?
            .map(Self)
            .ok_or(ApiError::Authentication)
    }
}
