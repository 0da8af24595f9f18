//! Server-side session state carried across redirects.
//!
//! A `hackathon_session` cookie identifies the session. Flash messages queued
//! while handling a form submission are shown once by the next rendered view,
//! and one-shot values (such as the media snippet) are cleared as soon as they
//! are read. Sessions left untouched for longer than the configured max age
//! are dropped by a background cleanup task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, Request};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "hackathon_session";

/// Severity of a flash message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A human-readable status message attached to the next rendered view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    #[schema(example = "Display data saved.")]
    pub message: String,
}

struct SessionData {
    flashes: Vec<Flash>,
    values: HashMap<String, String>,
    last_seen: Instant,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            flashes: Vec::new(),
            values: HashMap::new(),
            last_seen: Instant::now(),
        }
    }
}

impl SessionData {
    fn is_empty(&self) -> bool {
        self.flashes.is_empty() && self.values.is_empty()
    }

    fn touch(&mut self) -> &mut Self {
        self.last_seen = Instant::now();
        self
    }
}

/// In-process session storage shared by all requests.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<Uuid, SessionData>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flash(&self, id: Uuid, level: FlashLevel, message: impl Into<String>) {
        self.inner.entry(id).or_default().touch().flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Drain pending flash messages in the order they were queued.
    pub fn take_flashes(&self, id: Uuid) -> Vec<Flash> {
        let flashes = match self.inner.get_mut(&id) {
            Some(mut data) => std::mem::take(&mut data.touch().flashes),
            None => return Vec::new(),
        };
        self.inner.remove_if(&id, |_, data| data.is_empty());
        flashes
    }

    pub fn put_once(&self, id: Uuid, key: &str, value: impl Into<String>) {
        self.inner
            .entry(id)
            .or_default()
            .touch()
            .values
            .insert(key.to_string(), value.into());
    }

    /// Read a value and remove it, so a second read returns `None`.
    pub fn take_once(&self, id: Uuid, key: &str) -> Option<String> {
        let value = self.inner.get_mut(&id)?.touch().values.remove(key);
        self.inner.remove_if(&id, |_, data| data.is_empty());
        value
    }

    /// Drop sessions not used within `max_age`, returning how many were removed.
    pub fn cleanup_stale(&self, max_age: Duration) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, data| data.last_seen.elapsed() < max_age);
        before.saturating_sub(self.inner.len())
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Spawn a background task that periodically drops stale sessions.
pub fn spawn_cleanup_task(
    store: SessionStore,
    cleanup_interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);

        loop {
            interval.tick().await;
            let removed = store.cleanup_stale(max_age);
            if removed > 0 {
                info!(removed, "Cleaned up stale sessions");
            }
        }
    })
}

#[derive(Clone, Copy, Debug)]
struct SessionId(Uuid);

/// Handle on the current request's session.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    store: SessionStore,
}

impl Session {
    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        self.store.flash(self.id, level, message);
    }

    pub fn take_flashes(&self) -> Vec<Flash> {
        self.store.take_flashes(self.id)
    }

    pub fn put_once(&self, key: &str, value: impl Into<String>) {
        self.store.put_once(self.id, key, value);
    }

    pub fn take_once(&self, key: &str) -> Option<String> {
        self.store.take_once(self.id, key)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionId(id) = parts
            .extensions
            .get::<SessionId>()
            .copied()
            .ok_or_else(|| AppError::Internal("session layer is not installed".into()))?;
        Ok(Session {
            id,
            store: state.sessions.clone(),
        })
    }
}

/// Middleware that attaches a session id to every request, issuing a cookie
/// when the client does not present a valid one.
pub async fn session_layer(jar: CookieJar, mut req: Request, next: Next) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let (id, fresh) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };

    req.extensions_mut().insert(SessionId(id));
    let mut res = next.run(req).await;

    if fresh {
        let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            res.headers_mut().append(SET_COOKIE, value);
        }
    }

    res
}
