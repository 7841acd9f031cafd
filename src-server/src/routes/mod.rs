//! HTTP routes.
//!
//! Public: `/`, `/login`, `/logout`, `/health`. Everything that reaches the
//! generator (`/generator`, `/generate`) requires a session token issued by
//! the access gate, presented either as the session cookie or as a bearer
//! token.

pub mod auth;
pub mod generate;
pub mod health;
pub mod pages;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE, X_CONTENT_TYPE_OPTIONS};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "docx_batch_session";

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_routes = generate::router().layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new()
        .merge(pages::router())
        .merge(auth::router())
        .merge(upload_routes)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

/// Extract the session token from the cookie or an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_owned());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| token.trim().to_owned())
    })
}

/// `Set-Cookie` value that stores `token` for the whole site.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

/// A request carrying a valid session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        state.gate.validate(token.as_deref())?;
        Ok(Session {
            token: token.unwrap_or_default(),
        })
    }
}
