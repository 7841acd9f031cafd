//! Login and logout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::AppError;
use crate::routes::{expired_session_cookie, pages, session_cookie, session_token};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}

/// Submitted login form.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

async fn login_form() -> Html<String> {
    Html(pages::login_page())
}

/// `POST /login`: on success set the session cookie and link to the generator.
async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.gate.login(&form.email, &form.password)?;
    Ok((
        [(SET_COOKIE, session_cookie(token.as_str()))],
        Html(pages::login_success_page()),
    ))
}

/// `POST /logout`: forget the session and go back to the login form.
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.gate.revoke(&token);
    }
    ([(SET_COOKIE, expired_session_cookie())], Redirect::to("/login"))
}
