//! HTML pages: landing redirect, generator form, and the shared page shell.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;

use crate::routes::{session_token, Session};
use crate::state::AppState;

/// Build the page router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/generator", get(generator))
}

/// `GET /`: send signed-in users to the generator, everyone else to login.
async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Redirect {
    match state.gate.validate(session_token(&headers).as_deref()) {
        Ok(()) => Redirect::to("/generator"),
        Err(_) => Redirect::to("/login"),
    }
}

/// `GET /generator`: upload form, signed-in users only.
async fn generator(_session: Session) -> impl IntoResponse {
    Html(generator_page())
}

// ── Page bodies ──────────────────────────────────────────────────────

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:36rem;margin:3rem auto;padding:0 1rem;color:#222}\
label{display:block;margin:.8rem 0 .2rem}input{font-size:1rem}\
button{margin-top:1rem;padding:.4rem 1rem;font-size:1rem}\
.notice{padding:.6rem .8rem;border-radius:4px;background:#eef6ee}.error{background:#fbeaea}";

fn shell(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        title = escape_html(title),
    )
}

pub fn login_page() -> String {
    shell(
        "Login",
        "<h1>Login</h1>\
<form method=\"post\" action=\"/login\">\
<label for=\"email\">Email</label><input id=\"email\" name=\"email\" type=\"email\" required>\
<label for=\"password\">Password</label><input id=\"password\" name=\"password\" type=\"password\" required>\
<button type=\"submit\">Login</button></form>",
    )
}

pub fn login_success_page() -> String {
    shell(
        "Login",
        "<p class=\"notice\">Login successful!</p>\
<p><a href=\"/generator\">Continue to the Word file generator</a></p>",
    )
}

pub fn generator_page() -> String {
    shell(
        "Word File Generator",
        "<h1>Word File Generator</h1>\
<p>Upload a Word template with <code>{{ column }}</code> placeholders and a spreadsheet. \
You get one document per row, bundled as <code>word_files.zip</code>.</p>\
<form method=\"post\" action=\"/generate\" enctype=\"multipart/form-data\">\
<label for=\"template\">Word template (.docx)</label>\
<input id=\"template\" name=\"template\" type=\"file\" accept=\".docx\" required>\
<label for=\"data\">Spreadsheet (.xls, .xlsx)</label>\
<input id=\"data\" name=\"data\" type=\"file\" accept=\".xls,.xlsx\" required>\
<button type=\"submit\">Generate Word Files</button></form>\
<form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>",
    )
}

/// Error page for a failed request.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let link = if status == StatusCode::UNAUTHORIZED {
        "<a href=\"/login\">Go to login</a>"
    } else {
        "<a href=\"/generator\">Back to the generator</a>"
    };
    shell(
        status.canonical_reason().unwrap_or("Error"),
        &format!("<p class=\"notice error\">{}</p><p>{}</p>", escape_html(message), link),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
