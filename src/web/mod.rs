use actix_web::{http::header::ContentType, web, HttpResponse, Responder};

use crate::api::AppState;

const INDEX_HTML: &str = include_str!("index.html");
const PASSPHRASE_SLOT: &str = "__PASSPHRASE__";

/// Render the journal page with the passphrase inlined as a JS string literal.
///
/// The page compares what the visitor types against this value in the browser.
/// Anyone can read it from the page source, and the API never checks it, so it
/// only keeps the form out of casual view.
pub fn render_index(passphrase: &str) -> String {
    let literal = serde_json::Value::String(passphrase.to_string())
        .to_string()
        .replace('<', "\\u003c");
    INDEX_HTML.replace(PASSPHRASE_SLOT, &literal)
}

pub async fn index(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_index(&state.passphrase))
}
