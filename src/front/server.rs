//! Handlers not linked to a specific url

use ntex::web;
use serde_json::json;
use std::sync::LazyLock;
use std::time::Instant;

use crate::config;
use crate::front::{errors, templates};

/// Process start marker, forced from `main` at boot
pub static STARTED_AT: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Return a [UrlNotFound](errors::UserError::UrlNotFound) error for urls not defined
pub async fn serve_not_found() -> Result<web::HttpResponse, web::Error> {
    Err(errors::UserError::UrlNotFound.into())
}

/// Endpoint to render the dashboard view
#[web::get("/")]
async fn index() -> Result<impl web::Responder, web::Error> {
    Ok(web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(
            templates::WEB_TEMPLATES
                .render("index.html", &tera::Context::new())
                .map_err(|e| {
                    errors::ServerError::TemplateError(format!(
                        "at /index endpoint the template couldnt be rendered: {e}"
                    ))
                })?,
        ))
}

/// Liveness endpoint for container checks and the availability checker
#[web::get("/health")]
async fn health() -> Result<web::HttpResponse, web::Error> {
    let app_config = config::APP_CONFIG.get().ok_or_else(|| {
        errors::ServerError::InternalServerError("app config is not initialized".to_string())
    })?;

    Ok(web::HttpResponse::Ok().json(&json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": STARTED_AT.elapsed().as_secs(),
        "env": &app_config.env,
    })))
}
