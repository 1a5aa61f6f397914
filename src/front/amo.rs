//! # Crm OAuth Endpoints
//!
//! The browser flow of the crm authorization: redirect the user to the crm
//! grant page, then take the code back on the callback and exchange it for
//! a token pair. The result page is rendered server side; messages are shown
//! to the crm account owner, hence the russian wording.

use ntex::{http, web};
use serde::Deserialize;
use serde_json::json;

use crate::front::{AppState, errors, templates, utils};

/// Crm oauth minimum data to handle the authorization callback request
#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    // state: Option<String>,
}

/// Redirects the browser to the crm authorization page
#[web::get("/amo/auth")]
pub async fn authorize(
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let auth_url = app_state.crm_service.authorize_url().map_err(|e| {
        errors::ServerError::InternalServerError(format!("cant build crm authorize url: {e}"))
    })?;

    utils::redirect_to(&auth_url)
}

/// Handles the crm oauth callback and exchanges the authorization code
#[web::get("/amo/callback")]
pub async fn callback(
    q: web::types::Query<CallbackQuery>,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    if let Some(error) = &q.error {
        log::warn!("crm authorization denied: {error}");
        return render_result(false, &format!("Ошибка авторизации: {error}"));
    }

    let Some(code) = &q.code else {
        return render_result(false, "Не получен код авторизации");
    };

    match app_state.crm_service.exchange_code(code.clone()).await {
        Ok(()) => render_result(true, "Успешная авторизация в AmoCRM!"),
        Err(err) => {
            log::warn!("crm code exchange failed: {err}");
            render_result(false, &format!("Ошибка получения токена: {err}"))
        }
    }
}

fn render_result(success: bool, message: &str) -> Result<web::HttpResponse, web::Error> {
    let context = tera::Context::from_value(json!({
        "success": success,
        "message": message,
    }))
    .unwrap_or_default();

    let status = if success {
        http::StatusCode::OK
    } else {
        http::StatusCode::BAD_REQUEST
    };

    Ok(web::HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(
            templates::WEB_TEMPLATES
                .render("auth_result.html", &context)
                .map_err(|e| {
                    errors::ServerError::TemplateError(format!(
                        "at /api/amo/callback the template couldnt be rendered: {e}"
                    ))
                })?,
        ))
}
