//! # Status and Connectivity Endpoints

use chrono::Utc;
use ntex::web;
use serde_json::json;

use crate::config;
use crate::front::{AppState, errors};
use crate::services::CallReport;

/// Reports configuration and authorization state. Booleans only, secrets
/// never leave the process.
#[web::get("/status")]
pub async fn system_status(
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let app_config = config::APP_CONFIG.get().ok_or_else(|| {
        errors::ServerError::InternalServerError("app config is not initialized".to_string())
    })?;

    Ok(web::HttpResponse::Ok().json(&json!({
        "status": "running",
        "config": {
            "gupshup_configured": app_config.gupshup_configured(),
            "amocrm_configured": app_config.amocrm_configured(),
            "amocrm_authorized": app_state.crm_service.is_authorized().await,
        },
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// Runs the gateway reachability probe
#[web::get("/test/gupshup")]
pub async fn test_gupshup(app_state: web::types::State<AppState>) -> impl web::Responder {
    let result = app_state.gateway_service.check_reachable().await;

    web::HttpResponse::Ok().json(&CallReport::from_result(result))
}

/// Runs the crm account check with the stored token
#[web::get("/test/amocrm")]
pub async fn test_amocrm(app_state: web::types::State<AppState>) -> impl web::Responder {
    let result = app_state.crm_service.test_connection().await;

    web::HttpResponse::Ok().json(&CallReport::from_result(result))
}
