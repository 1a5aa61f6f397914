//! # WhatsApp AmoCRM Bridge
//!
//! Main entry point for the whatsapp to amocrm synchronization service.
//! Wires configuration, logging, the two upstream clients and the http
//! routes.

#![recursion_limit = "256"]

pub mod api;
pub mod config;
pub mod consts;
pub mod front;
pub mod logger;
pub mod services;
pub mod webhook;

use anyhow::Context;
use ntex::web;
use ntex_cors::Cors;
use std::sync::{Arc, LazyLock};

use crate::services::{ImplCrmService, ImplGatewayService};

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    config::init_config().await?;

    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;

    // Initialize logging
    logger::setup_simple_logger(app_config.is_prod())?;
    LazyLock::force(&front::server::STARTED_AT);

    // Shared across workers; the crm token state must be process wide
    let gateway_service: ImplGatewayService = Arc::new(services::gupshup::GupshupHandler::new()?);
    let crm_service: ImplCrmService = Arc::new(services::amocrm::AmoCrmHandler::new()?);

    let server_addr = (
        app_config.web_server_host.as_str(),
        u16::try_from(app_config.web_server_port)
            .context("WEB_SERVER_PORT does not fit in a port number")?,
    );
    log::info!(
        "starting server at {host}:{port}",
        host = server_addr.0,
        port = server_addr.1
    );

    web::server(move || {
        web::App::new()
            .wrap(
                Cors::new()
                    .allowed_methods(vec!["GET", "HEAD", "POST", "OPTIONS"])
                    .finish(),
            )
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(front::AppState {
                gateway_service: gateway_service.clone(),
                crm_service: crm_service.clone(),
            })
            .configure(front::routes::api)
            .configure(webhook::routes::gupshup)
            .service((front::server::index, front::server::health))
            .default_service(web::route().to(front::server::serve_not_found))
    })
    .bind(server_addr)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
