//! Route configuration module.
//!
//! Groups the http surface into scopes. The json api lives under `/api`;
//! the gateway webhook scope is configured separately in
//! [`crate::webhook::routes`].

use super::{amo, message, status};
use ntex::web;

/// Configures the json api routes.
///
/// # Routes
/// - `POST /api/send-message` - Send a text message and mirror it to the crm
/// - `POST /api/send-media` - Send a media message (image, document, video)
/// - `GET /api/status` - Configuration and authorization state
/// - `GET /api/test/gupshup` - Gateway connectivity check
/// - `GET /api/test/amocrm` - Crm connectivity check
/// - `GET /api/amo/auth` - Redirect to the crm authorization page
/// - `GET /api/amo/callback` - OAuth callback, exchanges the code for tokens
pub fn api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").service((
        message::send_message,
        message::send_media,
        status::system_status,
        status::test_gupshup,
        status::test_amocrm,
        amo::authorize,
        amo::callback,
    )));
}
