use ntex::web;

/// Configures webhook routes for external integrations.
///
/// These routes are public endpoints called by the gateway, not by users.
///
/// # Routes
/// - `POST /webhook/gupshup` - Gupshup event receiver
pub fn gupshup(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook/gupshup").service((super::gupshup::receive,)));
}
