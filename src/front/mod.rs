pub mod amo;
pub mod errors;
pub mod message;
pub mod routes;
pub mod server;
pub mod status;
pub mod templates;
pub mod utils;

use crate::services;

pub struct AppState {
    pub gateway_service: services::ImplGatewayService,
    pub crm_service: services::ImplCrmService,
}
