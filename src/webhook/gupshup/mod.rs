//! Gupshup webhook integration module
//!
//! Handles events pushed by the Gupshup gateway: incoming WhatsApp messages
//! trigger the inbound CRM sync, everything else (delivery receipts, user
//! events) is acknowledged and dropped.
//!
//! ## Submodules
//!
//! - [`handler`] - Event filtering and inbound sync dispatch
//! - [`routes`] - HTTP endpoint handler for the webhook
//! - [`schemas`] - Data structures for the gateway's event envelope

pub mod handler;
pub mod routes;
pub mod schemas;

// Re-export commonly used items for convenience
pub use routes::receive;
