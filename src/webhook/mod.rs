//! Webhook handlers for external integrations
//!
//! This module contains webhook endpoint handlers for external services
//! pushing events into the bridge.
//!
//! ## Modules
//!
//! - [`gupshup`] - Gupshup WhatsApp gateway webhook handlers

pub mod gupshup;
pub mod routes;
