//! # Api
//!
//! Core message flows behind the http endpoints.
//!
//! ## Modules
//!
//! - [`phone`]: phone number normalization
//! - [`sync`]: delivery plus crm mirroring for a single message

pub mod phone;
pub mod sync;
