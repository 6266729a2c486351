//! # Donate Hex
//!
//! Application service layer and adapters for the donation service.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates domain operations)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `outbound/` - Identity provider adapter (Google OAuth)
//!
//! The service is generic over `R: DonateRepository` and `G: PaymentGateway`,
//! allowing different implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod outbound;
pub mod service;


pub use service::{DonateService, ServiceConfig};
