//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod gateway;
mod identity;
mod repository;

pub use gateway::{GatewayError, PaymentGateway};
pub use identity::IdentityProvider;
pub use repository::DonateRepository;
