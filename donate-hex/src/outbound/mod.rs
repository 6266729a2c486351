//! Outbound adapters owned by the application layer.

pub mod google;

pub use google::{GoogleConfig, GoogleIdentityProvider};
