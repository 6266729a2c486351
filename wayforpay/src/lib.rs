//! WayForPay protocol support.
//!
//! Everything needed to talk to the gateway on behalf of one merchant:
//! - `signature` - HMAC-MD5 over `;`-joined field values
//! - `order` - order reference and order date generation
//! - `context` - the per-request [`SigningContext`] holding the decrypted secret
//! - `purchase` - purchase form and transaction-list payload builders
//! - `client` - [`WayforpayClient`], the reqwest adapter for the
//!   [`PaymentGateway`](donate_types::PaymentGateway) port
//!
//! # Example
//! ```
//! use chrono::Utc;
//! use wayforpay::{SigningContext, MerchantSettings, build_purchase_form};
//!
//! let merchant = MerchantSettings {
//!     domain_name: "donate.example".into(),
//!     approved_url: "https://donate.example/wayforpay/successful".into(),
//!     declined_url: "https://donate.example/wayforpay/unsuccessful".into(),
//! };
//! let mut ctx = SigningContext::new("test_merch_n1", "flk3409refn54t54t*FNJRET");
//! let form = build_purchase_form(&mut ctx, &merchant, &"Drone".into(), 100.0, &Default::default(), Utc::now())
//!     .unwrap();
//! assert!(form.get("merchantSignature").is_some());
//! ```

pub mod client;
pub mod context;
pub mod order;
pub mod purchase;
pub mod signature;

pub use client::{ClientConfig, WayforpayClient};
pub use context::{PurchaseFields, SignedOrder, SigningContext};
pub use order::{order_date, order_reference};
pub use purchase::{MerchantSettings, build_purchase_form, transaction_list_query};
pub use signature::sign_fields;

/// Errors raised while preparing a signed request.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("order reference was not generated before signing")]
    MissingOrderReference,

    #[error("order date was not generated before signing")]
    MissingOrderDate,
}
