//! Domain models for the donation service.

pub mod payment;
pub mod post;
pub mod user;

pub use payment::{
    CredentialId, DateRange, FieldValue, NewCredential, PaymentCredential, PurchaseForm,
    TransactionListQuery,
};
pub use post::{Post, PostId};
pub use user::{NewUser, OAuthProfile, User, UserId, UserRole};
