//! Per-request signing state.
//!
//! A [`SigningContext`] is created from one user's decrypted credentials and
//! lives only as long as the request that needs it. The secret is wiped from
//! memory when the context is dropped.

use chrono::{DateTime, Utc};
use donate_types::{DateRange, FieldValue};
use zeroize::Zeroizing;

use crate::SigningError;
use crate::order::{order_date, order_reference};
use crate::signature::sign_fields;

/// Merchant identity plus the order fields generated for the current purchase.
pub struct SigningContext {
    merchant_account: String,
    merchant_secret: Zeroizing<String>,
    order_reference: Option<String>,
    order_date: Option<String>,
}

/// Values covered by the purchase signature besides the merchant and order fields.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseFields<'a> {
    pub domain_name: &'a str,
    pub amount: &'a str,
    pub currency: &'a str,
    pub product_name: &'a FieldValue,
    pub product_count: &'a str,
    pub product_price: &'a str,
}

/// Output of [`SigningContext::sign_purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    pub order_reference: String,
    pub order_date: String,
    pub signature: String,
}

impl SigningContext {
    pub fn new(merchant_account: impl Into<String>, merchant_secret: impl Into<String>) -> Self {
        Self {
            merchant_account: merchant_account.into(),
            merchant_secret: Zeroizing::new(merchant_secret.into()),
            order_reference: None,
            order_date: None,
        }
    }

    pub fn merchant_account(&self) -> &str {
        &self.merchant_account
    }

    pub fn order_reference(&self) -> Option<&str> {
        self.order_reference.as_deref()
    }

    pub fn order_date(&self) -> Option<&str> {
        self.order_date.as_deref()
    }

    /// Generates and remembers a fresh order reference.
    pub fn generate_order_reference(&mut self, product_name: &FieldValue, now: DateTime<Utc>) -> &str {
        self.order_reference
            .insert(order_reference(product_name, now))
            .as_str()
    }

    /// Generates and remembers the order date.
    pub fn generate_order_date(&mut self, now: DateTime<Utc>) -> &str {
        self.order_date.insert(order_date(now)).as_str()
    }

    /// Signs a purchase.
    ///
    /// The order reference and date are taken out of the context, so each
    /// generated pair is used by exactly one signature.
    pub fn sign_purchase(&mut self, fields: PurchaseFields<'_>) -> Result<SignedOrder, SigningError> {
        let reference = self
            .order_reference
            .take()
            .ok_or(SigningError::MissingOrderReference)?;
        let date = self
            .order_date
            .take()
            .ok_or(SigningError::MissingOrderDate)?;

        let signature = sign_fields(
            &self.merchant_secret,
            &[
                FieldValue::from(self.merchant_account.as_str()),
                fields.domain_name.into(),
                FieldValue::from(reference.as_str()),
                FieldValue::from(date.as_str()),
                fields.amount.into(),
                fields.currency.into(),
                fields.product_name.clone(),
                fields.product_count.into(),
                fields.product_price.into(),
            ],
        );

        Ok(SignedOrder {
            order_reference: reference,
            order_date: date,
            signature,
        })
    }

    /// Signs a transaction-list request over merchant account, begin and end.
    pub fn sign_transaction_list(&self, range: &DateRange) -> String {
        sign_fields(
            &self.merchant_secret,
            &[
                FieldValue::from(self.merchant_account.as_str()),
                FieldValue::One(range.begin().to_string()),
                FieldValue::One(range.end().to_string()),
            ],
        )
    }
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("merchant_account", &self.merchant_account)
            .field("merchant_secret", &"[REDACTED]")
            .field("order_reference", &self.order_reference)
            .field("order_date", &self.order_date)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase_fields(product: &FieldValue) -> PurchaseFields<'_> {
        PurchaseFields {
            domain_name: "donate.example",
            amount: "100",
            currency: "UAH",
            product_name: product,
            product_count: "1",
            product_price: "100",
        }
    }

    #[test]
    fn test_sign_purchase_requires_generated_fields() {
        let product = FieldValue::from("Drone");
        let mut ctx = SigningContext::new("merchant", "secret");

        let result = ctx.sign_purchase(purchase_fields(&product));
        assert!(matches!(result, Err(SigningError::MissingOrderReference)));

        ctx.generate_order_reference(&product, Utc::now());
        let result = ctx.sign_purchase(purchase_fields(&product));
        assert!(matches!(result, Err(SigningError::MissingOrderDate)));
    }

    #[test]
    fn test_sign_purchase_consumes_order_fields() {
        let product = FieldValue::from("Drone");
        let now = Utc::now();
        let mut ctx = SigningContext::new("merchant", "secret");
        let reference = ctx.generate_order_reference(&product, now).to_string();
        ctx.generate_order_date(now);

        let signed = ctx.sign_purchase(purchase_fields(&product)).unwrap();

        assert_eq!(signed.order_reference, reference);
        assert_eq!(signed.order_date, now.timestamp().to_string());
        assert!(ctx.order_reference().is_none());
        assert!(ctx.order_date().is_none());
    }

    #[test]
    fn test_purchase_signature_covers_fields_in_order() {
        let product = FieldValue::from("Drone");
        let now = Utc::now();
        let mut ctx = SigningContext::new("merchant", "secret");
        ctx.generate_order_reference(&product, now);
        ctx.generate_order_date(now);
        let signed = ctx.sign_purchase(purchase_fields(&product)).unwrap();

        let expected = sign_fields(
            "secret",
            &[
                "merchant".into(),
                "donate.example".into(),
                signed.order_reference.as_str().into(),
                signed.order_date.as_str().into(),
                "100".into(),
                "UAH".into(),
                "Drone".into(),
                "1".into(),
                "100".into(),
            ],
        );
        assert_eq!(signed.signature, expected);
    }

    #[test]
    fn test_transaction_list_signature() {
        let ctx = SigningContext::new("merchant", "secret");
        let range = DateRange::new(1_000, 2_000).unwrap();

        assert_eq!(
            ctx.sign_transaction_list(&range),
            sign_fields("secret", &["merchant".into(), "1000".into(), "2000".into()])
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let ctx = SigningContext::new("merchant", "top-secret");
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
