//! Purchase form and transaction-list payload builders.

use chrono::{DateTime, Utc};
use donate_types::{DateRange, FieldValue, PurchaseForm, TransactionListQuery};
use serde_json::{Map, Value};

use crate::SigningError;
use crate::context::{PurchaseFields, SigningContext};

pub const LANGUAGE: &str = "AUTO";
pub const CURRENCY: &str = "UAH";
pub const PRODUCT_COUNT: &str = "1";
pub const API_VERSION: u8 = 1;
pub const TRANSACTION_LIST: &str = "TRANSACTION_LIST";

/// Merchant-wide settings that are the same for every purchase.
#[derive(Debug, Clone)]
pub struct MerchantSettings {
    pub domain_name: String,
    pub approved_url: String,
    pub declined_url: String,
}

/// Renders an amount the way the gateway signs it: `100`, `100.5`.
fn format_amount(amount: f64) -> String {
    amount.to_string()
}

/// Builds a signed purchase form.
///
/// Generated fields come first; then `productName`, `amount` and every
/// caller-supplied key are written on top, so caller values win on
/// collision. The signature always covers the generated values.
pub fn build_purchase_form(
    ctx: &mut SigningContext,
    merchant: &MerchantSettings,
    product_name: &FieldValue,
    amount: f64,
    extra: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<PurchaseForm, SigningError> {
    let amount = format_amount(amount);

    ctx.generate_order_reference(product_name, now);
    ctx.generate_order_date(now);
    let signed = ctx.sign_purchase(PurchaseFields {
        domain_name: &merchant.domain_name,
        amount: &amount,
        currency: CURRENCY,
        product_name,
        product_count: PRODUCT_COUNT,
        product_price: &amount,
    })?;

    let mut form = PurchaseForm::new();
    form.set("merchantAccount", ctx.merchant_account());
    form.set("merchantDomainName", merchant.domain_name.as_str());
    form.set("language", LANGUAGE);
    form.set("currency", CURRENCY);
    form.set("amount", amount.as_str());
    form.set("productCount", PRODUCT_COUNT);
    form.set("productPrice", amount.as_str());
    form.set("orderReference", signed.order_reference);
    form.set("orderDate", signed.order_date);
    form.set("merchantSignature", signed.signature);
    form.set("approvedUrl", merchant.approved_url.as_str());
    form.set("declinedUrl", merchant.declined_url.as_str());

    form.set("productName", product_name.clone());
    form.set("amount", amount);
    for (key, value) in extra {
        match FieldValue::from_json(value) {
            Some(value) => form.set(key.as_str(), value),
            None => tracing::debug!(field = %key, "skipping purchase field without a form representation"),
        }
    }

    Ok(form)
}

/// Builds the signed `TRANSACTION_LIST` request body.
pub fn transaction_list_query(ctx: &SigningContext, range: DateRange) -> TransactionListQuery {
    TransactionListQuery {
        api_version: API_VERSION,
        transaction_type: TRANSACTION_LIST.to_string(),
        merchant_account: ctx.merchant_account().to_string(),
        merchant_signature: ctx.sign_transaction_list(&range),
        date_begin: range.begin(),
        date_end: range.end(),
    }
}
