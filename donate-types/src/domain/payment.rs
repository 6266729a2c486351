//! Payment gateway domain types: merchant credentials, signed form fields,
//! and the transaction-list date window.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use crate::error::DomainError;

/// Database-assigned identifier for a stored merchant credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(i64);

impl CredentialId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// A user's merchant account with its secret encrypted at rest.
///
/// `encrypted_secret` is `hex(nonce) ":" hex(ciphertext)`. It is never
/// serialized to API responses.
#[derive(Debug, Clone)]
pub struct PaymentCredential {
    pub id: CredentialId,
    pub user_id: UserId,
    pub merchant_account: String,
    pub encrypted_secret: String,
}

impl PaymentCredential {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// A credential about to be inserted. At most one per user.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub user_id: UserId,
    pub merchant_account: String,
    pub encrypted_secret: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Form fields
// ─────────────────────────────────────────────────────────────────────────────

/// A single gateway field value. Multi-item carts carry lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// Flattens the value into its signing form: list items joined with `;`.
    pub fn joined(&self) -> String {
        match self {
            FieldValue::One(v) => v.clone(),
            FieldValue::Many(items) => items.join(";"),
        }
    }

    /// Converts an arbitrary JSON value supplied by a caller.
    ///
    /// Nested objects and nulls have no form representation and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::String(s) => Some(FieldValue::One(s.clone())),
            Value::Number(n) => Some(FieldValue::One(n.to_string())),
            Value::Bool(b) => Some(FieldValue::One(b.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| match FieldValue::from_json(item)? {
                    FieldValue::One(v) => Some(v),
                    FieldValue::Many(_) => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::Many),
            Value::Null | Value::Object(_) => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::One(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::One(value.to_string())
    }
}

/// Ordered purchase form. Setting an existing key replaces its value in
/// place, so later writers win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseForm {
    fields: Vec<(String, FieldValue)>,
}

impl PurchaseForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// URL-encodable pairs. List values become repeated `key[]` entries.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            match value {
                FieldValue::One(v) => pairs.push((key.clone(), v.clone())),
                FieldValue::Many(items) => {
                    let list_key = format!("{key}[]");
                    pairs.extend(items.iter().map(|v| (list_key.clone(), v.clone())));
                }
            }
        }
        pairs
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction list
// ─────────────────────────────────────────────────────────────────────────────

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// A validated transaction-list window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    begin: i64,
    end: i64,
}

impl DateRange {
    /// Widest window the gateway accepts.
    pub const MAX_SPAN_MS: i64 = 31 * DAY_MS;

    /// # Validation
    /// - `end` must not precede `begin`
    /// - the span must not exceed 31 days (exactly 31 days is accepted)
    pub fn new(begin: i64, end: i64) -> Result<Self, DomainError> {
        if end < begin {
            return Err(DomainError::ReversedDateRange);
        }
        match end.checked_sub(begin) {
            Some(span) if span <= Self::MAX_SPAN_MS => Ok(Self { begin, end }),
            Some(_) | None => Err(DomainError::DateRangeTooWide),
        }
    }

    pub fn begin(&self) -> i64 {
        self.begin
    }

    pub fn end(&self) -> i64 {
        self.end
    }
}

/// Signed JSON body for a `TRANSACTION_LIST` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub api_version: u8,
    pub transaction_type: String,
    pub merchant_account: String,
    pub merchant_signature: String,
    pub date_begin: i64,
    pub date_end: i64,
}
