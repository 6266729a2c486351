//! HMAC-MD5 request signatures.
//!
//! The gateway signs a fixed, ordered list of field values joined with `;`.
//! List values are joined with `;` first, so `["a", "b"]` contributes `a;b`.

use donate_types::FieldValue;
use hmac::{Hmac, Mac};
use md5::Md5;

type HmacMd5 = Hmac<Md5>;

/// The exact string that gets signed.
pub fn signing_string(fields: &[FieldValue]) -> String {
    fields
        .iter()
        .map(FieldValue::joined)
        .collect::<Vec<_>>()
        .join(";")
}

/// Signs `fields` with the merchant secret. Returns a lower-case hex digest.
pub fn sign_fields(secret: &str, fields: &[FieldValue]) -> String {
    let mut mac =
        HmacMd5::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signing_string(fields).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldValue> {
        vec![
            "test_merch_n1".into(),
            "www.market.ua".into(),
            "DH783023".into(),
            "1415379863".into(),
            "1547.36".into(),
            "UAH".into(),
            FieldValue::Many(vec!["Memory DDR3".into(), "Sony PSP".into()]),
            FieldValue::Many(vec!["1".into(), "1".into()]),
            FieldValue::Many(vec!["1000".into(), "547.36".into()]),
        ]
    }

    #[test]
    fn test_signing_string_flattens_lists() {
        assert_eq!(
            signing_string(&fields()),
            "test_merch_n1;www.market.ua;DH783023;1415379863;1547.36;UAH;\
             Memory DDR3;Sony PSP;1;1;1000;547.36"
        );
    }

    #[test]
    fn test_signature_is_lowercase_hex_md5() {
        let sig = sign_fields("flk3409refn54t54t*FNJRET", &fields());
        assert_eq!(sig.len(), 32);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let secret = "flk3409refn54t54t*FNJRET";
        assert_eq!(sign_fields(secret, &fields()), sign_fields(secret, &fields()));
    }

    #[test]
    fn test_every_field_changes_the_signature() {
        let secret = "flk3409refn54t54t*FNJRET";
        let baseline = sign_fields(secret, &fields());

        for i in 0..fields().len() {
            let mut altered = fields();
            altered[i] = FieldValue::One(format!("{}x", altered[i].joined()));
            assert_ne!(baseline, sign_fields(secret, &altered), "field {i}");
        }
    }

    #[test]
    fn test_secret_changes_the_signature() {
        assert_ne!(
            sign_fields("secret-a", &fields()),
            sign_fields("secret-b", &fields())
        );
    }

    #[test]
    fn test_known_vector() {
        // RFC 2202 test case 2 for HMAC-MD5.
        let sig = sign_fields("Jefe", &["what do ya want for nothing?".into()]);
        assert_eq!(sig, "750c783e6ab0b503eaa86e310a5db738");
    }
}
