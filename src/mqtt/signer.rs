//! Credential signing for the broker's HMAC authentication scheme
//!
//! The broker rebuilds the same string from the CONNECT fields and compares
//! digests, so key names, sort order and value formatting must match its
//! verifier exactly. A mismatch only shows up as a refused connection.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::collections::BTreeMap;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// A primitive parameter value. Nested structures are not representable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

/// Connection parameters that go into the signed string.
///
/// Keys are kept in byte-wise ascending order regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectParams {
    entries: BTreeMap<String, ParamValue>,
}

impl ConnectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Concatenates `key` + `value` for every entry in sorted key order
    pub fn canonical_string(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{}{}", key, value))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ConnectParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ConnectParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Signs `params` with HMAC-SHA1 keyed by `secret`, returning lowercase hex.
pub fn sign_hmac_sha1(params: &ConnectParams, secret: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA1 accepts keys of any length"));
    mac.update(params.canonical_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConnectParams {
        [
            ("productKey", ParamValue::from("pk")),
            ("deviceName", ParamValue::from("dn")),
            ("timestamp", ParamValue::from(1000_i64)),
            ("clientId", ParamValue::from("abc")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn canonical_string_sorts_keys_without_separators() {
        assert_eq!(
            sample().canonical_string(),
            "clientIdabcdeviceNamednproductKeypktimestamp1000"
        );
    }

    #[test]
    fn signature_is_fixed_for_fixed_input() {
        let expected = "0128a4d677ab0492159f1b3b54f01dd604e9b758";
        assert_eq!(sign_hmac_sha1(&sample(), "secret"), expected);
        assert_eq!(sign_hmac_sha1(&sample(), "secret"), expected);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let reversed: ConnectParams = [
            ("clientId", ParamValue::from("abc")),
            ("timestamp", ParamValue::from(1000_i64)),
            ("deviceName", ParamValue::from("dn")),
            ("productKey", ParamValue::from("pk")),
        ]
        .into_iter()
        .collect();

        let mut chained = ConnectParams::new();
        chained
            .insert("timestamp", 1000_i64)
            .insert("productKey", "pk")
            .insert("clientId", "abc")
            .insert("deviceName", "dn");

        let expected = sign_hmac_sha1(&sample(), "secret");
        assert_eq!(sign_hmac_sha1(&reversed, "secret"), expected);
        assert_eq!(sign_hmac_sha1(&chained, "secret"), expected);
    }

    #[test]
    fn changing_any_value_changes_signature() {
        let base = sign_hmac_sha1(&sample(), "secret");

        let mut bumped = sample();
        bumped.insert("timestamp", 1001_i64);
        assert_eq!(
            sign_hmac_sha1(&bumped, "secret"),
            "345a901a8765fb74a5274d906799f7939502c295"
        );

        for (key, value) in [
            ("productKey", ParamValue::from("pk2")),
            ("deviceName", ParamValue::from("dn2")),
            ("clientId", ParamValue::from("abd")),
        ] {
            let mut changed = sample();
            changed.insert(key, value);
            assert_ne!(sign_hmac_sha1(&changed, "secret"), base, "{}", key);
        }

        assert_ne!(sign_hmac_sha1(&sample(), "secret2"), base);
    }

    #[test]
    fn integers_render_as_plain_decimal() {
        assert_eq!(ParamValue::from(1_700_000_000_000_i64).to_string(), "1700000000000");
        assert_eq!(ParamValue::from(-5_i64).to_string(), "-5");
    }

    #[test]
    fn matches_known_hmac_sha1_vector() {
        // Canonical string built from a single key reproduces the raw message
        let mut params = ConnectParams::new();
        params.insert("The quick brown fox jumps over the lazy do", "g");
        assert_eq!(
            sign_hmac_sha1(&params, "key"),
            "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }
}
