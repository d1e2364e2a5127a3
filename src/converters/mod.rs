//! Small shared conversions: big-number rendering, token identifiers, JSON
//! escaping and the base64 wire representation of byte fields.

pub mod token_metadata;

use bigdecimal::{num_bigint::BigUint, BigDecimal, ToPrimitive};

/// Renders an unsigned big-endian byte value as a decimal string; used for
/// event topics carrying token amounts.
pub fn bytes_to_decimal_string(bytes: &[u8]) -> String {
    BigUint::from_bytes_be(bytes).to_string()
}

pub fn bytes_to_u64(bytes: &[u8]) -> u64 {
    BigUint::from_bytes_be(bytes).to_u64().unwrap_or(0)
}

/// Hex of the minimal big-endian representation of a nonce; `"00"` for zero.
pub fn nonce_hex(nonce: u64) -> String {
    if nonce == 0 {
        return "00".to_string();
    }
    let bytes = nonce.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    hex::encode(&bytes[first..])
}

/// `TOKEN-nonceHex` for quantified tokens; the bare token for fungibles.
pub fn compute_token_identifier(token: &str, nonce: u64) -> String {
    if nonce == 0 {
        return token.to_string();
    }
    format!("{}-{}", token, nonce_hex(nonce))
}

/// Escapes a value for direct embedding inside a JSON string literal.
pub fn json_escape(value: &str) -> String {
    let quoted = serde_json::to_string(value).unwrap_or_default();
    quoted[1..quoted.len() - 1].to_string()
}

/// Converts a decimal balance string into its denominated float form.
pub struct BalanceConverter {
    denominator: BigDecimal,
    esdt_denominator: BigDecimal,
}

const ESDT_DENOMINATION: i64 = 18;

impl BalanceConverter {
    pub fn new(denomination: u32) -> Self {
        BalanceConverter {
            denominator: pow10(denomination as i64),
            esdt_denominator: pow10(ESDT_DENOMINATION),
        }
    }

    pub fn compute_balance_as_float(&self, balance: &str) -> f64 {
        compute_float(balance, &self.denominator)
    }

    pub fn compute_esdt_balance_as_float(&self, balance: &str) -> f64 {
        compute_float(balance, &self.esdt_denominator)
    }
}

fn pow10(exponent: i64) -> BigDecimal {
    // BigDecimal::new(m, scale) is m * 10^(-scale)
    BigDecimal::new(1.into(), -exponent)
}

fn compute_float(balance: &str, denominator: &BigDecimal) -> f64 {
    let Ok(value) = balance.parse::<BigDecimal>() else {
        return 0.0;
    };
    (value / denominator).to_f64().unwrap_or(0.0)
}

/// serde adapter storing `Vec<u8>` fields as base64 strings, the wire shape
/// the documents use.
pub mod serde_b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

/// Same adapter for a list of byte fields (URIs, additional event data).
pub mod serde_b64_list {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(list: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<String> = list.iter().map(|item| STANDARD.encode(item)).collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|item| STANDARD.decode(item).map_err(serde::de::Error::custom))
            .collect()
    }
}
