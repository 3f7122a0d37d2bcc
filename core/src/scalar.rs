//! Scalar codecs: `yes`/`no` booleans, space-joined tag lists, decimal integers.

use serde::Deserialize;

use crate::error::ApiError;

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn decode_bool(token: &str) -> Result<bool, ApiError> {
    if token.eq_ignore_ascii_case("yes") {
        Ok(true)
    } else if token.eq_ignore_ascii_case("no") {
        Ok(false)
    } else {
        Err(ApiError::InvalidBooleanToken(token.to_string()))
    }
}

pub fn encode_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter().map(|t| t.as_ref()).collect::<Vec<&str>>().join(" ")
}

/// Split a space-joined tag string, dropping the empty tokens that repeated
/// spaces produce.
pub fn decode_tags(value: &str) -> Vec<String> {
    value
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn encode_int(value: i64) -> String {
    value.to_string()
}

/// Plain decimal only: an optional leading `-` followed by ASCII digits.
pub fn decode_int(token: &str) -> Result<i64, ApiError> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidIntegerToken(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| ApiError::InvalidIntegerToken(token.to_string()))
}

/// Integer field that the service sends either as a JSON number or as a
/// decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireInt {
    Number(i64),
    Text(String),
}

impl WireInt {
    pub(crate) fn decode(&self) -> Result<i64, ApiError> {
        match self {
            WireInt::Number(n) => Ok(*n),
            WireInt::Text(s) => decode_int(s),
        }
    }

    /// Decode a value that must be a non-negative count.
    pub(crate) fn decode_count(&self) -> Result<u32, ApiError> {
        let value = self.decode()?;
        u32::try_from(value).map_err(|_| ApiError::InvalidIntegerToken(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_use_yes_no_tokens() {
        assert_eq!(encode_bool(true), "yes");
        assert_eq!(encode_bool(false), "no");
        assert!(decode_bool("yes").unwrap());
        assert!(decode_bool("YES").unwrap());
        assert!(!decode_bool("No").unwrap());
    }

    #[test]
    fn other_boolean_tokens_are_rejected() {
        for token in ["true", "1", "", "y", " yes"] {
            let err = decode_bool(token).unwrap_err();
            assert!(matches!(err, ApiError::InvalidBooleanToken(t) if t == token));
        }
    }

    #[test]
    fn tags_join_and_split_on_spaces() {
        assert_eq!(encode_tags(&["rust", "http", "api"]), "rust http api");
        assert_eq!(decode_tags("rust http api"), vec!["rust", "http", "api"]);
    }

    #[test]
    fn repeated_spaces_do_not_produce_empty_tags() {
        assert_eq!(decode_tags("  a   b "), vec!["a", "b"]);
        assert!(decode_tags("").is_empty());
    }

    #[test]
    fn integers_are_plain_decimal() {
        assert_eq!(encode_int(-1), "-1");
        assert_eq!(encode_int(1_000_000), "1000000");
        assert_eq!(decode_int("42").unwrap(), 42);
        assert_eq!(decode_int("-1").unwrap(), -1);
        for bad in ["1,000", "+4", " 4", "4.0", "-", ""] {
            assert!(matches!(decode_int(bad), Err(ApiError::InvalidIntegerToken(_))), "{bad}");
        }
    }

    #[test]
    fn wire_int_accepts_numbers_and_strings() {
        let n: WireInt = serde_json::from_str("5").unwrap();
        let s: WireInt = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(n.decode_count().unwrap(), 5);
        assert_eq!(s.decode_count().unwrap(), 5);

        let negative: WireInt = serde_json::from_str("-3").unwrap();
        assert!(negative.decode_count().is_err());
    }
}
