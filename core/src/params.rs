//! Query parameter assembly.
//!
//! # Design
//! Every parameter name the API understands is bound to exactly one codec in
//! `CODECS`. The builder looks the codec up by name and refuses values of the
//! wrong shape, so a `dt` can never go out as anything but a bookmark-format
//! timestamp. Output is a `BTreeMap`, which makes the serialized query string
//! sorted by name and byte-for-byte reproducible.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::ApiError;
use crate::scalar::{encode_bool, encode_int, encode_tags};
use crate::temporal::{Instant, BOOKMARK_TIME};

/// Everything outside the RFC 3986 unreserved set is escaped.
pub(crate) const ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub const AUTH_TOKEN: &str = "auth_token";
pub const FORMAT: &str = "format";

/// Wire codec bound to a parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Text,
    Bool,
    Tags,
    Int,
    Date,
}

impl Codec {
    fn name(self) -> &'static str {
        match self {
            Codec::Text => "string",
            Codec::Bool => "boolean",
            Codec::Tags => "tag-list",
            Codec::Int => "integer",
            Codec::Date => "date",
        }
    }

    fn encode(self, parameter: &'static str, value: &ParamValue) -> Result<String, ApiError> {
        let encoded = match (self, value) {
            (Codec::Text, ParamValue::Text(s)) => s.clone(),
            (Codec::Bool, ParamValue::Bool(b)) => encode_bool(*b).to_string(),
            (Codec::Tags, ParamValue::Tags(tags)) => encode_tags(tags),
            (Codec::Int, ParamValue::Int(n)) => encode_int(*n),
            (Codec::Date, ParamValue::Date(t)) => BOOKMARK_TIME.encode(t),
            _ => {
                return Err(ApiError::CodecMismatch {
                    parameter,
                    expected: self.name(),
                })
            }
        };
        Ok(encoded)
    }
}

const CODECS: &[(&str, Codec)] = &[
    ("count", Codec::Int),
    ("description", Codec::Text),
    ("dt", Codec::Date),
    ("extended", Codec::Text),
    ("fromdt", Codec::Date),
    ("meta", Codec::Int),
    ("new", Codec::Text),
    ("old", Codec::Text),
    ("replace", Codec::Bool),
    ("results", Codec::Int),
    ("shared", Codec::Bool),
    ("start", Codec::Int),
    ("tag", Codec::Tags),
    ("tags", Codec::Tags),
    ("todt", Codec::Date),
    ("toread", Codec::Bool),
    ("url", Codec::Text),
];

/// Look up the codec registered for `name`, with its `'static` name.
pub fn codec_for(name: &str) -> Option<(&'static str, Codec)> {
    CODECS.iter().copied().find(|(n, _)| *n == name)
}

/// A typed parameter value before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
    Tags(Vec<String>),
    Int(i64),
    Date(Instant),
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

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::Tags(value)
    }
}

impl From<&[String]> for ParamValue {
    fn from(value: &[String]) -> Self {
        ParamValue::Tags(value.to_vec())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<Instant> for ParamValue {
    fn from(value: Instant) -> Self {
        ParamValue::Date(value)
    }
}

/// Encoded, name-sorted query parameters for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<&'static str, String>);

impl QueryParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `name=value` pairs joined by `&`, values percent-encoded.
    pub fn to_query_string(&self) -> String {
        self.render(|_, value| value)
    }

    /// Same as `to_query_string` with the auth token masked, for logs.
    pub fn to_redacted_query_string(&self) -> String {
        self.render(|name, value| if name == AUTH_TOKEN { "***" } else { value })
    }

    fn render<'a>(&'a self, pick: impl Fn(&str, &'a str) -> &'a str) -> String {
        self.0
            .iter()
            .map(|(name, value)| {
                let value = pick(*name, value.as_str());
                format!("{name}={}", utf8_percent_encode(value, ESCAPED))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_redacted_query_string())
    }
}

/// Build the parameter set for one request.
///
/// `auth_token` and `format=json` are always present. Inputs whose value is
/// `None`, or that encode to an empty string (an empty tag list, say), are
/// left out entirely.
pub fn build(token: &str, inputs: &[(&str, Option<ParamValue>)]) -> Result<QueryParams, ApiError> {
    let mut out = BTreeMap::new();
    out.insert(AUTH_TOKEN, token.to_string());
    out.insert(FORMAT, "json".to_string());

    for (name, value) in inputs {
        let (name, codec) =
            codec_for(name).ok_or_else(|| ApiError::UnknownParameter(name.to_string()))?;
        let Some(value) = value else {
            continue;
        };
        let encoded = codec.encode(name, value)?;
        if !encoded.is_empty() {
            out.insert(name, encoded);
        }
    }
    Ok(QueryParams(out))
}

/// Reject an empty required input before it is silently dropped from the
/// query.
pub fn require(value: &str, selector: &'static [&'static str]) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::MissingRequiredSelector(selector));
    }
    Ok(())
}

/// Enforce an arity constraint on a tag list, counted as the tags will
/// appear on the wire. Each tag must be non-empty and free of spaces.
pub fn check_tags<S: AsRef<str>>(
    parameter: &'static str,
    tags: &[S],
    min: usize,
    max: usize,
) -> Result<(), ApiError> {
    for tag in tags {
        let tag: &str = tag.as_ref();
        if tag.is_empty() || tag.contains(' ') {
            return Err(ApiError::InvalidTag(tag.to_string()));
        }
    }
    check_count(parameter, tags.len(), min, max)
}

/// Enforce an arity constraint on a multi-valued input.
pub fn check_count(
    parameter: &'static str,
    actual: usize,
    min: usize,
    max: usize,
) -> Result<(), ApiError> {
    if (min..=max).contains(&actual) {
        Ok(())
    } else {
        Err(ApiError::ParameterCountViolation {
            parameter,
            min,
            max,
            actual,
        })
    }
}
