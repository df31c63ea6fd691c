//! Default encoder/decoder components.
//!
//! Object-safe so they can be registered and resolved as trait objects; the
//! free functions layer typed (de)serialization on top.

use crate::errors::{LinchpinError, LinchpinResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub trait DataEncoder: Send + Sync {
    fn encode(&self, value: &JsonValue) -> LinchpinResult<Vec<u8>>;
}

pub trait DataDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> LinchpinResult<JsonValue>;
}

/// Encodes flat string maps as `application/x-www-form-urlencoded` bodies.
pub trait UrlDataEncoder: Send + Sync {
    fn encode_form(&self, fields: &BTreeMap<String, String>) -> Vec<u8>;
}

/// Serialize `value` through `encoder`.
pub fn encode_value<T: Serialize>(
    encoder: &dyn DataEncoder,
    value: &T,
) -> LinchpinResult<Vec<u8>> {
    let json = serde_json::to_value(value).map_err(|e| LinchpinError::Codec {
        code: "LINCHPIN_CODEC_ENCODE_FAILED".to_string(),
        message: e.to_string(),
    })?;
    encoder.encode(&json)
}

/// Deserialize a `T` from `data` through `decoder`.
pub fn decode_value<T: DeserializeOwned>(
    decoder: &dyn DataDecoder,
    data: &[u8],
) -> LinchpinResult<T> {
    let json = decoder.decode(data)?;
    serde_json::from_value(json).map_err(|e| LinchpinError::Codec {
        code: "LINCHPIN_CODEC_DECODE_FAILED".to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl DataEncoder for JsonEncoder {
    fn encode(&self, value: &JsonValue) -> LinchpinResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| LinchpinError::Codec {
            code: "LINCHPIN_CODEC_ENCODE_FAILED".to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl DataDecoder for JsonDecoder {
    fn decode(&self, data: &[u8]) -> LinchpinResult<JsonValue> {
        serde_json::from_slice(data).map_err(|e| LinchpinError::Codec {
            code: "LINCHPIN_CODEC_DECODE_FAILED".to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UrlFormEncoder;

impl UrlDataEncoder for UrlFormEncoder {
    fn encode_form(&self, fields: &BTreeMap<String, String>) -> Vec<u8> {
        fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
            .into_bytes()
    }
}
