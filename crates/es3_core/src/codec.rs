//! Container codec contract.
//!
//! A codec turns container bytes into a decoded mapping and back. Encoding always
//! receives the bytes the document was loaded from, so framing that is not part of the
//! semantic content is reproduced instead of reinvented.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::{Map, Value};
use thiserror::Error;

pub type Mapping = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait Codec {
    fn decode(&self, bytes: &[u8], key: &str) -> Result<Mapping, CodecError>;

    fn encode(&self, original: &[u8], key: &str, mapping: &Mapping)
    -> Result<Vec<u8>, CodecError>;
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Codec for unencrypted ES3 containers: JSON text, optionally gzip framed and
/// optionally prefixed with a UTF-8 byte order mark. The key is not used.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonContainerCodec;

impl JsonContainerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonContainerCodec {
    fn decode(&self, bytes: &[u8], _key: &str) -> Result<Mapping, CodecError> {
        let inflated;
        let body = if is_gzip(bytes) {
            inflated = inflate(bytes)?;
            inflated.as_slice()
        } else {
            bytes
        };

        match serde_json::from_slice::<Value>(strip_bom(body)) {
            Ok(Value::Object(mapping)) => Ok(mapping),
            Ok(_) => Err(CodecError::new(
                "decoded container is not a key/value mapping",
            )),
            Err(e) => Err(CodecError::new(format!("invalid container JSON: {e}"))),
        }
    }

    fn encode(
        &self,
        original: &[u8],
        _key: &str,
        mapping: &Mapping,
    ) -> Result<Vec<u8>, CodecError> {
        let json = serde_json::to_vec(mapping)
            .map_err(|e| CodecError::new(format!("failed to serialize mapping: {e}")))?;

        if is_gzip(original) {
            return deflate(&json);
        }

        if original.starts_with(&UTF8_BOM) {
            let mut out = Vec::with_capacity(UTF8_BOM.len() + json.len());
            out.extend_from_slice(&UTF8_BOM);
            out.extend_from_slice(&json);
            return Ok(out);
        }

        Ok(json)
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes)
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::new(format!("failed to inflate gzip container: {e}")))?;
    Ok(out)
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| CodecError::new(format!("failed to compress container: {e}")))?;
    encoder
        .finish()
        .map_err(|e| CodecError::new(format!("failed to finish gzip container: {e}")))
}
