//! Decode-once codec for ingest bodies.
//!
//! - Exposition bodies => UTF-8 text, handed to the core parser
//! - CloudWatch records => optional gzip, then `SubscriptionEnvelope`

use std::io::Read;

use bytes::Bytes;
use flate2::read::GzDecoder;
use promerge_core::error::{MergeError, Result};
use promerge_core::protocol::cloudwatch::SubscriptionEnvelope;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Inflated records may be at most this many times the body limit.
const MAX_INFLATE_RATIO: usize = 16;

pub fn check_len(body: &Bytes, max_bytes: usize) -> Result<()> {
    if body.len() > max_bytes {
        return Err(MergeError::PayloadTooLarge);
    }
    Ok(())
}

pub fn decode_exposition(body: Bytes, max_bytes: usize) -> Result<String> {
    check_len(&body, max_bytes)?;
    String::from_utf8(body.to_vec())
        .map_err(|e| MergeError::BadRequest(format!("exposition body is not utf-8: {e}")))
}

pub fn is_gzip(body: &[u8]) -> bool {
    body.starts_with(&GZIP_MAGIC)
}

fn inflate(body: &[u8], max_bytes: usize) -> Result<Vec<u8>> {
    let limit = max_bytes.saturating_mul(MAX_INFLATE_RATIO);
    let mut out = Vec::new();
    GzDecoder::new(body)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| MergeError::BadRequest(format!("invalid gzip record: {e}")))?;
    if out.len() > limit {
        return Err(MergeError::PayloadTooLarge);
    }
    Ok(out)
}

pub fn decode_cloudwatch(body: Bytes, max_bytes: usize) -> Result<SubscriptionEnvelope> {
    check_len(&body, max_bytes)?;

    let raw = if is_gzip(&body) {
        inflate(&body, max_bytes)?
    } else {
        body.to_vec()
    };

    serde_json::from_slice(&raw)
        .map_err(|e| MergeError::BadRequest(format!("invalid subscription record: {e}")))
}
