// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-format encode/decode for the `Request`/`Response` protocol
//! (SPEC_FULL §6.1), mirroring the reference daemon's own
//! `protocol_wire` module: a 4-byte big-endian length prefix plus a JSON
//! payload. The actual socket (out of scope, §1) reads/writes these
//! frames; this module only owns the byte shape.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Matches the reference daemon's own ceiling: large enough for a full
/// bulk-create page, small enough to bound a malformed/adversarial frame.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Encode `msg` to a JSON payload, rejecting anything over `MAX_MESSAGE_SIZE`
/// before it reaches the framing layer.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, WireError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(json)
}

/// Decode a JSON payload back into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Prefix an already-encoded payload with its 4-byte big-endian length.
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, WireError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    framed.extend_from_slice(payload);
    Ok(framed)
}

/// Split a complete length-prefixed frame back into its payload, or `None`
/// if `buf` does not yet contain a full frame (the caller should read more).
pub fn split_frame(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    if buf.len() < 4 {
        return None;
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() < 4 + len {
        return None;
    }
    Some((&buf[4..4 + len], &buf[4 + len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};
    use jobctl_core::UserId;
    use jobctl_query::sites::SiteFilter;

    #[test]
    fn encode_decode_round_trips_a_request() {
        let req = Request::SitesList {
            owner_id: UserId::new("u1"),
            filter: SiteFilter::default(),
            args: crate::ListArgs::default(),
        };
        let bytes = encode(&req).unwrap();
        let decoded: Request = decode(&bytes).unwrap();
        assert!(matches!(decoded, Request::SitesList { .. }));
    }

    #[test]
    fn frame_then_split_recovers_the_original_payload() {
        let resp = Response::Deleted;
        let payload = encode(&resp).unwrap();
        let framed = frame(&payload).unwrap();
        let (recovered, rest) = split_frame(&framed).unwrap();
        assert_eq!(recovered, payload.as_slice());
        assert!(rest.is_empty());
    }

    #[test]
    fn split_frame_returns_none_on_a_partial_buffer() {
        let payload = encode(&Response::Deleted).unwrap();
        let framed = frame(&payload).unwrap();
        assert!(split_frame(&framed[..framed.len() - 1]).is_none());
    }
}
