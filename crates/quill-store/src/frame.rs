//! Object frame codec.
//!
//! Every object is framed before hashing and compression:
//!
//! ```text
//! <kind> SP <decimal length> NUL <payload>
//! ```
//!
//! `blob 4\0test` is the frame of the four-byte blob `test`. The declared
//! length is the only integrity check on read: it catches truncation and
//! trailing garbage, not damage inside the payload.

use quill_types::ObjectKind;

use crate::error::{StoreError, StoreResult};

/// A decoded frame borrowing from the raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    /// The raw kind token. Not validated here; see [`crate::Object::deserialize`].
    pub kind: &'a [u8],
    /// The payload following the NUL.
    pub payload: &'a [u8],
}

/// The `kind SP length NUL` header for a payload of `len` bytes.
pub fn header(kind: ObjectKind, len: usize) -> Vec<u8> {
    let len = len.to_string();
    let mut out = Vec::with_capacity(kind.as_bytes().len() + len.len() + 2);
    out.extend_from_slice(kind.as_bytes());
    out.push(b' ');
    out.extend_from_slice(len.as_bytes());
    out.push(0);
    out
}

/// Frame a payload.
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = header(kind, payload.len());
    out.reserve_exact(payload.len());
    out.extend_from_slice(payload);
    out
}

/// Split a frame into its kind token and payload, checking the declared
/// length against the bytes actually present.
pub fn decode(raw: &[u8]) -> StoreResult<Frame<'_>> {
    let space = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| StoreError::malformed("missing space after object type"))?;
    let nul = raw[space..]
        .iter()
        .position(|&b| b == 0)
        .map(|offset| space + offset)
        .ok_or_else(|| StoreError::malformed("missing NUL after object length"))?;

    let declared = parse_length(&raw[space + 1..nul])?;
    let payload = &raw[nul + 1..];
    if declared != payload.len() {
        return Err(StoreError::malformed(format!(
            "bad length: header says {declared}, payload has {}",
            payload.len()
        )));
    }

    Ok(Frame {
        kind: &raw[..space],
        payload,
    })
}

fn parse_length(digits: &[u8]) -> StoreResult<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(StoreError::malformed(format!(
            "invalid object length {:?}",
            String::from_utf8_lossy(digits)
        )));
    }
    // Digits are ASCII, so the conversion cannot fail; overflow still can.
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::malformed("object length overflows"))
}
