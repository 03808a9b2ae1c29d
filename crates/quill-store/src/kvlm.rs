//! Key-value list with message (KVLM).
//!
//! The text format behind commit payloads:
//!
//! ```text
//! tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147
//! parent 206941306e8a8af65b66eaaaea388a7ae24d49a0
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  iQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL
//!  -----END PGP SIGNATURE-----
//!
//! Commit message
//! ```
//!
//! Each field is `key SP value NL`. A newline inside a value is folded to
//! newline-plus-space on output, so any line starting with a space continues
//! the previous value. A blank line ends the fields; everything after it is
//! the message.

use indexmap::IndexMap;

use crate::error::{StoreError, StoreResult};

/// A parsed KVLM record.
///
/// Fields are kept as `(key, value)` lines in input order, so serializing a
/// parsed record reproduces its input exactly, interleaved repeats included.
/// Equality compares the values recorded under each key, in order; the
/// relative order of different keys does not take part.
#[derive(Clone, Debug, Default)]
pub struct Kvlm {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    message: Vec<u8>,
}

impl Kvlm {
    /// An empty record with an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// The first value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Every value stored under `key`, in input order.
    pub fn get_all(&self, key: &[u8]) -> Vec<&[u8]> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .collect()
    }

    /// Append a field line after all existing ones.
    pub fn push(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Replace every value under `key` with a single value.
    ///
    /// The value takes the position of the first existing line for `key`, or
    /// goes last if there is none.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((key, value)),
        }
    }

    /// Remove every line for `key`, returning the removed values.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<Vec<u8>>> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for (k, v) in self.entries.drain(..) {
            if k == key {
                removed.push(v);
            } else {
                kept.push((k, v));
            }
        }
        self.entries = kept;
        (!removed.is_empty()).then_some(removed)
    }

    /// Whether `key` has at least one value.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Distinct keys in order of first appearance.
    pub fn keys(&self) -> Vec<&[u8]> {
        self.grouped().into_keys().collect()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.grouped().len()
    }

    /// Returns `true` if there are no fields (the message may still be set).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The trailing message.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Replace the trailing message.
    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) {
        self.message = message.into();
    }

    /// Values per key, keys in first-appearance order.
    fn grouped(&self) -> IndexMap<&[u8], Vec<&[u8]>> {
        let mut map: IndexMap<&[u8], Vec<&[u8]>> = IndexMap::new();
        for (k, v) in &self.entries {
            map.entry(k.as_slice()).or_default().push(v.as_slice());
        }
        map
    }
}

// IndexMap equality ignores key order but compares each key's value list.
impl PartialEq for Kvlm {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.grouped() == other.grouped()
    }
}

impl Eq for Kvlm {}

/// Parse a KVLM record.
///
/// The scan is a single loop over a cursor. Each pass either consumes one
/// field (with its continuation lines) or reaches the blank line and takes
/// the rest of the input as the message.
pub fn parse(raw: &[u8]) -> StoreResult<Kvlm> {
    let mut kvlm = Kvlm::new();
    let mut start = 0;

    loop {
        let space = find(raw, b' ', start);
        let newline = find(raw, b'\n', start);

        let space = match (space, newline) {
            (Some(space), Some(newline)) if space < newline => space,
            (Some(space), None) => space,
            _ => {
                if newline != Some(start) {
                    return Err(StoreError::malformed(format!(
                        "kvlm: expected blank line before message at byte {start}"
                    )));
                }
                kvlm.message = raw[start + 1..].to_vec();
                return Ok(kvlm);
            }
        };
        let key = &raw[start..space];

        let mut end = start;
        loop {
            end = find(raw, b'\n', end + 1).ok_or_else(|| {
                StoreError::malformed(format!(
                    "kvlm: unterminated value for key {:?}",
                    String::from_utf8_lossy(key)
                ))
            })?;
            if raw.get(end + 1) != Some(&b' ') {
                break;
            }
        }

        kvlm.push(key, unfold(&raw[space + 1..end]));
        start = end + 1;
    }
}

/// Serialize a KVLM record.
///
/// Field lines come out in record order, followed by a blank line and the
/// message bytes unchanged.
pub fn serialize(kvlm: &Kvlm) -> Vec<u8> {
    let mut out = Vec::new();

    for (key, value) in &kvlm.entries {
        out.extend_from_slice(key);
        out.push(b' ');
        fold_into(&mut out, value);
        out.push(b'\n');
    }

    out.push(b'\n');
    out.extend_from_slice(&kvlm.message);
    out
}

fn find(raw: &[u8], needle: u8, from: usize) -> Option<usize> {
    raw.get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|offset| from + offset)
}

/// `\n ` → `\n`
fn unfold(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut iter = value.iter().copied().peekable();
    while let Some(b) = iter.next() {
        out.push(b);
        if b == b'\n' && iter.peek() == Some(&b' ') {
            iter.next();
        }
    }
    out
}

/// `\n` → `\n `
fn fold_into(out: &mut Vec<u8>, value: &[u8]) {
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
}
