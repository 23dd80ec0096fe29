//! Composite keys for the ordered keyspace.
//!
//! A [`Key`] is an ordered tuple of typed segments, encoded into bytes so
//! that the byte-level lexicographic order of the encodings matches the
//! segment-level order of the tuples. Collections rely on this for prefix
//! scans: all records under `("pokemon", <id>)` share the encoding of the
//! leading `"pokemon"` segment, and iterate in ascending id order.
//!
//! Encoding per segment:
//! - `Str`: tag `0x02`, the UTF-8 bytes with `0x00` escaped as `0x00 0xff`,
//!   then a `0x00` terminator. The terminator makes string segments
//!   self-delimiting, so the prefix for `"pokemon"` never matches a key
//!   whose first segment is `"pokemonx"`.
//! - `Int`: tag `0x03`, 8 bytes big-endian. Fixed width keeps unsigned
//!   integers in ascending numeric order.
//!
//! String segments sort before integer segments in the same position.

use crate::error::StorageError;

const STR_TAG: u8 = 0x02;
const INT_TAG: u8 = 0x03;
const TERMINATOR: u8 = 0x00;
const ESCAPE: u8 = 0xff;

/// One typed segment of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeySegment {
    Str(String),
    Int(u64),
}

/// An ordered tuple of typed segments addressing one value in the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Key {
    segments: Vec<KeySegment>,
}

impl Key {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(KeySegment::Str(segment.into()));
        self
    }

    pub fn push_int(mut self, segment: u64) -> Self {
        self.segments.push(KeySegment::Int(segment));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    /// Encode to order-preserving bytes. Encoding a leading subsequence of
    /// segments yields a byte prefix of the full key's encoding, which is
    /// what makes `scan_prefix` over a collection namespace work.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.segments.len() * 9);
        for segment in &self.segments {
            match segment {
                KeySegment::Str(s) => {
                    out.push(STR_TAG);
                    for &b in s.as_bytes() {
                        out.push(b);
                        if b == TERMINATOR {
                            out.push(ESCAPE);
                        }
                    }
                    out.push(TERMINATOR);
                }
                KeySegment::Int(n) => {
                    out.push(INT_TAG);
                    out.extend_from_slice(&n.to_be_bytes());
                }
            }
        }
        out
    }

    /// Decode an encoded key back into its segments.
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut segments = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                STR_TAG => {
                    i += 1;
                    let mut raw = Vec::new();
                    loop {
                        match bytes.get(i) {
                            Some(&TERMINATOR) => {
                                if bytes.get(i + 1) == Some(&ESCAPE) {
                                    raw.push(TERMINATOR);
                                    i += 2;
                                } else {
                                    i += 1;
                                    break;
                                }
                            }
                            Some(&b) => {
                                raw.push(b);
                                i += 1;
                            }
                            None => {
                                return Err(StorageError::Deserialization(
                                    "unterminated string key segment".to_string(),
                                ))
                            }
                        }
                    }
                    let s = String::from_utf8(raw).map_err(|e| {
                        StorageError::Deserialization(format!(
                            "string key segment is not valid UTF-8: {e}"
                        ))
                    })?;
                    segments.push(KeySegment::Str(s));
                }
                INT_TAG => {
                    let start = i + 1;
                    let end = start + 8;
                    let raw: [u8; 8] = bytes
                        .get(start..end)
                        .and_then(|s| s.try_into().ok())
                        .ok_or_else(|| {
                            StorageError::Deserialization(
                                "truncated integer key segment".to_string(),
                            )
                        })?;
                    segments.push(KeySegment::Int(u64::from_be_bytes(raw)));
                    i = end;
                }
                tag => {
                    return Err(StorageError::Deserialization(format!(
                        "unknown key segment tag: {tag:#04x}"
                    )))
                }
            }
        }
        Ok(Self { segments })
    }
}
