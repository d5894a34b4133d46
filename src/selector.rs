//! Fixed-width identifiers for routed functions and facet modules.
//!
//! A [`Selector`] names one function shape; a [`ModuleRef`] names one
//! deployed facet module. Both are opaque to the registry: comparison is
//! exact byte equality and the registry never inspects their structure.
//! [`SelectorSet`] is the insertion-ordered collection of selectors a
//! module currently owns.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

/// Error parsing a fixed-width identifier from hex text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    /// Input length (after an optional `0x` prefix) did not match the width.
    #[error("expected {expected} hex digits, got {got}")]
    BadLength {
        /// Number of hex digits the identifier requires.
        expected: usize,
        /// Number of digits supplied.
        got: usize,
    },
    /// Input contained a character outside `[0-9a-fA-F]`.
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

/// Render bytes as lowercase hex without a prefix.
fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Decode hex text (optional `0x` prefix) into a fixed-width buffer.
fn decode_hex(text: &str, out: &mut [u8]) -> Result<(), ParseIdError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let expected = out.len().saturating_mul(2);
    if digits.len() != expected {
        return Err(ParseIdError::BadLength {
            expected,
            got: digits.len(),
        });
    }
    for (slot, pair) in out.iter_mut().zip(digits.as_bytes().chunks(2)) {
        let pair = std::str::from_utf8(pair)
            .map_err(|_| ParseIdError::BadDigit(digits.to_owned()))?;
        *slot = u8::from_str_radix(pair, 16)
            .map_err(|_| ParseIdError::BadDigit(digits.to_owned()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Opaque 4-byte identifier for one function shape.
///
/// Unique per distinct function shape by convention; the registry only ever
/// compares selectors byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector([u8; 4]);

impl Selector {
    /// Width of a selector in bytes.
    pub const WIDTH: usize = 4;

    /// Wrap raw selector bytes.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// The raw selector bytes.
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Derive a selector from a canonical signature string.
    ///
    /// Uses a 32-bit FNV-1a hash. Deterministic and dependency-free; callers
    /// needing compatibility with an external selector convention should
    /// construct selectors from raw bytes instead.
    pub fn from_signature(signature: &str) -> Self {
        let mut hash: u32 = 0x811c_9dc5;
        for byte in signature.as_bytes() {
            hash ^= u32::from(*byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
        Self(hash.to_be_bytes())
    }

    /// Parse from hex text, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ParseIdError`] on wrong length or non-hex input.
    pub fn from_hex(text: &str) -> Result<Self, ParseIdError> {
        let mut bytes = [0u8; 4];
        decode_hex(text, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering without a prefix, as used in record keys.
    pub fn bare_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.bare_hex())
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ModuleRef
// ---------------------------------------------------------------------------

/// Opaque 20-byte reference naming a deployed facet module.
///
/// The all-zero value is the reserved null reference: "no module". It never
/// appears as a mapped owner; cut entries use it to signal deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleRef([u8; 20]);

impl ModuleRef {
    /// Width of a module reference in bytes.
    pub const WIDTH: usize = 20;

    /// The reserved null reference.
    pub const NULL: Self = Self([0u8; 20]);

    /// Wrap raw reference bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw reference bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the reserved null reference.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Parse from hex text, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ParseIdError`] on wrong length or non-hex input.
    pub fn from_hex(text: &str) -> Result<Self, ParseIdError> {
        let mut bytes = [0u8; 20];
        decode_hex(text, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Parse from raw persisted bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseIdError::BadLength`] if the slice is not 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseIdError> {
        let fixed: [u8; 20] = bytes.try_into().map_err(|_| ParseIdError::BadLength {
            expected: Self::WIDTH,
            got: bytes.len(),
        })?;
        Ok(Self(fixed))
    }

    /// Lowercase hex rendering without a prefix, as used in record keys.
    pub fn bare_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.bare_hex())
    }
}

impl Serialize for ModuleRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModuleRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SelectorSet
// ---------------------------------------------------------------------------

/// Insertion-ordered set of distinct selectors owned by one module.
///
/// Small by nature (a module's public surface), so membership checks scan a
/// `Vec` rather than paying for a hash set; iteration order is the order in
/// which selectors were gained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorSet(Vec<Selector>);

impl SelectorSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of selectors in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `selector` is in the set.
    pub fn contains(&self, selector: Selector) -> bool {
        self.0.contains(&selector)
    }

    /// Append `selector` unless already present. Returns whether it was added.
    pub fn insert(&mut self, selector: Selector) -> bool {
        if self.contains(selector) {
            false
        } else {
            self.0.push(selector);
            true
        }
    }

    /// Remove `selector` if present. Returns whether it was removed.
    pub fn remove(&mut self, selector: Selector) -> bool {
        let before = self.0.len();
        self.0.retain(|s| *s != selector);
        self.0.len() != before
    }

    /// Iterate selectors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Selector> + '_ {
        self.0.iter().copied()
    }

    /// View as a slice in insertion order.
    pub fn as_slice(&self) -> &[Selector] {
        &self.0
    }
}

impl FromIterator<Selector> for SelectorSet {
    fn from_iter<I: IntoIterator<Item = Selector>>(iter: I) -> Self {
        let mut set = Self::new();
        for selector in iter {
            set.insert(selector);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SelectorSet {
    type Item = Selector;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Selector>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
