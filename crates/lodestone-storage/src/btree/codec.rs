//! Fixed-width key and value codecs for on-page entries.

use lodestone_common::types::Rid;
use std::cmp::Ordering;

/// A fixed-width type that can be stored inside a tree node.
///
/// Keys and values are laid out back to back in the node's entry array, so
/// the encoded length must be constant.
pub trait Codec: Copy + Default + Send + Sync + 'static {
    /// Encoded length in bytes.
    const LEN: usize;

    /// Writes the encoded form into `buf` (exactly `LEN` bytes).
    fn encode_into(&self, buf: &mut [u8]);

    /// Reads a value back from `buf` (exactly `LEN` bytes).
    fn decode_from(buf: &[u8]) -> Self;
}

impl Codec for i32 {
    const LEN: usize = 4;

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
    }
}

impl Codec for i64 {
    const LEN: usize = 8;

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        i64::from_le_bytes([
            buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
        ])
    }
}

impl Codec for u32 {
    const LEN: usize = 4;

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
    }
}

impl Codec for u64 {
    const LEN: usize = 8;

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        u64::from_le_bytes([
            buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
        ])
    }
}

impl Codec for Rid {
    const LEN: usize = 8;

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&self.page_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.slot.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        Rid {
            page_id: i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            slot: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

/// Fixed-width byte-string key.
///
/// Integer payloads are stored big-endian so byte order equals numeric
/// order for non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenericKey<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> GenericKey<N> {
    /// Builds a key from a non-negative integer.
    pub fn from_i64(value: i64) -> Self {
        let mut data = [0u8; N];
        let be = value.to_be_bytes();
        if N >= 8 {
            data[N - 8..].copy_from_slice(&be);
        } else {
            data.copy_from_slice(&be[8 - N..]);
        }
        Self { data }
    }

    /// Builds a key from raw bytes, zero-padding or truncating to N.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut data = [0u8; N];
        let len = bytes.len().min(N);
        data[..len].copy_from_slice(&bytes[..len]);
        Self { data }
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.data
    }
}

impl<const N: usize> Default for GenericKey<N> {
    fn default() -> Self {
        Self { data: [0u8; N] }
    }
}

impl<const N: usize> Codec for GenericKey<N> {
    const LEN: usize = N;

    fn encode_into(&self, buf: &mut [u8]) {
        buf[..N].copy_from_slice(&self.data);
    }

    fn decode_from(buf: &[u8]) -> Self {
        let mut data = [0u8; N];
        data.copy_from_slice(&buf[..N]);
        Self { data }
    }
}

/// Ordering predicate over keys.
///
/// The tree never compares keys directly; every comparison goes through the
/// comparator so key semantics stay pluggable.
pub trait KeyComparator<K>: Clone + Send + Sync + 'static {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Comparator delegating to the key's `Ord` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdComparator;

impl<K: Ord + Send + Sync + 'static> KeyComparator<K> for OrdComparator {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}
