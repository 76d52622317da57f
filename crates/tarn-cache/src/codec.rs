//! Binary encode/decode for the size record.
//!
//! Fixed layout, all integers little-endian, no magic, no padding:
//!
//! ```text
//! [version: u32][total: u64][static_size: u64][dynamic_size: u64]
//! ```
//!
//! The explicit layout replaces the original engine's native-struct
//! write, which tied the file to one platform's word size. Versioning
//! is the whole migration story: a reader that sees an unexpected
//! `version` discards the record and rewrites it.

use tarn_core::SizeRecord;

use crate::error::CacheError;

/// Size of an encoded record in bytes.
pub const ENCODED_LEN: usize = 4 + 3 * 8;

/// Encode a record into its fixed little-endian layout.
pub fn encode_record(record: &SizeRecord) -> [u8; ENCODED_LEN] {
    let mut out = [0u8; ENCODED_LEN];
    out[0..4].copy_from_slice(&record.version.to_le_bytes());
    out[4..12].copy_from_slice(&record.total.to_le_bytes());
    out[12..20].copy_from_slice(&record.static_size.to_le_bytes());
    out[20..28].copy_from_slice(&record.dynamic_size.to_le_bytes());
    out
}

/// Decode a record from bytes.
///
/// Trailing bytes are ignored — the record is read as a single
/// struct-sized block, exactly like the original engine's `fread`.
/// Short input is [`CacheError::Truncated`]. The version field is
/// returned as found; rejecting a stale version is the arena's job.
pub fn decode_record(bytes: &[u8]) -> Result<SizeRecord, CacheError> {
    if bytes.len() < ENCODED_LEN {
        return Err(CacheError::Truncated {
            expected: ENCODED_LEN,
            found: bytes.len(),
        });
    }
    let u32_at = |at: usize| {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[at..at + 4]);
        u32::from_le_bytes(buf)
    };
    let u64_at = |at: usize| {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[at..at + 8]);
        u64::from_le_bytes(buf)
    };
    Ok(SizeRecord {
        version: u32_at(0),
        total: u64_at(4),
        static_size: u64_at(12),
        dynamic_size: u64_at(20),
    })
}
