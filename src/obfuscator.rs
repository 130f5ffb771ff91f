//! Account identifier obfuscation.
//!
//! The raw card number never reaches the model. It is reduced to a bucket in
//! `[0, 100)` using CRC-32 (ISO-HDLC polynomial) over the UTF-8 bytes of the
//! trimmed identifier. CRC-32 is unseeded, so the bucket is the same in every
//! process and on every run.

/// Number of identifier buckets
pub const ID_BUCKETS: u32 = 100;

/// Map an account identifier to its bucket in `[0, ID_BUCKETS)`.
pub fn obfuscate(identifier: &str) -> u32 {
    crc32fast::hash(identifier.trim().as_bytes()) % ID_BUCKETS
}
