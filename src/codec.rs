//! Compression codec for the durable snapshot payload.
//!
//! LZ4 with a size-prepended frame – cheap to compress on every write, and
//! the decompressed length is known up front. The codec is the only place
//! the compression scheme appears; the store treats payloads as opaque.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be decompressed. The store treats this the
    /// same as an unreachable backend and falls back to memory.
    #[error("corrupt snapshot payload: {0}")]
    CorruptPayload(String),
}

/// Compress a serialized snapshot for the durable backend.
pub fn encode(raw: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(raw)
}

/// Decompress a payload previously produced by [`encode`].
pub fn decode(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    lz4_flex::decompress_size_prepended(payload)
        .map_err(|e| CodecError::CorruptPayload(e.to_string()))
}
