// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bit-vector codec for signer indices attached to collection guarantees and
//! quorum certificates: a compact encoding of "which committee members signed".

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SignerIndicesError {
    #[error("signer indices has wrong byte count: expected {expected}, got {actual}")]
    WrongByteCount { expected: usize, actual: usize },
    #[error("trailing padding bits must all be zero")]
    NonZeroPadding,
}

fn bytes_count(count: usize) -> usize {
    (count + 7) >> 3
}

/// Encodes `indices` (assumed strictly increasing, each `< count`) into a
/// `ceil(count/8)`-byte big-endian bit vector; bit 7 of byte 0 is index 0.
pub fn encode_signer_indices(indices: &[usize], count: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; bytes_count(count)];
    for &index in indices {
        let byte = index >> 3;
        let offset = 7 - (index & 7);
        bytes[byte] |= 1u8 << offset;
    }
    bytes
}

/// Inverse of [`encode_signer_indices`]. Requires the caller to supply the same
/// `count` used at encoding time and rejects a buffer whose padding bits are
/// nonzero.
pub fn decode_signer_indices(
    bytes: &[u8],
    count: usize,
) -> Result<Vec<usize>, SignerIndicesError> {
    let expected = bytes_count(count);
    if bytes.len() != expected {
        return Err(SignerIndicesError::WrongByteCount {
            expected,
            actual: bytes.len(),
        });
    }

    let mut indices = Vec::with_capacity(count);
    let mut last_byte = 0u8;
    let mut last_offset = 0usize;
    for index in 0..count {
        last_byte = bytes[index >> 3];
        last_offset = 7 - (index & 7);
        if last_byte & (1u8 << last_offset) != 0 {
            indices.push(index);
        }
    }

    if count > 0 {
        // `last_offset` is the bit position of the last real index; every
        // lower bit in that byte is padding. When `count` is a multiple of 8
        // the last index lands on offset 0 and there is no padding at all,
        // so the mask below is correctly zero rather than overflowing a u8
        // shift.
        let padding_mask = (1u8 << last_offset) - 1;
        if last_byte & padding_mask != 0 {
            return Err(SignerIndicesError::NonZeroPadding);
        }
    } else if !bytes.is_empty() && bytes.iter().any(|b| *b != 0) {
        return Err(SignerIndicesError::NonZeroPadding);
    }

    Ok(indices)
}
