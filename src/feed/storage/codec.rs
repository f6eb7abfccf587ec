//! Vector BLOB encoding: little-endian `f32` components.

use crate::feed::core::errors::{FeedError, FeedResult};

/// Bytes per stored component.
pub const BYTES_PER_DIM: usize = std::mem::size_of::<f32>();

/// Encode a vector for a BLOB column.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode a BLOB column into a vector.
///
/// # Errors
/// Returns `FeedError::InvalidVector` if the length is not a multiple of 4.
pub fn decode_vector(bytes: &[u8]) -> FeedResult<Vec<f32>> {
    if bytes.len() % BYTES_PER_DIM != 0 {
        return Err(FeedError::InvalidVector(format!(
            "blob length {} is not a multiple of {BYTES_PER_DIM}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(BYTES_PER_DIM)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_little_endian() {
        let bytes = encode_vector(&[1.0]);
        assert_eq!(bytes, 1.0_f32.to_le_bytes().to_vec());
        assert_eq!(encode_vector(&[0.5, -2.0]).len(), 8);
    }

    #[test]
    fn test_decode_rejects_ragged_blob() {
        assert!(decode_vector(&[0, 0, 128]).is_err());
        assert_eq!(decode_vector(&[]).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn test_decode_reads_components() {
        let encoded = encode_vector(&[0.25, 0.75, -1.5]);
        assert_eq!(decode_vector(&encoded).unwrap(), vec![0.25, 0.75, -1.5]);
    }
}
