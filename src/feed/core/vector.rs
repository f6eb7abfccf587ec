//! Unit-normalized embedding vectors.

use crate::feed::core::errors::{FeedError, FeedResult};

/// Fixed-dimension `f32` vector with Euclidean norm 1.
///
/// The only way to build one is through [`Vector::normalized`], so every
/// value of this type can be scored with a plain dot product.
#[derive(Clone, Debug, PartialEq)]
pub struct Vector(Vec<f32>);

impl Vector {
    /// Rescale raw model output to unit length.
    ///
    /// # Errors
    /// Returns `FeedError::InvalidVector` if the input is empty, contains
    /// non-finite values, or has zero norm.
    pub fn normalized(raw: Vec<f32>) -> FeedResult<Self> {
        if raw.is_empty() {
            return Err(FeedError::InvalidVector("vector is empty".to_string()));
        }
        if raw.iter().any(|x| !x.is_finite()) {
            return Err(FeedError::InvalidVector(
                "vector contains non-finite values".to_string(),
            ));
        }
        let norm = raw
            .iter()
            .map(|x| f64::from(*x) * f64::from(*x))
            .sum::<f64>()
            .sqrt();
        if norm <= f64::EPSILON {
            return Err(FeedError::InvalidVector("vector has zero norm".to_string()));
        }
        #[allow(clippy::cast_possible_truncation)]
        let scaled = raw
            .into_iter()
            .map(|x| (f64::from(x) / norm) as f32)
            .collect();
        Ok(Self(scaled))
    }

    /// Normalize `f64` output (as returned by Rig providers).
    ///
    /// # Errors
    /// Same conditions as [`Vector::normalized`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalized_f64(raw: &[f64]) -> FeedResult<Self> {
        Self::normalized(raw.iter().map(|x| *x as f32).collect())
    }

    /// Number of dimensions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the components.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean norm, computed in `f64`.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|x| f64::from(*x) * f64::from(*x))
            .sum::<f64>()
            .sqrt()
    }

    /// Fail if this vector does not have `expected` dimensions.
    ///
    /// # Errors
    /// Returns `FeedError::DimensionMismatch` naming `context`.
    pub fn ensure_dims(&self, expected: usize, context: &str) -> FeedResult<()> {
        if self.len() == expected {
            Ok(())
        } else {
            Err(FeedError::DimensionMismatch {
                context: context.to_string(),
                expected,
                found: self.len(),
            })
        }
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
