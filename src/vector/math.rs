//! Vector arithmetic shared by the index, the analyzer and the engine.
//!
//! Similarities leave this module rescaled from `[-1, 1]` to `[0, 1]` so that
//! fitness, attention scores and raw similarity queries share one scale.

use crate::error::{EvolvError, Result};
use crate::types::Vector;
use std::borrow::Cow;

/// Norms below this cannot be normalized
pub const NORM_EPSILON: f64 = 1e-9;

const UNIT_TOLERANCE: f64 = 1e-5;

pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

pub fn is_unit(v: &[f32]) -> bool {
    (l2_norm(v) - 1.0).abs() < UNIT_TOLERANCE
}

pub fn normalize(v: &[f32]) -> Result<Vector> {
    let norm = l2_norm(v);
    if !norm.is_finite() || norm < NORM_EPSILON {
        return Err(EvolvError::DegenerateVector);
    }
    Ok(v.iter().map(|x| (*x as f64 / norm) as f32).collect())
}

fn ensure_unit(v: &[f32]) -> Result<Cow<'_, [f32]>> {
    if is_unit(v) {
        Ok(Cow::Borrowed(v))
    } else {
        Ok(Cow::Owned(normalize(v)?))
    }
}

pub(crate) fn check_dimensions(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(EvolvError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Raw dot product; both slices must already have equal length.
pub(crate) fn dot_unchecked(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum()
}

pub fn dot(a: &[f32], b: &[f32]) -> Result<f64> {
    check_dimensions(a.len(), b.len())?;
    Ok(dot_unchecked(a, b))
}

/// Map a cosine in `[-1, 1]` onto `[0, 1]`.
pub fn rescale(cosine: f64) -> f64 {
    (cosine.clamp(-1.0, 1.0) + 1.0) / 2.0
}

/// Rescaled similarity of two vectors already known to be unit length.
pub(crate) fn unit_similarity(a: &[f32], b: &[f32]) -> f64 {
    rescale(dot_unchecked(a, b))
}

/// Cosine similarity rescaled to `[0, 1]`, normalizing either input if needed.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    check_dimensions(a.len(), b.len())?;
    let a = ensure_unit(a)?;
    let b = ensure_unit(b)?;
    Ok(unit_similarity(&a, &b))
}

/// Component-wise mean of equally sized vectors.
pub fn mean(vectors: &[Vector]) -> Result<Vector> {
    let first = vectors.first().ok_or(EvolvError::EmptyInput)?;
    let dimension = first.len();
    let mut sum = vec![0.0f64; dimension];

    for vector in vectors {
        check_dimensions(dimension, vector.len())?;
        for (acc, x) in sum.iter_mut().zip(vector) {
            *acc += *x as f64;
        }
    }

    let count = vectors.len() as f64;
    Ok(sum.into_iter().map(|s| (s / count) as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_produces_unit_vector() {
        let v = normalize(&[3.0, 4.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!(is_unit(&v));
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        assert!(matches!(normalize(&[0.0, 0.0, 0.0]), Err(EvolvError::DegenerateVector)));
        assert!(matches!(normalize(&[]), Err(EvolvError::DegenerateVector)));
    }

    #[test]
    fn test_cosine_rescaling() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        let c = [0.0, 5.0];
        assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-9);
        assert!((cosine_similarity(&a, &c).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let result = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(
            result,
            Err(EvolvError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_mean() {
        let m = mean(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(m, vec![0.5, 0.5]);
        assert!(matches!(mean(&[]), Err(EvolvError::EmptyInput)));
    }
}
