//! Divergence Calculator
//!
//! Three independent measures between a baseline and a recent sample:
//!
//! | Measure | Input | Drift when |
//! |---------|-------|------------|
//! | KL divergence `D(P‖Q)` | confidence distributions | high |
//! | Cosine similarity | confidence distributions | low |
//! | Embedding drift | mean embeddings (cosine distance) | high |
//!
//! The baseline is always the reference `P`; the recent window is `Q`.
//! Embedding dot products run through `trueno`'s SIMD kernels.

use trueno::Vector;

use crate::distribution::Distribution;
use crate::record::Embedding;
use crate::{Error, Result};

fn check_lengths(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

/// Kullback–Leibler divergence `Σ Pᵢ · ln(Pᵢ / Qᵢ)`.
///
/// Finite and non-negative for smoothed distributions; zero iff `P == Q`.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the bin counts differ.
pub fn kl_divergence(baseline: &Distribution, recent: &Distribution) -> Result<f64> {
    check_lengths(baseline.len(), recent.len())?;

    let kl: f64 = baseline
        .bins()
        .iter()
        .zip(recent.bins())
        .filter(|(p, _)| **p > 0.0)
        .map(|(p, q)| p * (p / q).ln())
        .sum();

    // Rounding can leave a tiny negative residue for P ≈ Q
    Ok(kl.max(0.0))
}

/// Cosine similarity `1 − cosine_distance(P, Q)` of two distributions.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the bin counts differ.
pub fn cosine_similarity(baseline: &Distribution, recent: &Distribution) -> Result<f64> {
    check_lengths(baseline.len(), recent.len())?;

    let (dot, norm_p, norm_q) = baseline.bins().iter().zip(recent.bins()).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, np, nq), (p, q)| (p.mul_add(*q, dot), p.mul_add(*p, np), q.mul_add(*q, nq)),
    );

    let denom = norm_p.sqrt() * norm_q.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Element-wise mean of an embedding set; `None` for an empty set.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if embeddings differ in length.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
pub fn mean_embedding(embeddings: &[Embedding]) -> Result<Option<Embedding>> {
    let Some(first) = embeddings.first() else {
        return Ok(None);
    };

    let dim = first.len();
    let mut acc = vec![0.0f64; dim];
    for embedding in embeddings {
        check_lengths(dim, embedding.len())?;
        for (slot, &x) in acc.iter_mut().zip(embedding) {
            *slot += f64::from(x);
        }
    }

    let n = embeddings.len() as f64;
    Ok(Some(acc.into_iter().map(|s| (s / n) as f32).collect()))
}

fn simd_dot(a: &[f32], b: &[f32]) -> Result<f64> {
    Vector::from_slice(a)
        .dot(&Vector::from_slice(b))
        .map(f64::from)
        .map_err(|e| Error::Internal(format!("SIMD dot product failed: {e}")))
}

/// Cosine distance `1 − a·b / (‖a‖‖b‖)`.
///
/// `None` if either vector has zero or non-finite norm, or the similarity
/// is not finite.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if lengths differ.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<Option<f64>> {
    check_lengths(a.len(), b.len())?;
    if !a.iter().chain(b).all(|x| x.is_finite()) {
        return Ok(None);
    }

    let norm_a = simd_dot(a, a)?.sqrt();
    let norm_b = simd_dot(b, b)?.sqrt();
    let usable = |norm: f64| norm.is_finite() && norm > 0.0;
    if !(usable(norm_a) && usable(norm_b)) {
        return Ok(None);
    }

    let similarity = simd_dot(a, b)? / (norm_a * norm_b);
    if !similarity.is_finite() {
        return Ok(None);
    }
    Ok(Some((1.0 - similarity.clamp(-1.0, 1.0)).max(0.0)))
}

/// Cosine distance between the mean baseline and mean recent embedding.
///
/// Absent (not zero) when either set is empty or a mean has zero or
/// non-finite norm (e.g. a NaN component).
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if embedding dimensions disagree,
/// within or across the two sets.
pub fn embedding_drift(baseline: &[Embedding], recent: &[Embedding]) -> Result<Option<f64>> {
    let (Some(base_mean), Some(recent_mean)) = (mean_embedding(baseline)?, mean_embedding(recent)?)
    else {
        return Ok(None);
    };

    let drift = cosine_distance(&base_mean, &recent_mean)?;
    if drift.is_none() {
        tracing::debug!(
            dim = base_mean.len(),
            "Mean embedding has zero or non-finite norm; embedding drift undefined"
        );
    }
    Ok(drift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kl_self_is_zero() {
        let p = Distribution::from_values(&[0.1, 0.2, 0.2, 0.7]);
        assert!(kl_divergence(&p, &p).unwrap().abs() < 1e-12);
        assert!((cosine_similarity(&p, &p).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kl_is_asymmetric() {
        let p = Distribution::from_values(&[0.1, 0.1, 0.1, 0.5]);
        let q = Distribution::from_values(&[0.5, 0.9]);
        let pq = kl_divergence(&p, &q).unwrap();
        let qp = kl_divergence(&q, &p).unwrap();
        assert!(pq > 0.0 && qp > 0.0);
        assert!((pq - qp).abs() > 1e-6);
    }

    #[test]
    fn test_disjoint_distributions_diverge() {
        let baseline = Distribution::from_values(&[0.1; 5]);
        let recent = Distribution::from_values(&[0.9; 5]);
        assert!(kl_divergence(&baseline, &recent).unwrap() > 0.1);
        assert!(cosine_similarity(&baseline, &recent).unwrap() < 0.9);
    }

    #[test]
    fn test_bin_mismatch() {
        let p = Distribution::uniform(10);
        let q = Distribution::uniform(8);
        assert!(matches!(
            kl_divergence(&p, &q),
            Err(Error::DimensionMismatch { expected: 10, actual: 8 })
        ));
        assert!(cosine_similarity(&p, &q).is_err());
    }

    #[test]
    fn test_mean_embedding() {
        let mean = mean_embedding(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap().unwrap();
        assert_eq!(mean, vec![0.5, 0.5]);
        assert!(mean_embedding(&[]).unwrap().is_none());
        assert!(mean_embedding(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_embedding_drift_absent_when_empty() {
        let some = vec![vec![1.0, 2.0, 3.0]];
        assert_eq!(embedding_drift(&[], &some).unwrap(), None);
        assert_eq!(embedding_drift(&some, &[]).unwrap(), None);
        assert_eq!(embedding_drift(&[], &[]).unwrap(), None);
    }

    #[test]
    fn test_embedding_drift_orthogonal() {
        let baseline = vec![vec![1.0, 0.0, 0.0, 0.0]; 3];
        let recent = vec![vec![0.0, 1.0, 0.0, 0.0]; 3];
        let drift = embedding_drift(&baseline, &recent).unwrap().unwrap();
        assert!((drift - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_embedding_drift_same_direction() {
        let baseline = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let recent = vec![vec![2.0, 4.0, 6.0, 8.0]];
        let drift = embedding_drift(&baseline, &recent).unwrap().unwrap();
        assert!(drift.abs() < 1e-6);
    }

    #[test]
    fn test_zero_norm_is_absent() {
        let baseline = vec![vec![1.0, -1.0], vec![-1.0, 1.0]];
        let recent = vec![vec![1.0, 1.0]];
        assert_eq!(embedding_drift(&baseline, &recent).unwrap(), None);
    }

    #[test]
    fn test_non_finite_embeddings_are_absent() {
        let corrupt = vec![vec![1.0, f32::NAN]];
        let clean = vec![vec![0.0, 1.0]];
        assert_eq!(embedding_drift(&corrupt, &clean).unwrap(), None);
        assert_eq!(embedding_drift(&clean, &corrupt).unwrap(), None);

        let infinite = vec![vec![f32::INFINITY, 1.0]];
        assert_eq!(embedding_drift(&infinite, &clean).unwrap(), None);
        assert_eq!(cosine_distance(&[f32::NAN, 0.0], &[1.0, 0.0]).unwrap(), None);
    }
}
