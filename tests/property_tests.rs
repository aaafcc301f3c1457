//! Property-based tests for trueno-drift
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants
//! - Test safety bounds of threshold adaptation
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use proptest::prelude::*;
use trueno_drift::distribution::Distribution;
use trueno_drift::divergence::{cosine_similarity, embedding_drift, kl_divergence};
use trueno_drift::record::DriftMetricSet;
use trueno_drift::threshold::{derive_thresholds, ThresholdPolicy, Thresholds};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Confidence samples, including values outside [0, 1]
fn arb_confidences(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-0.5f64..1.5, 0..max_len)
}

/// One history row with plausible metric values
fn arb_metric_set() -> impl Strategy<Value = DriftMetricSet> {
    (
        0.0f64..2.0,
        0.0f64..=1.0,
        proptest::option::of(0.0f64..1.0),
    )
        .prop_map(|(kl, cosine, embedding)| DriftMetricSet::new(kl, cosine, embedding))
}

fn arb_embeddings(count: usize, dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, dim), 1..=count)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Distribution Properties
    // ========================================================================

    /// Property: every distribution is a strictly positive probability vector
    #[test]
    fn prop_distribution_is_positive_and_normalized(values in arb_confidences(200)) {
        let dist = Distribution::from_values(&values);

        prop_assert_eq!(dist.len(), 10);
        prop_assert!(dist.bins().iter().all(|&b| b > 0.0));
        let total: f64 = dist.bins().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "sum = {}", total);
    }

    // ========================================================================
    // Divergence Properties
    // ========================================================================

    /// Property: a distribution is at zero KL and unit cosine from itself
    #[test]
    fn prop_self_comparison_is_identical(values in arb_confidences(200)) {
        let dist = Distribution::from_values(&values);

        prop_assert!(kl_divergence(&dist, &dist).unwrap().abs() < 1e-9);
        prop_assert!((cosine_similarity(&dist, &dist).unwrap() - 1.0).abs() < 1e-9);
    }

    /// Property: KL is non-negative and finite, cosine stays in (0, 1]
    #[test]
    fn prop_divergence_ranges(
        baseline in arb_confidences(200),
        recent in arb_confidences(200)
    ) {
        let p = Distribution::from_values(&baseline);
        let q = Distribution::from_values(&recent);

        let kl = kl_divergence(&p, &q).unwrap();
        prop_assert!(kl.is_finite());
        prop_assert!(kl >= 0.0);

        let cosine = cosine_similarity(&p, &q).unwrap();
        prop_assert!(cosine > 0.0);
        prop_assert!(cosine <= 1.0 + 1e-12);
    }

    /// Property: embedding drift of a set against itself is ~0
    #[test]
    fn prop_embedding_self_drift_is_zero(embeddings in arb_embeddings(8, 16)) {
        if let Some(drift) = embedding_drift(&embeddings, &embeddings).unwrap() {
            prop_assert!(drift.abs() < 1e-5, "drift = {}", drift);
        }
    }

    // ========================================================================
    // Adaptive Threshold Properties
    // ========================================================================

    /// Property: adaptation never crosses the base safety bounds
    #[test]
    fn prop_thresholds_respect_base_bounds(
        history in proptest::collection::vec(arb_metric_set(), 0..150)
    ) {
        let derived = derive_thresholds(&history, &ThresholdPolicy::default()).thresholds();
        let base = Thresholds::BASE;

        prop_assert!(derived.kl >= base.kl);
        prop_assert!(derived.cosine <= base.cosine);
        prop_assert!(derived.embedding >= base.embedding);
    }

    /// Property: fewer than M history rows means base thresholds exactly
    #[test]
    fn prop_cold_start_uses_base(
        history in proptest::collection::vec(arb_metric_set(), 0..10)
    ) {
        let derived = derive_thresholds(&history, &ThresholdPolicy::default());

        prop_assert_eq!(derived.thresholds(), Thresholds::BASE);
        prop_assert!(derived.iter().all(|t| !t.is_adapted()));
    }
}
