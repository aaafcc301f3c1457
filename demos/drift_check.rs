//! Drift Check Demo
//!
//! Simulates a day of healthy inference traffic for one model, runs hourly
//! drift checks so the adaptive thresholds learn the model's normal
//! variability, then injects a confidence collapse and checks again.
//!
//! Run with: RUST_LOG=trueno_drift=debug cargo run --example drift_check

use chrono::{Duration, Utc};
use rand::Rng;
use trueno_drift::orchestrator::{DriftEvaluation, DriftOrchestrator, DriftRequest};
use trueno_drift::source::{InferenceEvent, MemorySampleSource};
use trueno_drift::store::{DriftStore, MemoryDriftStore};
use trueno_drift::telemetry::init_tracing;
use trueno_drift::DriftConfig;

const MODEL_ID: i64 = 1;

fn embedding(rng: &mut impl Rng, center: f32) -> Vec<f32> {
    (0..16).map(|_| center + rng.gen_range(-0.1..0.1)).collect()
}

fn print_evaluation(label: &str, evaluation: &DriftEvaluation) {
    let r = &evaluation.response;
    println!("   {label}");
    println!(
        "     samples: {} recent / {} baseline",
        r.sample_count, r.baseline_count
    );
    println!(
        "     kl={:.6} (≤ {:.4})  cosine={:.6} (≥ {:.4})  embedding={}",
        r.kl_divergence,
        r.thresholds.kl,
        r.cosine_similarity,
        r.thresholds.cosine,
        r.embedding_drift
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:.6}"))
    );
    println!(
        "     drift: {}  status: {:?}",
        r.drift_detected, evaluation.assessment.status
    );
    println!("     → {}", evaluation.assessment.recommendation);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("trueno_drift=warn");
    println!("=== Trueno-Drift Adaptive Drift Check ===\n");

    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let source = MemorySampleSource::new();

    // -------------------------------------------------------------------------
    // 1. A day of healthy traffic (~0.85 confidence)
    // -------------------------------------------------------------------------
    println!("1. Seeding 24h of healthy inference traffic...");
    for minute in 1..=(24 * 60) {
        let at = now - Duration::minutes(minute);
        let confidence = rng.gen_range(0.75..0.95);
        source.record(
            InferenceEvent::new(MODEL_ID, at)
                .confidence(confidence)
                .embedding(embedding(&mut rng, 0.5)),
        );
    }
    println!("   {} events recorded\n", source.len());

    let orchestrator =
        DriftOrchestrator::new(DriftConfig::from_env()?, source, MemoryDriftStore::new())?;

    // -------------------------------------------------------------------------
    // 2. Hourly checks build the eligible history
    // -------------------------------------------------------------------------
    println!("2. Running hourly drift checks over the last 12h...");
    let request = DriftRequest::new(MODEL_ID).windows(60, 720);
    for hours_ago in (1..=12).rev() {
        let evaluation = orchestrator
            .detect_at(&request, now - Duration::hours(hours_ago))
            .await?;
        if hours_ago == 1 {
            print_evaluation("latest healthy check", &evaluation);
        }
    }

    let thresholds = orchestrator.store().current_thresholds(MODEL_ID).await?;
    println!("\n   Current thresholds:");
    for state in &thresholds {
        println!(
            "     {:<18} {:.4} (base {:.4}, adapted: {}, n={})",
            state.metric().as_str(),
            state.threshold(),
            state.base(),
            state.adapted(),
            state.sample_count()
        );
    }

    // -------------------------------------------------------------------------
    // 3. Confidence collapse in the last 30 minutes
    // -------------------------------------------------------------------------
    println!("\n3. Injecting a confidence collapse...");
    for second in (0..1800).step_by(10) {
        let at = now - Duration::seconds(second);
        orchestrator.source().record(
            InferenceEvent::new(MODEL_ID, at)
                .confidence(rng.gen_range(0.2..0.5))
                .embedding(embedding(&mut rng, -0.3)),
        );
    }

    let evaluation = orchestrator.detect_at(&request, now).await?;
    print_evaluation("post-incident check", &evaluation);
    println!("   persistence: {:?}", evaluation.persistence);

    // -------------------------------------------------------------------------
    // 4. Audit listing
    // -------------------------------------------------------------------------
    println!("\n4. Monitored models:");
    for model in orchestrator.store().list_models().await? {
        println!(
            "   model {} → {} runs, last at {}",
            model.model_id, model.run_count, model.last_updated
        );
    }

    println!("\nResponse JSON:");
    println!("{}", serde_json::to_string_pretty(&evaluation.response)?);

    Ok(())
}
