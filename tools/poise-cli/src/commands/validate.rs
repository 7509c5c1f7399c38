//! Validate a session plan.

use std::path::PathBuf;

use poise_model::plan::SessionPlan;
use poise_model::scoring::PostureStrategy;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating plan at: {}", path.display());

    let plan =
        SessionPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?;

    println!("  Name: {}", plan.name);
    println!("  Segments: {}", plan.segments.len());
    println!("  Span: {:.1}s", plan.span_secs());

    let scoring = &plan.scoring;
    println!(
        "  Blink: EAR < {} for {} frame(s)",
        scoring.ear_threshold, scoring.consecutive_frames_threshold
    );
    println!("  Smoothing window: {}", scoring.smoothing_window_size);
    match scoring.posture {
        PostureStrategy::AngleBand { min_deg, max_deg } => {
            println!("  Posture: shoulder angle band {min_deg}°..{max_deg}°")
        }
        PostureStrategy::ContinuousAngle { reference } => {
            println!("  Posture: continuous angle against {reference:?}")
        }
    }
    println!(
        "  Rating: {:?}, dropping lowest {} above that many segments",
        scoring.aggregation.rating_scale, scoring.aggregation.trim_lowest
    );

    match plan.validate() {
        Ok(()) => {
            println!("\nPlan is valid.");
            Ok(())
        }
        Err(e) => {
            println!("\nValidation issue:");
            println!("  - {e}");
            anyhow::bail!("plan {} is invalid", path.display())
        }
    }
}
