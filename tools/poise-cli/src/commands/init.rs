//! Create a new session plan.

use std::path::PathBuf;

use poise_model::plan::SessionPlan;

pub fn run(name: String, duration: f64, segment_secs: f64, output: PathBuf) -> anyhow::Result<()> {
    let plan = SessionPlan::uniform(&name, duration, segment_secs);
    plan.validate()
        .map_err(|e| anyhow::anyhow!("Cannot build plan: {e}"))?;

    let path = output.join(format!("{name}.plan.json"));
    println!("Creating plan '{}' at {}", name, path.display());

    plan.save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write plan: {e}"))?;

    println!("Plan created successfully:");
    println!("  Segments: {}", plan.segments.len());
    println!("  Segment length: {segment_secs}s");
    println!("  Span: {:.1}s", plan.span_secs());
    println!();
    println!("Edit the \"scoring\" section to change thresholds or policies.");

    Ok(())
}
