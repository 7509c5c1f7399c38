//! Score a recorded landmark track.

use std::path::{Path, PathBuf};

use poise_common::config::AppConfig;
use poise_common::error::PoiseError;
use poise_engine::pupil::IrisPupilLocator;
use poise_engine::source::{RecordedLandmarks, RecordedTrack};
use poise_engine::{SessionOutcome, SessionRunner};
use poise_model::plan::SessionPlan;
use poise_model::scoring::{
    EyeContactStrategy, PostureReference, PostureStrategy, RatingScale, ScoringConfig,
};

/// Strategy names given on the command line, applied over the plan's scoring.
#[derive(Debug, Default)]
pub struct ScoringOverrides {
    pub posture: Option<String>,
    pub eye_contact: Option<String>,
    pub rating: Option<String>,
}

impl ScoringOverrides {
    fn apply(&self, scoring: &mut ScoringConfig) -> anyhow::Result<()> {
        if let Some(posture) = self.posture.as_deref() {
            scoring.posture = parse_posture(posture, scoring.posture)?;
        }
        if let Some(eye_contact) = self.eye_contact.as_deref() {
            scoring.eye_contact = parse_eye_contact(eye_contact, scoring.eye_contact)?;
        }
        if let Some(rating) = self.rating.as_deref() {
            scoring.aggregation.rating_scale = parse_rating(rating)?;
        }
        Ok(())
    }
}

pub async fn run(
    config: &AppConfig,
    track: PathBuf,
    plan: Option<PathBuf>,
    segment_secs: f64,
    overrides: ScoringOverrides,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Scoring track: {}", track.display());

    let source = RecordedTrack::open(&track)?;

    let mut plan = match plan.or_else(|| config.default_plan.clone()) {
        Some(path) => {
            println!("  Plan: {}", path.display());
            SessionPlan::load(&path).map_err(|e| anyhow::anyhow!("Failed to load plan: {e}"))?
        }
        None => {
            let duration = source.duration_secs();
            if duration <= 0.0 {
                anyhow::bail!("Track {} has no frames to score", track.display());
            }
            println!("  Plan: uniform {segment_secs}s segments over {duration:.1}s");
            SessionPlan::uniform(session_name(&track), duration, segment_secs)
        }
    };

    overrides.apply(&mut plan.scoring)?;
    plan.validate()
        .map_err(|e| anyhow::anyhow!("Invalid plan: {e}"))?;

    println!("  Segments: {}", plan.segments.len());
    println!();

    let runner = SessionRunner::new(
        source,
        RecordedLandmarks,
        IrisPupilLocator,
        plan.scoring.clone(),
    )?;
    let token = runner.cancellation_token();
    let segments = plan.segments.clone();
    let mut handle = tokio::task::spawn_blocking(move || runner.run(&segments));

    let result = tokio::select! {
        joined = &mut handle => joined?,
        _ = tokio::signal::ctrl_c() => {
            println!("Stopping after the current segment...");
            token.cancel();
            handle.await?
        }
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(PoiseError::Cancelled { completed }) => {
            println!("Cancelled after {completed} segment(s). No report written.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    print_outcome(&outcome);

    let report_path = output.unwrap_or_else(|| {
        config
            .reports_dir
            .join(format!("{}.report.json", plan.name))
    });
    outcome
        .into_report(&plan.name)
        .save(&report_path)
        .map_err(|e| anyhow::anyhow!("Failed to write report: {e}"))?;
    println!();
    println!("Report saved to: {}", report_path.display());

    Ok(())
}

fn print_outcome(outcome: &SessionOutcome) {
    println!("Segments:");
    println!("  {:>15}  {:>7}  {:>11}  {:>6}  {:>9}", "window", "posture", "eye contact", "blinks", "gaze var");
    for r in &outcome.segments {
        println!(
            "  {:>6.1}s-{:>6.1}s  {:>7.2}  {:>11.0}  {:>6}  {:>9.2}",
            r.segment.start_secs,
            r.segment.end_secs,
            r.posture_score,
            r.eye_contact_score,
            r.blink_count,
            r.gaze_variance
        );
    }
    println!();

    let score = &outcome.score;
    println!(
        "Session ({} of {} segments averaged):",
        score.segments_averaged, score.segment_count
    );
    println!(
        "  Posture: {:.2} ({})",
        score.trimmed_mean_posture, score.posture_label
    );
    println!(
        "  Eye contact: {:.2} ({})",
        score.trimmed_mean_eye_contact, score.eye_contact_label
    );
}

fn session_name(track: &Path) -> String {
    track
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("session")
        .to_string()
}

/// Resolve a `--posture` name. A band already configured by the plan keeps
/// its limits.
fn parse_posture(value: &str, current: PostureStrategy) -> anyhow::Result<PostureStrategy> {
    match value {
        "band" => match current {
            PostureStrategy::AngleBand { .. } => Ok(current),
            PostureStrategy::ContinuousAngle { .. } => Ok(PostureStrategy::default()),
        },
        "hips" => Ok(PostureStrategy::ContinuousAngle {
            reference: PostureReference::Hips,
        }),
        "head" => Ok(PostureStrategy::ContinuousAngle {
            reference: PostureReference::Head,
        }),
        other => anyhow::bail!("Unknown posture strategy '{other}' (expected band, hips or head)"),
    }
}

/// Resolve an `--eye-contact` name. Weights already configured by the plan
/// are kept.
fn parse_eye_contact(
    value: &str,
    current: EyeContactStrategy,
) -> anyhow::Result<EyeContactStrategy> {
    match value {
        "gaze" => match current {
            EyeContactStrategy::GazeStability(_) => Ok(current),
            EyeContactStrategy::FaceCentreDistance => Ok(EyeContactStrategy::default()),
        },
        "centre" | "center" => Ok(EyeContactStrategy::FaceCentreDistance),
        other => anyhow::bail!("Unknown eye contact strategy '{other}' (expected gaze or centre)"),
    }
}

fn parse_rating(value: &str) -> anyhow::Result<RatingScale> {
    match value {
        "graded" => Ok(RatingScale::Graded),
        "bucket" => Ok(RatingScale::IntegerBucket),
        "lenient" => Ok(RatingScale::Lenient),
        other => anyhow::bail!("Unknown rating scale '{other}' (expected graded, bucket or lenient)"),
    }
}
