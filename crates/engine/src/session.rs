//! Whole-session orchestration.
//!
//! A [`SessionRunner`] owns the frame source, landmark detector and pupil
//! locator for exactly one session. Segments run one after another with
//! fresh per-segment state; cancellation is honoured between segments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use poise_common::error::{PoiseError, PoiseResult};
use poise_model::scoring::ScoringConfig;
use poise_model::segment::{Segment, SegmentResult};
use poise_model::session::{SessionReport, SessionScore};

use crate::aggregate::SegmentAggregator;
use crate::pupil::PupilLocator;
use crate::segment::SegmentProcessor;
use crate::source::{FrameSource, LandmarkDetector};

/// Shared stop flag, checked before each segment starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a finished session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub segments: Vec<SegmentResult>,
    pub score: SessionScore,
}

impl SessionOutcome {
    pub fn into_report(self, name: impl Into<String>) -> SessionReport {
        SessionReport::new(name, self.segments, self.score)
    }
}

/// Runs one scoring session over an owned source and detector.
pub struct SessionRunner<S, D, L> {
    source: S,
    detector: D,
    locator: L,
    config: ScoringConfig,
    cancel: CancellationToken,
}

impl<S, D, L> SessionRunner<S, D, L>
where
    S: FrameSource,
    D: LandmarkDetector<S::Frame>,
    L: PupilLocator<S::Frame>,
{
    /// Take ownership of the session's resources. Fails on a configuration
    /// the engine cannot score with.
    pub fn new(source: S, detector: D, locator: L, config: ScoringConfig) -> PoiseResult<Self> {
        config
            .validate()
            .map_err(|e| PoiseError::config(e.to_string()))?;
        Ok(Self {
            source,
            detector,
            locator,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Score every segment in order, then aggregate.
    ///
    /// The source and detector are closed whether or not the run succeeds.
    pub fn run(mut self, segments: &[Segment]) -> PoiseResult<SessionOutcome> {
        let span = tracing::info_span!(
            "session",
            source = self.source.name(),
            detector = self.detector.name(),
            segments = segments.len()
        );
        let _enter = span.enter();

        let result = self.run_segments(segments);

        let source_closed = self.source.close();
        let detector_closed = self.detector.close();
        if let Err(e) = &source_closed {
            tracing::warn!(error = %e, "Failed to close frame source");
        }
        if let Err(e) = &detector_closed {
            tracing::warn!(error = %e, "Failed to close landmark detector");
        }

        let outcome = result?;
        source_closed?;
        detector_closed?;
        Ok(outcome)
    }

    fn run_segments(&mut self, segments: &[Segment]) -> PoiseResult<SessionOutcome> {
        let processor = SegmentProcessor::new(&self.config);
        let mut results = Vec::with_capacity(segments.len());

        for segment in segments {
            if self.cancel.is_cancelled() {
                tracing::info!(completed = results.len(), "Session cancelled");
                return Err(PoiseError::Cancelled {
                    completed: results.len(),
                });
            }
            let result = processor.process(
                segment,
                &mut self.source,
                &mut self.detector,
                &mut self.locator,
            )?;
            results.push(result);
        }

        let score = SegmentAggregator::new(self.config.aggregation).aggregate(&results);
        Ok(SessionOutcome {
            segments: results,
            score,
        })
    }
}
