//! Session-level aggregation of segment scores.

use poise_model::scoring::AggregationConfig;
use poise_model::segment::SegmentResult;
use poise_model::session::SessionScore;

/// Combines ordered segment results into one labelled session score.
#[derive(Debug, Clone, Copy)]
pub struct SegmentAggregator {
    config: AggregationConfig,
}

impl SegmentAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AggregationConfig::default())
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate a whole session. Each metric is trimmed independently.
    pub fn aggregate(&self, results: &[SegmentResult]) -> SessionScore {
        if results.is_empty() {
            tracing::warn!("Aggregating a session without segments");
        }

        let posture: Vec<f64> = results.iter().map(|r| r.posture_score).collect();
        let eye_contact: Vec<f64> = results.iter().map(|r| r.eye_contact_score).collect();

        let trimmed_mean_posture = self.trimmed_mean(&posture);
        let trimmed_mean_eye_contact = self.trimmed_mean(&eye_contact);
        let scale = self.config.rating_scale;

        let score = SessionScore {
            trimmed_mean_posture,
            trimmed_mean_eye_contact,
            posture_label: scale.label(trimmed_mean_posture),
            eye_contact_label: scale.label(trimmed_mean_eye_contact),
            segment_count: results.len(),
            segments_averaged: self.kept_count(results.len()),
        };

        tracing::info!(
            segments = score.segment_count,
            averaged = score.segments_averaged,
            posture = score.trimmed_mean_posture,
            eye_contact = score.trimmed_mean_eye_contact,
            "Session aggregated"
        );
        score
    }

    /// Mean after sorting ascending and dropping the lowest `trim_lowest`
    /// values. Only applies when there are more values than that; otherwise
    /// everything is averaged. An empty input averages to 0.
    pub fn trimmed_mean(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let kept = &sorted[values.len() - self.kept_count(values.len())..];
        kept.iter().sum::<f64>() / kept.len() as f64
    }

    fn kept_count(&self, n: usize) -> usize {
        if n > self.config.trim_lowest {
            n - self.config.trim_lowest
        } else {
            n
        }
    }
}

impl Default for SegmentAggregator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise_model::scoring::{RatingLabel, RatingScale};
    use poise_model::segment::Segment;

    fn result(index: usize, posture: f64, eye_contact: f64) -> SegmentResult {
        let start = index as f64 * 4.0;
        SegmentResult {
            segment: Segment {
                start_secs: start,
                end_secs: start + 4.0,
            },
            posture_score: posture,
            eye_contact_score: eye_contact,
            blink_rate: 0.0,
            gaze_variance: 0.0,
            frames_analyzed: 0,
            face_frames: 0,
            pose_frames: 0,
            blink_count: 0,
        }
    }

    #[test]
    fn test_twelve_segments_drop_lowest_ten() {
        let postures = [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 1.0, 2.0];
        let results: Vec<_> = postures
            .iter()
            .enumerate()
            .map(|(i, &p)| result(i, p, 3.0))
            .collect();

        let score = SegmentAggregator::with_defaults().aggregate(&results);
        assert_eq!(score.trimmed_mean_posture, 5.0);
        assert_eq!(score.posture_label, RatingLabel::Excellent);
        assert_eq!(score.segment_count, 12);
        assert_eq!(score.segments_averaged, 2);
    }

    #[test]
    fn test_ten_or_fewer_average_everything() {
        let aggregator = SegmentAggregator::with_defaults();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(aggregator.trimmed_mean(&values), 3.0);
        assert_eq!(aggregator.trimmed_mean(&[4.0]), 4.0);
    }

    #[test]
    fn test_eleven_segments_keep_only_the_best() {
        let aggregator = SegmentAggregator::with_defaults();
        let mut values = vec![1.0; 10];
        values.push(4.5);
        assert_eq!(aggregator.trimmed_mean(&values), 4.5);
    }

    #[test]
    fn test_metrics_are_trimmed_independently() {
        // Posture and eye contact peak on different segments.
        let results: Vec<_> = (0..12)
            .map(|i| result(i, if i == 0 { 5.0 } else { 1.0 }, if i == 11 { 4.0 } else { 0.0 }))
            .collect();
        let score = SegmentAggregator::with_defaults().aggregate(&results);
        assert_eq!(score.trimmed_mean_posture, 3.0);
        assert_eq!(score.trimmed_mean_eye_contact, 2.0);
    }

    #[test]
    fn test_order_does_not_matter() {
        let aggregator = SegmentAggregator::with_defaults();
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 2.0, 2.0, 5.0, 3.0, 5.0, 4.0, 1.0, 2.0];
        let mut reversed = values;
        reversed.reverse();
        assert_eq!(aggregator.trimmed_mean(&values), aggregator.trimmed_mean(&reversed));
    }

    #[test]
    fn test_empty_session_averages_to_zero() {
        let score = SegmentAggregator::with_defaults().aggregate(&[]);
        assert_eq!(score.trimmed_mean_posture, 0.0);
        assert_eq!(score.posture_label, RatingLabel::NeedsImprovement);
        assert_eq!(score.segments_averaged, 0);
    }

    #[test]
    fn test_configured_scale_and_trim() {
        let aggregator = SegmentAggregator::new(AggregationConfig {
            trim_lowest: 1,
            rating_scale: RatingScale::IntegerBucket,
        });
        let results = vec![result(0, 1.0, 1.0), result(1, 4.0, 3.0), result(2, 5.0, 4.0)];
        let score = aggregator.aggregate(&results);
        assert_eq!(score.trimmed_mean_posture, 4.5);
        assert_eq!(score.posture_label, RatingLabel::Good);
        assert_eq!(score.eye_contact_label, RatingLabel::Satisfactory);
    }
}
