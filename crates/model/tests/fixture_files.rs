use std::path::PathBuf;

use poise_model::plan::SessionPlan;
use poise_model::track::{parse_track, serialize_track, LandmarkTrack, TRACK_SCHEMA_VERSION};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-session")
        .join(name)
}

#[test]
fn fixture_track_parses_with_header() {
    let track = LandmarkTrack::load(fixture_path("landmarks.jsonl")).expect("fixture track should load");
    let header = track.header.as_ref().expect("fixture track has a header");

    assert_eq!(header.schema_version, TRACK_SCHEMA_VERSION);
    assert_eq!((header.width, header.height), (640, 480));
    assert_eq!(track.frames.len(), 250);
    assert!(track.is_monotonic());
    assert!((track.duration_secs() - 24.95).abs() < 1e-9);
    assert!((track.face_coverage() - 0.8).abs() < 1e-9);
    assert_eq!(track.pose_coverage(), 1.0);
}

#[test]
fn fixture_track_survives_reserialization() {
    let track = LandmarkTrack::load(fixture_path("landmarks.jsonl")).unwrap();
    let jsonl = serialize_track(&track).unwrap();
    let reparsed = parse_track(&jsonl).unwrap();
    assert_eq!(reparsed, track);
}

#[test]
fn fixture_plan_is_valid() {
    let plan = SessionPlan::load(fixture_path("plan.json")).expect("fixture plan should load");
    plan.validate().expect("fixture plan should validate");
    assert_eq!(plan.segments.len(), 5);
    assert_eq!(plan.span_secs(), 25.0);
}
