//! Show landmark track information.

use std::path::PathBuf;

use poise_model::track::LandmarkTrack;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let track =
        LandmarkTrack::load(&path).map_err(|e| anyhow::anyhow!("Failed to load track: {e}"))?;

    println!("Track: {}", path.display());
    match &track.header {
        Some(header) => {
            println!("  Schema: {}", header.schema_version);
            println!(
                "  Resolution: {}x{} @ {}fps",
                header.width, header.height, header.fps
            );
            if let Some(source) = &header.source {
                println!("  Source: {source}");
            }
        }
        None => println!("  Header: (none)"),
    }
    println!();

    println!("Frames:");
    println!("  Count: {}", track.frames.len());
    println!("  Duration: {:.2}s", track.duration_secs());
    println!("  Face coverage: {:.1}%", track.face_coverage() * 100.0);
    println!("  Pose coverage: {:.1}%", track.pose_coverage() * 100.0);
    if !track.is_monotonic() {
        println!("  Warning: timestamps are not monotonic; scoring will refuse this track");
    }

    Ok(())
}
