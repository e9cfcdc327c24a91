//! Write a frame trace to CSV for external reporting and charting tools.

use std::error::Error;
use std::path::Path;

use crate::race::skills::SkillCatalog;
use crate::race::state::{FrameRecord, PositionKeepState};

fn position_keep_label(state: PositionKeepState) -> &'static str {
    match state {
        PositionKeepState::None => "",
        PositionKeepState::SpeedUp => "speed_up",
        PositionKeepState::Overtake => "overtake",
        PositionKeepState::PaceUp => "pace_up",
        PositionKeepState::PaceDown => "pace_down",
    }
}

fn skill_names(catalog: &SkillCatalog, indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| catalog.get(i).name.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

/// One row per frame; skill columns hold `|`-joined skill names.
pub fn write_frame_trace(
    path: impl AsRef<Path>,
    frames: &[FrameRecord],
    catalog: &SkillCatalog,
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "frame",
        "time_s",
        "position_m",
        "speed",
        "target_speed",
        "acceleration",
        "consumption",
        "stamina",
        "lane",
        "start_dash",
        "temptation",
        "downhill_mode",
        "position_keep",
        "spurting",
        "triggered",
        "ended",
        "operating",
        "pace_maker_position",
    ])?;
    for frame in frames {
        writer.write_record([
            frame.frame.to_string(),
            format!("{:.4}", frame.frame as f64 / 15.0),
            format!("{:.3}", frame.position),
            format!("{:.4}", frame.speed),
            format!("{:.4}", frame.target_speed),
            format!("{:.4}", frame.acceleration),
            format!("{:.4}", frame.consumption),
            format!("{:.3}", frame.stamina),
            format!("{:.2}", frame.lane),
            frame.start_dash.to_string(),
            frame.temptation.to_string(),
            frame.downhill_mode.to_string(),
            position_keep_label(frame.position_keep).to_string(),
            frame.spurting.to_string(),
            skill_names(catalog, &frame.triggered_skills),
            skill_names(catalog, &frame.ended_skills),
            skill_names(catalog, &frame.operating_skills),
            frame
                .pace_maker_position
                .map(|p| format!("{p:.3}"))
                .unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::course::CourseDescriptor;
    use crate::race::profile::CompetitorProfile;
    use crate::race::stepper::{run_trial, RaceConfig};

    #[test]
    fn trace_writes_one_row_per_frame() {
        let config = RaceConfig::new(
            CompetitorProfile::default(),
            CourseDescriptor::sample_dirt_1400(),
        );
        let catalog = SkillCatalog::builtin();
        let output = run_trial(&config, &catalog, 5, true);
        let frames = output.frames.unwrap();

        let dir = std::env::temp_dir().join("furlong_trace_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trace.csv");
        write_frame_trace(&path, &frames, &catalog).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), frames.len() + 1);
        assert!(written.starts_with("frame,time_s,position_m"));
        std::fs::remove_file(&path).ok();
    }
}
