//! Competitor profile: immutable stats and equipment for one runner.
//! Profiles are plain data created by external input surfaces; the simulation
//! never mutates them (per-trial modified stats live in `params`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::race::coefficients::{FitRank, Motivation, Style};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub name: String,
    pub speed: i32,
    pub stamina: i32,
    pub power: i32,
    pub guts: i32,
    pub wisdom: i32,
    pub motivation: Motivation,
    pub style: Style,
    pub distance_fit: FitRank,
    pub surface_fit: FitRank,
    pub style_fit: FitRank,
    pub popularity: i32,
    pub gate_number: i32,
    /// Equipped skill ids, resolved against the catalog at trial setup.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Default for CompetitorProfile {
    fn default() -> Self {
        Self {
            name: "(unnamed)".to_string(),
            speed: 1800,
            stamina: 1600,
            power: 1300,
            guts: 1200,
            wisdom: 1300,
            motivation: Motivation::Best,
            style: Style::Nige,
            distance_fit: FitRank::S,
            surface_fit: FitRank::A,
            style_fit: FitRank::A,
            popularity: 1,
            gate_number: 0,
            skills: Vec::new(),
        }
    }
}

impl CompetitorProfile {
    /// The style actually run. A front-runner holding a great-escape skill
    /// runs the great-escape variant; every other combination keeps the
    /// declared style.
    pub fn running_style(&self, has_oonige_skill: bool) -> Style {
        if self.style == Style::Nige && has_oonige_skill {
            Style::Oonige
        } else {
            self.style
        }
    }
}

/// Load a competitor profile from a YAML file. Returns `None` (with a stderr
/// note) when the file is missing or malformed, so callers can fall back to
/// defaults instead of aborting.
pub fn load_profile(path: impl AsRef<Path>) -> Option<CompetitorProfile> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("profile: could not read '{}': {err}", path.display());
            return None;
        }
    };
    match serde_yaml::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(err) => {
            eprintln!("profile: could not parse '{}': {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_style_upgrades_front_runner_with_great_escape() {
        let profile = CompetitorProfile::default();
        assert_eq!(profile.running_style(false), Style::Nige);
        assert_eq!(profile.running_style(true), Style::Oonige);

        let closer = CompetitorProfile {
            style: Style::Sasi,
            ..CompetitorProfile::default()
        };
        assert_eq!(closer.running_style(true), Style::Sasi);
    }

    #[test]
    fn profile_round_trips_through_yaml() {
        let profile = CompetitorProfile {
            skills: vec!["straightaway-adept".to_string()],
            ..CompetitorProfile::default()
        };
        let raw = serde_yaml::to_string(&profile).unwrap();
        let back: CompetitorProfile = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(back, profile);
    }
}
