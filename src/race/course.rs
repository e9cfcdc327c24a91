//! Course geometry: distance, straights, corners, and slope segments.
//! Descriptors are read-only and shared by every trial of a run.

use serde::{Deserialize, Serialize};

use crate::race::coefficients::{DistanceCategory, Surface, TrackCondition};

/// A straight or corner span, `[start, end)` in course meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }
}

/// A slope span. `grade` is the percent grade; positive is uphill. Grades with
/// absolute value below 1.0 are treated as flat by the stepper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeSegment {
    pub start: f64,
    pub end: f64,
    pub grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDescriptor {
    pub name: String,
    pub distance: u32,
    pub surface: Surface,
    pub condition: TrackCondition,
    pub straights: Vec<Segment>,
    pub corners: Vec<Segment>,
    pub slopes: Vec<SlopeSegment>,
    /// Which stats this course rewards (1 speed, 2 stamina, 3 power, 4 guts,
    /// 5 wisdom). Empty for neutral courses.
    #[serde(default)]
    pub rewarded_stats: Vec<u8>,
    /// Stable id used by `track_id` skill conditions.
    #[serde(default)]
    pub track_id: i32,
    /// Clockwise (1) or counterclockwise (2), for `rotation` conditions.
    #[serde(default = "default_turn")]
    pub turn: i32,
}

fn default_turn() -> i32 {
    1
}

impl CourseDescriptor {
    pub fn distance_category(&self) -> DistanceCategory {
        DistanceCategory::from_distance(self.distance)
    }

    /// True for round-number distances (multiples of 400 m).
    pub fn is_basis_distance(&self) -> bool {
        self.distance % 400 == 0
    }

    /// Grade at `position`, 0.0 outside every slope segment.
    pub fn slope_at(&self, position: f64) -> f64 {
        self.slopes
            .iter()
            .find(|slope| position >= slope.start && position <= slope.end)
            .map(|slope| slope.grade)
            .unwrap_or(0.0)
    }

    pub fn final_corner(&self) -> Option<&Segment> {
        self.corners.last()
    }

    pub fn final_straight(&self) -> Option<&Segment> {
        self.straights.last()
    }

    /// Corner number 1..=4 counted backwards from the last corner, or 0 when
    /// `position` is not inside a corner.
    pub fn corner_number(&self, position: f64) -> i32 {
        let Some(index) = self.corners.iter().position(|c| c.contains(position)) else {
            return 0;
        };
        ((16 + index - self.corners.len()) % 4) as i32 + 1
    }

    /// 0 outside straights; 1 for stand-side straights, 2 for the backstretch
    /// (alternating from the final straight backwards).
    pub fn straight_front_type(&self, position: f64) -> i32 {
        for (index, straight) in self.straights.iter().rev().enumerate() {
            if straight.contains(position) {
                return if index % 2 == 0 { 1 } else { 2 };
            }
        }
        0
    }

    /// Check the ordering invariants. Violations are reported as messages so
    /// a caller can surface all of them at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();
        let distance = self.distance as f64;
        let check_list = |issues: &mut Vec<String>, kind: &str, spans: Vec<(f64, f64)>| {
            let mut previous_end = f64::NEG_INFINITY;
            for (start, end) in spans {
                if start < 0.0 || end > distance {
                    issues.push(format!("{kind} segment [{start}, {end}] outside course"));
                }
                if end <= start {
                    issues.push(format!("{kind} segment [{start}, {end}] is empty or inverted"));
                }
                if start < previous_end {
                    issues.push(format!("{kind} segment starting at {start} overlaps previous"));
                }
                previous_end = end;
            }
        };
        check_list(
            &mut issues,
            "straight",
            self.straights.iter().map(|s| (s.start, s.end)).collect(),
        );
        check_list(
            &mut issues,
            "corner",
            self.corners.iter().map(|s| (s.start, s.end)).collect(),
        );
        check_list(
            &mut issues,
            "slope",
            self.slopes.iter().map(|s| (s.start, s.end)).collect(),
        );
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// A 2000 m turf course with two straights, four corners, and one slope
    /// each way. Used by the CLI defaults, tests, and benches.
    pub fn sample_turf_2000() -> Self {
        Self {
            name: "sample turf 2000".to_string(),
            distance: 2000,
            surface: Surface::Turf,
            condition: TrackCondition::Good,
            straights: vec![
                Segment { start: 0.0, end: 400.0 },
                Segment { start: 800.0, end: 1200.0 },
                Segment { start: 1600.0, end: 2000.0 },
            ],
            corners: vec![
                Segment { start: 400.0, end: 600.0 },
                Segment { start: 600.0, end: 800.0 },
                Segment { start: 1200.0, end: 1400.0 },
                Segment { start: 1400.0, end: 1600.0 },
            ],
            slopes: vec![
                SlopeSegment { start: 500.0, end: 700.0, grade: 1.5 },
                SlopeSegment { start: 1250.0, end: 1450.0, grade: -2.0 },
            ],
            rewarded_stats: vec![1, 3],
            track_id: 10001,
            turn: 1,
        }
    }

    /// A short 1400 m dirt course without slopes.
    pub fn sample_dirt_1400() -> Self {
        Self {
            name: "sample dirt 1400".to_string(),
            distance: 1400,
            surface: Surface::Dirt,
            condition: TrackCondition::Good,
            straights: vec![
                Segment { start: 0.0, end: 300.0 },
                Segment { start: 700.0, end: 1000.0 },
                Segment { start: 1150.0, end: 1400.0 },
            ],
            corners: vec![
                Segment { start: 300.0, end: 500.0 },
                Segment { start: 500.0, end: 700.0 },
                Segment { start: 1000.0, end: 1075.0 },
                Segment { start: 1075.0, end: 1150.0 },
            ],
            slopes: Vec::new(),
            rewarded_stats: vec![1],
            track_id: 10002,
            turn: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_courses_pass_validation() {
        assert!(CourseDescriptor::sample_turf_2000().validate().is_ok());
        assert!(CourseDescriptor::sample_dirt_1400().validate().is_ok());
    }

    #[test]
    fn validation_reports_overlap_and_out_of_range() {
        let mut course = CourseDescriptor::sample_turf_2000();
        course.corners[1].start = 550.0;
        course.slopes.push(SlopeSegment { start: 1900.0, end: 2100.0, grade: 1.0 });
        let issues = course.validate().unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn corner_number_counts_back_from_final_corner() {
        let course = CourseDescriptor::sample_turf_2000();
        assert_eq!(course.corner_number(450.0), 1);
        assert_eq!(course.corner_number(700.0), 2);
        assert_eq!(course.corner_number(1300.0), 3);
        assert_eq!(course.corner_number(1500.0), 4);
        assert_eq!(course.corner_number(100.0), 0);
    }

    #[test]
    fn straight_front_type_alternates_from_final_straight() {
        let course = CourseDescriptor::sample_turf_2000();
        assert_eq!(course.straight_front_type(1800.0), 1);
        assert_eq!(course.straight_front_type(1000.0), 2);
        assert_eq!(course.straight_front_type(100.0), 1);
        assert_eq!(course.straight_front_type(500.0), 0);
    }

    #[test]
    fn slope_lookup_is_zero_off_segment() {
        let course = CourseDescriptor::sample_turf_2000();
        assert_eq!(course.slope_at(600.0), 1.5);
        assert_eq!(course.slope_at(1300.0), -2.0);
        assert_eq!(course.slope_at(0.0), 0.0);
    }
}
