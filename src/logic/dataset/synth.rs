//! Synthetic cohort generator
//!
//! Correlated features drawn per hidden risk profile; the label comes from a
//! weighted performance score, so low attendance and many backlogs push a
//! student toward "At Risk". Fully determined by the seed.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::record::LabeledRecord;
use crate::logic::features::FeatureRecord;
use crate::logic::model::RiskCategory;

pub const DEFAULT_COHORT_SIZE: usize = 2000;

const DEPARTMENTS: &[&str] = &["CS", "ECE", "ME", "CE", "IT", "EE", "MBA"];
const GENDERS: &[(&str, f64)] = &[("Male", 0.55), ("Female", 0.42), ("Other", 0.03)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    Low,
    Medium,
    High,
}

/// (mean, std, min, max)
type Dist = (f64, f64, f64, f64);

struct ProfileShape {
    attendance: Dist,
    assignment: Dist,
    internal: Dist,
    gpa: Dist,
    study_hours: Dist,
    participation: Dist,
    /// (drift mean, drift std, min, max) applied on top of the semester GPA
    prev_gpa: Dist,
    backlogs: &'static [f64],
}

impl Profile {
    fn shape(self) -> ProfileShape {
        match self {
            Profile::Low => ProfileShape {
                attendance: (85.0, 8.0, 60.0, 100.0),
                assignment: (78.0, 8.0, 50.0, 100.0),
                internal: (76.0, 8.0, 50.0, 100.0),
                gpa: (8.2, 0.7, 6.0, 10.0),
                study_hours: (22.0, 5.0, 10.0, 50.0),
                participation: (7.5, 1.2, 4.0, 10.0),
                prev_gpa: (0.0, 0.3, 5.0, 10.0),
                backlogs: &[0.92, 0.08],
            },
            Profile::Medium => ProfileShape {
                attendance: (72.0, 10.0, 50.0, 90.0),
                assignment: (62.0, 10.0, 40.0, 85.0),
                internal: (60.0, 10.0, 40.0, 82.0),
                gpa: (6.5, 0.8, 4.5, 8.5),
                study_hours: (14.0, 5.0, 5.0, 30.0),
                participation: (5.5, 1.5, 2.0, 8.0),
                prev_gpa: (-0.2, 0.4, 4.0, 9.0),
                backlogs: &[0.50, 0.30, 0.15, 0.05],
            },
            Profile::High => ProfileShape {
                attendance: (50.0, 12.0, 20.0, 75.0),
                assignment: (44.0, 12.0, 20.0, 65.0),
                internal: (42.0, 12.0, 20.0, 62.0),
                gpa: (4.2, 1.0, 2.0, 6.5),
                study_hours: (7.0, 4.0, 1.0, 20.0),
                participation: (3.2, 1.5, 0.0, 6.0),
                prev_gpa: (-0.5, 0.5, 2.0, 7.5),
                backlogs: &[0.10, 0.15, 0.20, 0.25, 0.20, 0.10],
            },
        }
    }
}

/// Box-Muller standard normal
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn clipped(rng: &mut StdRng, (mean, std, min, max): Dist) -> f64 {
    (mean + std * standard_normal(rng)).clamp(min, max)
}

/// Index drawn from a discrete distribution
fn choose(rng: &mut StdRng, weights: &[f64]) -> usize {
    let mut roll: f64 = rng.gen::<f64>() * weights.iter().sum::<f64>();
    for (i, w) in weights.iter().enumerate() {
        if roll < *w {
            return i;
        }
        roll -= w;
    }
    weights.len().saturating_sub(1)
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

/// Weighted performance score → label
pub fn label_for(attendance: f64, gpa: f64, assignment: f64, internal: f64, study_hours: f64, backlogs: u32) -> RiskCategory {
    let score = 0.30 * (attendance / 100.0)
        + 0.20 * (gpa / 10.0)
        + 0.15 * (assignment / 100.0)
        + 0.15 * (internal / 100.0)
        + 0.10 * (study_hours / 50.0)
        + 0.10 * (1.0 - backlogs as f64 / 5.0).max(0.0);

    if score >= 0.68 {
        RiskCategory::High
    } else if score >= 0.48 {
        RiskCategory::Medium
    } else {
        RiskCategory::AtRisk
    }
}

pub fn generate(n: usize, seed: u64) -> Vec<LabeledRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let gender_weights: Vec<f64> = GENDERS.iter().map(|(_, w)| *w).collect();

    (0..n)
        .map(|i| {
            let student_id = format!("STU-{}-{:04}", 2022 + i / 500, i + 1);
            let age = rng.gen_range(18..28);
            let gender = GENDERS[choose(&mut rng, &gender_weights)].0;
            let department = DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())];
            let semester = rng.gen_range(1..9);
            let financial_aid = rng.gen_bool(0.3);

            let profile = [Profile::High, Profile::Medium, Profile::Low][choose(&mut rng, &[0.25, 0.40, 0.35])];
            let shape = profile.shape();

            let attendance = clipped(&mut rng, shape.attendance);
            let assignment = clipped(&mut rng, shape.assignment);
            let internal = clipped(&mut rng, shape.internal);
            let gpa = clipped(&mut rng, shape.gpa);
            let study_hours = clipped(&mut rng, shape.study_hours);
            let participation = clipped(&mut rng, shape.participation);
            let (drift, drift_std, lo, hi) = shape.prev_gpa;
            let prev_gpa = clipped(&mut rng, (gpa + drift, drift_std, lo, hi));
            let backlogs = choose(&mut rng, shape.backlogs) as u32;

            let label = label_for(attendance, gpa, assignment, internal, study_hours, backlogs);

            LabeledRecord::new(
                FeatureRecord {
                    student_id: Some(student_id),
                    age: Some(age),
                    gender: Some(gender.to_string()),
                    department: Some(department.to_string()),
                    semester: Some(semester),
                    attendance_pct: Some(round_to(attendance, 2)),
                    assignment_score_avg: Some(round_to(assignment, 2)),
                    internal_marks_avg: Some(round_to(internal, 2)),
                    semester_gpa: Some(round_to(gpa, 2)),
                    study_hours_per_week: Some(round_to(study_hours, 1)),
                    participation_score: Some(round_to(participation, 2)),
                    prev_semester_gpa: Some(round_to(prev_gpa, 2)),
                    backlogs: Some(backlogs),
                    financial_aid: Some(financial_aid),
                },
                label,
            )
        })
        .collect()
}
