//! Intervention Rules
//!
//! Each rule is a pure function of the raw record and the dropout
//! probability. A rule whose input is absent (or not finite) yields `None`.
//! Table order is display priority.

use super::types::Recommendation;
use crate::logic::features::FeatureRecord;

pub type RuleFn = fn(&FeatureRecord, f64) -> Option<Recommendation>;

#[derive(Clone, Copy)]
pub struct InterventionRule {
    pub name: &'static str,
    pub evaluate: RuleFn,
}

fn when(condition: bool, rec: Recommendation) -> Option<Recommendation> {
    condition.then_some(rec)
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn committee_review(_: &FeatureRecord, p: f64) -> Option<Recommendation> {
    finite(Some(p)).and_then(|p| when(p >= 0.70, Recommendation::CommitteeReview))
}

fn mandatory_counseling(r: &FeatureRecord, _: f64) -> Option<Recommendation> {
    r.backlogs.and_then(|b| when(b >= 3, Recommendation::MandatoryCounseling))
}

fn attendance_warning(r: &FeatureRecord, _: f64) -> Option<Recommendation> {
    finite(r.attendance_pct).and_then(|a| when(a < 50.0, Recommendation::AttendanceWarning))
}

fn academic_support(r: &FeatureRecord, _: f64) -> Option<Recommendation> {
    finite(r.semester_gpa).and_then(|g| when(g < 4.5, Recommendation::AcademicSupport))
}

fn peer_tutoring(r: &FeatureRecord, _: f64) -> Option<Recommendation> {
    finite(r.study_hours_per_week).and_then(|h| when(h < 5.0, Recommendation::PeerTutoring))
}

fn engagement_initiative(r: &FeatureRecord, _: f64) -> Option<Recommendation> {
    finite(r.participation_score).and_then(|s| when(s < 3.0, Recommendation::EngagementInitiative))
}

fn assignment_remedial(r: &FeatureRecord, _: f64) -> Option<Recommendation> {
    finite(r.assignment_score_avg).and_then(|s| when(s < 40.0, Recommendation::AssignmentRemedial))
}

fn financial_aid_counseling(r: &FeatureRecord, p: f64) -> Option<Recommendation> {
    let aid = r.financial_aid?;
    let p = finite(Some(p))?;
    when(aid && p >= 0.5, Recommendation::FinancialAidCounseling)
}

pub const RULES: &[InterventionRule] = &[
    InterventionRule { name: "committee_review", evaluate: committee_review },
    InterventionRule { name: "mandatory_counseling", evaluate: mandatory_counseling },
    InterventionRule { name: "attendance_warning", evaluate: attendance_warning },
    InterventionRule { name: "academic_support", evaluate: academic_support },
    InterventionRule { name: "peer_tutoring", evaluate: peer_tutoring },
    InterventionRule { name: "engagement_initiative", evaluate: engagement_initiative },
    InterventionRule { name: "assignment_remedial", evaluate: assignment_remedial },
    InterventionRule { name: "financial_aid_counseling", evaluate: financial_aid_counseling },
];

/// Evaluate every rule in order; rules are independent and cumulative
pub fn apply_rules(rules: &[InterventionRule], record: &FeatureRecord, p: f64) -> Vec<Recommendation> {
    rules
        .iter()
        .filter_map(|rule| {
            let hit = (rule.evaluate)(record, p);
            if let Some(rec) = hit {
                log::trace!("Rule {} fired: {}", rule.name, rec);
            }
            hit
        })
        .collect()
}
