//! Policy Engine
//!
//! Input: raw FeatureRecord + dropout probability
//! Output: ordered, never-empty list of recommendations

use super::rules::{apply_rules, RULES};
use super::types::Recommendation;
use crate::logic::features::FeatureRecord;

pub fn recommend(record: &FeatureRecord, dropout_probability: f64) -> Vec<Recommendation> {
    let mut recs = apply_rules(RULES, record, dropout_probability);
    if recs.is_empty() {
        recs.push(Recommendation::RegularMonitoring);
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_risk_student() {
        let record = FeatureRecord {
            backlogs: Some(4),
            attendance_pct: Some(40.0),
            ..Default::default()
        };
        assert_eq!(
            recommend(&record, 0.8),
            vec![
                Recommendation::CommitteeReview,
                Recommendation::MandatoryCounseling,
                Recommendation::AttendanceWarning,
            ]
        );
    }

    #[test]
    fn test_no_rule_fires() {
        let record = FeatureRecord {
            backlogs: Some(0),
            attendance_pct: Some(92.0),
            semester_gpa: Some(8.1),
            study_hours_per_week: Some(20.0),
            participation_score: Some(7.0),
            assignment_score_avg: Some(81.0),
            financial_aid: Some(true),
            ..Default::default()
        };
        assert_eq!(recommend(&record, 0.05), vec![Recommendation::RegularMonitoring]);
        assert_eq!(recommend(&FeatureRecord::default(), 0.1), vec![Recommendation::RegularMonitoring]);
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let record = FeatureRecord {
            backlogs: Some(5),
            attendance_pct: Some(20.0),
            semester_gpa: Some(2.0),
            study_hours_per_week: Some(1.0),
            participation_score: Some(0.5),
            assignment_score_avg: Some(15.0),
            financial_aid: Some(true),
            ..Default::default()
        };
        let recs = recommend(&record, 0.95);
        assert_eq!(recs.len(), 8);
        assert_eq!(recs.first(), Some(&Recommendation::CommitteeReview));
        assert_eq!(recs.last(), Some(&Recommendation::FinancialAidCounseling));
        assert!(!recs.contains(&Recommendation::RegularMonitoring));
    }

    #[test]
    fn test_serialized_labels() {
        let json = serde_json::to_string(&recommend(&FeatureRecord::default(), 0.0)).unwrap();
        assert_eq!(json, "[\"Regular Performance Monitoring\"]");
    }
}
