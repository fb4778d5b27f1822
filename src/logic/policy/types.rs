//! Policy Types
//!
//! Recommended interventions. Data only.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Dropout Prevention Committee Review")]
    CommitteeReview,
    #[serde(rename = "Mandatory Counseling Session")]
    MandatoryCounseling,
    #[serde(rename = "Attendance Warning Letter")]
    AttendanceWarning,
    #[serde(rename = "Academic Support Program")]
    AcademicSupport,
    #[serde(rename = "Peer Tutoring Assignment")]
    PeerTutoring,
    #[serde(rename = "Class Engagement Initiative")]
    EngagementInitiative,
    #[serde(rename = "Assignment Remedial Plan")]
    AssignmentRemedial,
    #[serde(rename = "Financial Aid Counseling")]
    FinancialAidCounseling,
    /// Fallback when no rule fires
    #[serde(rename = "Regular Performance Monitoring")]
    RegularMonitoring,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::CommitteeReview => "Dropout Prevention Committee Review",
            Recommendation::MandatoryCounseling => "Mandatory Counseling Session",
            Recommendation::AttendanceWarning => "Attendance Warning Letter",
            Recommendation::AcademicSupport => "Academic Support Program",
            Recommendation::PeerTutoring => "Peer Tutoring Assignment",
            Recommendation::EngagementInitiative => "Class Engagement Initiative",
            Recommendation::AssignmentRemedial => "Assignment Remedial Plan",
            Recommendation::FinancialAidCounseling => "Financial Aid Counseling",
            Recommendation::RegularMonitoring => "Regular Performance Monitoring",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
