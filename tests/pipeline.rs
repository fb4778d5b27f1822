use std::path::Path;
use std::sync::{Arc, OnceLock};

use student_risk_core::logic::dataset::{generate, read_jsonl};
use student_risk_core::logic::explain::Impact;
use student_risk_core::logic::model::{CandidateKind, RiskCategory};
use student_risk_core::logic::policy::Recommendation;
use student_risk_core::logic::registry::Registry;
use student_risk_core::logic::service::{BatchItem, PARTIAL_DATA_FLAG};
use student_risk_core::logic::train::{train_and_publish, TrainConfig};
use student_risk_core::{ChampionSlot, Config, FeatureRecord, RegistryStore, Scorer, ScoringError};
use tempfile::TempDir;

struct Published {
    dir: TempDir,
    registry: Registry,
}

fn config_for(dir: &Path) -> Config {
    Config::default().with_model_dir(dir)
}

/// Full candidate set trained once and shared by the read-only tests
fn published() -> &'static Published {
    static PUBLISHED: OnceLock<Published> = OnceLock::new();
    PUBLISHED.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::from_config(&config_for(dir.path()));
        let (registry, _) = train_and_publish(&generate(600, 42), TrainConfig::default(), &store).unwrap();
        Published { dir, registry }
    })
}

fn scorer() -> Scorer {
    let config = config_for(published().dir.path());
    Scorer::load(&RegistryStore::from_config(&config), &config).unwrap()
}

fn struggling_student(id: &str) -> FeatureRecord {
    FeatureRecord {
        student_id: Some(id.into()),
        age: Some(21),
        gender: Some("Male".into()),
        department: Some("ME".into()),
        semester: Some(4),
        attendance_pct: Some(38.0),
        assignment_score_avg: Some(35.0),
        internal_marks_avg: Some(33.0),
        semester_gpa: Some(3.4),
        study_hours_per_week: Some(3.0),
        participation_score: Some(2.0),
        prev_semester_gpa: Some(3.9),
        backlogs: Some(4),
        financial_aid: Some(true),
    }
}

fn thriving_student(id: &str) -> FeatureRecord {
    FeatureRecord {
        student_id: Some(id.into()),
        age: Some(20),
        gender: Some("Female".into()),
        department: Some("CS".into()),
        semester: Some(3),
        attendance_pct: Some(95.0),
        assignment_score_avg: Some(88.0),
        internal_marks_avg: Some(86.0),
        semester_gpa: Some(9.1),
        study_hours_per_week: Some(28.0),
        participation_score: Some(8.5),
        prev_semester_gpa: Some(8.9),
        backlogs: Some(0),
        financial_aid: Some(false),
    }
}

// ============================================================================
// TRAINING + REGISTRY
// ============================================================================

#[test]
fn test_training_records_every_candidate() {
    let registry = &published().registry;

    assert_eq!(registry.all_models.len(), CandidateKind::ALL.len());
    assert_eq!(registry.all_models.iter().filter(|m| m.is_champion).count(), 1);
    assert_eq!(registry.champion.model_version, "v1.0");
    assert_eq!(registry.champion.label_map["At Risk"], 2);
    assert_eq!(registry.champion.feature_order.len(), 13);
    assert!(registry.champion.feature_order.index_of("student_id").is_none());

    let best_f1 = registry
        .all_models
        .iter()
        .map(|m| m.metrics.f1_at_risk)
        .fold(f64::MIN, f64::max);
    assert_eq!(registry.champion.metrics.f1_at_risk, best_f1);
    assert!(registry.champion.metrics.accuracy >= 0.7, "{:?}", registry.champion.metrics);
}

#[test]
fn test_metrics_are_rounded() {
    for m in &published().registry.all_models {
        for v in [m.metrics.accuracy, m.metrics.roc_auc, m.metrics.f1_at_risk, m.metrics.macro_f1] {
            assert!((v * 10_000.0 - (v * 10_000.0).round()).abs() < 1e-6, "{}", v);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}

// ============================================================================
// SCORING
// ============================================================================

#[test]
fn test_assessment_shape() {
    let scorer = scorer();
    let assessment = scorer.assess(&struggling_student("S-1")).unwrap();

    let sum: f64 = assessment.probabilities.as_array().iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    assert!(assessment.probabilities.as_array().iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(assessment.dropout_probability, assessment.probabilities.get(RiskCategory::AtRisk));
    assert_eq!(assessment.confidence, assessment.probabilities.get(assessment.category));

    assert_eq!(assessment.student_id.as_deref(), Some("S-1"));
    assert_eq!(assessment.model_version, "v1.0");
    assert_eq!(assessment.data_quality_flag, None);
    assert!(assessment.top_factors.len() <= 3);
    for pair in assessment.top_factors.windows(2) {
        assert!(pair[0].contribution.abs() >= pair[1].contribution.abs());
    }
    assert!(assessment.interventions.contains(&Recommendation::MandatoryCounseling));
    assert!(assessment.interventions.contains(&Recommendation::AttendanceWarning));
}

#[test]
fn test_risk_ordering() {
    let scorer = scorer();
    let bad = scorer.assess(&struggling_student("S-1")).unwrap();
    let good = scorer.assess(&thriving_student("S-2")).unwrap();

    assert_eq!(bad.category, RiskCategory::AtRisk);
    assert_eq!(good.category, RiskCategory::High);
    assert!(bad.dropout_probability > good.dropout_probability);
    assert_eq!(good.interventions, vec![Recommendation::RegularMonitoring]);
}

#[test]
fn test_unseen_category_is_scored() {
    let scorer = scorer();
    let record = FeatureRecord {
        department: Some("Astrophysics".into()),
        gender: Some("Nonbinary".into()),
        ..thriving_student("S-3")
    };
    assert!(scorer.assess(&record).is_ok());
}

#[test]
fn test_partial_record_is_flagged() {
    let scorer = scorer();
    let record = FeatureRecord {
        study_hours_per_week: None,
        participation_score: None,
        ..thriving_student("S-4")
    };
    let assessment = scorer.assess(&record).unwrap();
    assert_eq!(assessment.data_quality_flag.as_deref(), Some(PARTIAL_DATA_FLAG));
}

#[test]
fn test_sparse_record_is_rejected_not_unavailable() {
    let scorer = scorer();
    let record = FeatureRecord { student_id: Some("S-5".into()), ..Default::default() };

    let err = scorer.assess(&record).unwrap_err();
    assert!(matches!(err, ScoringError::InsufficientData { .. }));
    assert!(!err.is_model_unavailable());

    // The ungated path still imputes and scores
    assert!(scorer.score(&record).is_ok());
}

#[test]
fn test_attribution_factors_have_values() {
    let scorer = scorer();
    let record = struggling_student("S-6");
    let assessment = scorer.assess(&record).unwrap();

    for factor in &assessment.top_factors {
        assert_eq!(factor.value, record.numeric_or_zero(&factor.feature));
        assert!(matches!(factor.impact, Impact::High | Impact::Medium | Impact::Low));
    }
}

#[test]
fn test_shared_scorer_across_threads() {
    let scorer = Arc::new(scorer());
    let expected = scorer.assess(&struggling_student("T")).unwrap().dropout_probability;

    std::thread::scope(|s| {
        for _ in 0..4 {
            let scorer = Arc::clone(&scorer);
            s.spawn(move || {
                for _ in 0..10 {
                    let got = scorer.assess(&struggling_student("T")).unwrap().dropout_probability;
                    assert_eq!(got, expected);
                }
            });
        }
    });
    assert_eq!(scorer.status().inference_count, 41);
}

// ============================================================================
// BATCH
// ============================================================================

#[test]
fn test_batch_isolates_bad_row() {
    let scorer = scorer();
    let mut records: Vec<FeatureRecord> = (0..5).map(|i| thriving_student(&format!("B-{}", i))).collect();
    records[2].age = Some(200);

    let report = scorer.assess_batch(&records);

    assert_eq!(report.assessments.len(), 4);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].field.as_deref(), Some("age"));
    let rows: Vec<usize> = report.assessments.iter().map(|a| a.row).collect();
    assert_eq!(rows, vec![0, 1, 3, 4]);
}

#[test]
fn test_batch_row_missing_identifier() {
    let scorer = scorer();
    let mut records: Vec<FeatureRecord> = (0..5).map(|i| thriving_student(&format!("M-{}", i))).collect();
    records[1].student_id = None;

    let report = scorer.assess_batch(&records);

    assert_eq!(report.assessments.len(), 4);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 1);
    assert_eq!(report.errors[0].field.as_deref(), Some("student_id"));
    assert!(report.assessments.iter().all(|a| a.row != 1));
}

#[test]
fn test_batch_row_mostly_empty() {
    let scorer = scorer();
    let mut records: Vec<FeatureRecord> = (0..4).map(|i| thriving_student(&format!("E-{}", i))).collect();
    records[3] = FeatureRecord {
        student_id: Some("E-3".into()),
        age: Some(22),
        semester_gpa: Some(6.0),
        ..Default::default()
    };

    let report = scorer.assess_batch(&records);

    assert_eq!(report.assessments.len(), 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert_eq!(report.errors[0].field, None);
    assert!(report.errors[0].error.starts_with("insufficient data"));
    assert!(matches!(
        scorer.assess(&records[3]),
        Err(ScoringError::InsufficientData { .. })
    ));
}

#[test]
fn test_batch_keeps_last_duplicate() {
    let scorer = scorer();
    let records = vec![
        thriving_student("D-1"),
        thriving_student("D-2"),
        struggling_student("D-1"),
    ];

    let report = scorer.assess_batch(&records);

    assert_eq!(report.duplicates_dropped, vec![0]);
    assert_eq!(report.assessments.len(), 2);
    let d1 = report.assessments.iter().find(|a| a.row == 2).unwrap();
    assert_eq!(d1.assessment.student_id.as_deref(), Some("D-1"));
}

#[test]
fn test_batch_appends_to_log() {
    let scorer = scorer();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("history.jsonl");

    let first = scorer.assess_batch(&[thriving_student("L-1"), struggling_student("L-2")]);
    let second = scorer.assess_batch(&[FeatureRecord { age: Some(200), ..thriving_student("L-3") }]);
    assert_eq!(first.append_to(&log).unwrap(), 2);
    assert_eq!(second.append_to(&log).unwrap(), 0);
    let third = scorer.assess_batch(&[thriving_student("L-4")]);
    assert_eq!(third.append_to(&log).unwrap(), 1);

    let logged: Vec<BatchItem> = read_jsonl(&log).unwrap();
    let ids: Vec<Option<String>> = logged.into_iter().map(|i| i.assessment.student_id).collect();
    assert_eq!(ids, vec![Some("L-1".into()), Some("L-2".into()), Some("L-4".into())]);
}

#[test]
fn test_batch_unreadable_row() {
    let scorer = scorer();
    let good = thriving_student("R-1");
    let rows: Vec<Result<&FeatureRecord, &str>> = vec![Ok(&good), Err("expected value at line 1")];

    let report = scorer.assess_rows(rows);
    assert_eq!(report.assessments.len(), 1);
    assert_eq!(report.errors[0].row, 1);
    assert_eq!(report.errors[0].field, None);
}

// ============================================================================
// AVAILABILITY + RELOAD
// ============================================================================

#[test]
fn test_no_model_is_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let store = RegistryStore::from_config(&config);

    let err = Scorer::load(&store, &config).unwrap_err();
    assert!(err.is_model_unavailable());

    let slot = ChampionSlot::open(&store, &config);
    assert!(slot.assess(&thriving_student("X")).unwrap_err().is_model_unavailable());

    let report = slot.metrics_report();
    assert!(report.drift_warning);
    assert_eq!(report.accuracy, 0.0);
    assert_eq!(report.roc_auc, 0.0);
}

#[test]
fn test_reload_swaps_champion() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let store = RegistryStore::from_config(&config);
    let quick = || TrainConfig {
        candidates: vec![CandidateKind::LogisticRegression],
        ..TrainConfig::default()
    };

    train_and_publish(&generate(200, 1), quick(), &store).unwrap();
    let slot = ChampionSlot::open(&store, &config);
    let before = slot.get().unwrap();
    assert_eq!(before.champion().model_version, "v1.0");

    train_and_publish(&generate(200, 2), quick(), &store).unwrap();
    let after = slot.reload(&store, &config).unwrap();

    assert_eq!(after.champion().model_version, "v2.0");
    assert_eq!(slot.get().unwrap().champion().model_version, "v2.0");
    // In-flight holders keep scoring with the old champion
    assert_eq!(before.assess(&thriving_student("Y")).unwrap().model_version, "v1.0");
    assert_eq!(slot.metrics_report().model_version, "v2.0");
}
