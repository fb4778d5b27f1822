//! Stratified, seeded train/test split

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::TrainError;
use crate::logic::model::RiskCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Per-class shuffle, then take `round(n_class * test_fraction)` rows (at
/// least one, never all) into the test side. Indices come back sorted.
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> Result<Split, TrainError> {
    if labels.is_empty() {
        return Err(TrainError::EmptyDataset);
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (label, mut rows) in by_class {
        if rows.len() < 2 {
            let name = RiskCategory::from_index(label)
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| label.to_string());
            return Err(TrainError::ClassTooSmall(name));
        }

        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64 * fraction).round() as usize).clamp(1, rows.len() - 1);
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}
