use super::types::{Impact, TopFactor};
use crate::logic::features::{FeatureOrder, FeatureRecord};

/// Keeps the share finite when every contribution is zero
const MASS_EPSILON: f64 = 1e-9;

/// Rank contributions by magnitude and keep the top `n`.
///
/// `contributions` is in FeatureOrder; entries without a name in `order`
/// are skipped. Severity is each feature's share of the total absolute
/// mass over all features, not just the ones kept.
pub fn rank(
    contributions: &[f64],
    order: &FeatureOrder,
    record: &FeatureRecord,
    n: usize,
) -> Vec<TopFactor> {
    let total: f64 = contributions.iter().filter(|c| c.is_finite()).map(|c| c.abs()).sum();

    let mut factors: Vec<TopFactor> = contributions
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_finite())
        .filter_map(|(i, &c)| {
            let name = order.name(i)?;
            Some(TopFactor {
                feature: name.to_string(),
                impact: Impact::from_share(c.abs() / (total + MASS_EPSILON)),
                value: record.numeric_or_zero(name),
                contribution: c,
            })
        })
        .collect();

    // Sort by magnitude DESC; stable, so equal magnitudes keep FeatureOrder
    factors.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    factors.truncate(n);
    factors
}
