use std::collections::BTreeMap;

use crate::models::reference::CareerRule;

/// How many careers a recommendation lists.
pub const TOP_CAREERS: usize = 3;

/// Weighted score of one career: Σ rating(subject) × weight.
/// Subjects without a rating contribute nothing. Saturates at the `i64`
/// bounds instead of overflowing on extreme weights.
pub fn score_career(ratings: &BTreeMap<String, u8>, rule: &CareerRule) -> i64 {
    rule.weights.iter().fold(0i64, |total, (subject, weight)| {
        let rating = i64::from(ratings.get(subject).copied().unwrap_or(0));
        total.saturating_add(rating.saturating_mul(*weight))
    })
}

/// Ranks careers by descending score and returns the top three names.
///
/// The sort is stable, so equal scores keep the order of `rules`.
pub fn recommend(ratings: &BTreeMap<String, u8>, rules: &[CareerRule]) -> Vec<String> {
    let mut scored: Vec<(&str, i64)> = rules
        .iter()
        .map(|rule| (rule.career.as_str(), score_career(ratings, rule)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(TOP_CAREERS)
        .map(|(career, _)| career.to_string())
        .collect()
}
