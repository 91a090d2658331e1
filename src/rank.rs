//! Feature ordering by coefficient magnitude.
//!
//! Orderings are stable: equal magnitudes keep their input order, so badge
//! numbering is identical across repeated renders of the same payload.

use indexmap::IndexMap;

use crate::logging::log_ranking;

fn magnitude(value: f64) -> f64 {
    if value.is_finite() {
        value.abs()
    } else {
        0.0
    }
}

/// Sort `features` by descending |coefficient|. Features missing from
/// `vector` rank as 0.
pub fn rank_features(vector: &IndexMap<String, f64>, features: &[String]) -> Vec<String> {
    let score = |f: &String| magnitude(vector.get(f).copied().unwrap_or(0.0));
    let mut ranked = features.to_vec();
    // slice::sort_by is stable
    ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));
    log_ranking("features", &ranked);
    ranked
}

/// Ranked (feature, score) pairs, used for importance charts.
pub fn rank_scores(scores: &IndexMap<String, f64>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scores.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| magnitude(b.1).total_cmp(&magnitude(a.1)));
    ranked
}

pub fn top_n<T>(ranked: &[T], n: usize) -> &[T] {
    &ranked[..n.min(ranked.len())]
}

/// Feature importance ordered for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceRanking {
    pub ranked: Vec<(String, f64)>,
}

impl ImportanceRanking {
    pub fn from_scores(scores: &IndexMap<String, f64>) -> Self {
        let ranked = rank_scores(scores);
        let names: Vec<String> = ranked.iter().map(|(k, _)| k.clone()).collect();
        log_ranking("importance", &names);
        Self { ranked }
    }

    pub fn top(&self, n: usize) -> &[(String, f64)] {
        top_n(&self.ranked, n)
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ties_keep_input_order() {
        let v = vector(&[("a", 0.5), ("b", -0.5), ("c", 0.1)]);
        assert_eq!(rank_features(&v, &names(&["a", "b", "c"])), names(&["a", "b", "c"]));
        assert_eq!(rank_features(&v, &names(&["b", "a", "c"])), names(&["b", "a", "c"]));
    }

    #[test]
    fn test_orders_by_absolute_value() {
        let v = vector(&[("x", 0.9), ("y", -0.95), ("z", 0.0)]);
        assert_eq!(rank_features(&v, &names(&["x", "y", "z"])), names(&["y", "x", "z"]));
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let v = vector(&[("p1", 0.2), ("g2", -0.7), ("tau3", 0.2), ("g1", 0.45)]);
        let once = rank_features(&v, &names(&["p1", "g2", "tau3", "g1"]));
        let twice = rank_features(&v, &once);
        assert_eq!(once, twice);
        assert_eq!(once, names(&["g2", "g1", "p1", "tau3"]));
    }

    #[test]
    fn test_missing_coefficients_rank_as_zero() {
        let v = vector(&[("a", -0.1)]);
        assert_eq!(rank_features(&v, &names(&["ghost", "a"])), names(&["a", "ghost"]));
    }

    #[test]
    fn test_importance_top_three() {
        let scores = vector(&[
            ("g1", 0.05),
            ("tau1", 0.21),
            ("tau2", 0.19),
            ("p4", 0.02),
            ("tau3", 0.2),
        ]);
        let ranking = ImportanceRanking::from_scores(&scores);
        let top: Vec<&str> = ranking.top(3).iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(top, vec!["tau1", "tau3", "tau2"]);
        assert_eq!(ranking.top(10).len(), 5);
    }
}
