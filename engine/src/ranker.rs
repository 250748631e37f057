use rayon::prelude::*;
use std::collections::HashSet;
use std::hash::Hash;

use crate::sparse::{cosine, SparseView};

/// Filters and orders already-scored candidates:
/// excluded keys and scores below `min_score` are dropped (`min_score` is
/// inclusive, compared against the score widened to `f64`), the rest sorted
/// by score descending with ties kept in input order, then truncated to
/// `top_k`.
pub fn select_top_k<K>(scored: Vec<(K, f32)>, min_score: f64, exclude: &HashSet<K>, top_k: usize) -> Vec<(K, f32)>
where
    K: Eq + Hash,
{
    let mut kept: Vec<(K, f32)> = scored
        .into_iter()
        .filter(|(key, _)| !exclude.contains(key))
        .filter(|(_, score)| f64::from(*score) >= min_score)
        .collect();
    // Vec::sort_by is stable, which gives the input-order tie-break.
    kept.sort_by(|a, b| b.1.total_cmp(&a.1));
    kept.truncate(top_k);
    kept
}

/// Scores every candidate against `query` by cosine similarity and selects
/// the top results. Scoring runs in parallel; order is preserved before the
/// stable sort so ties stay deterministic.
pub fn rank<'a, K>(
    query: SparseView<'_>,
    candidates: Vec<(K, SparseView<'a>)>,
    min_score: f64,
    exclude: &HashSet<K>,
    top_k: usize,
) -> Vec<(K, f32)>
where
    K: Eq + Hash + Send,
{
    let scored: Vec<(K, f32)> = candidates
        .into_par_iter()
        .map(|(key, vector)| {
            let score = cosine(query, vector);
            (key, score)
        })
        .collect();
    select_top_k(scored, min_score, exclude, top_k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseVector;

    #[test]
    fn ties_preserve_input_order() {
        let scored = vec![("a", 0.5), ("b", 0.5), ("c", 0.9)];
        let ranked = select_top_k(scored, 0.0, &HashSet::new(), 3);
        let keys: Vec<&str> = ranked.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn min_score_is_inclusive() {
        let scored = vec![("a", 0.5), ("b", 0.4999), ("c", 0.7)];
        let ranked = select_top_k(scored, 0.5, &HashSet::new(), 10);
        let keys: Vec<&str> = ranked.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["c", "a"]);
    }

    #[test]
    fn min_score_compares_at_full_precision() {
        // 0.7f32 is just below 0.7; narrowing the bound to f32 would keep it.
        let scored = vec![("exact", 0.75f32), ("rounded", 0.7f32)];
        let ranked = select_top_k(scored.clone(), 0.7, &HashSet::new(), 10);
        assert_eq!(ranked, vec![("exact", 0.75)]);

        let ranked = select_top_k(scored, 0.75, &HashSet::new(), 10);
        assert_eq!(ranked, vec![("exact", 0.75)]);
    }

    #[test]
    fn exclusion_beats_high_score() {
        let scored = vec![("a", 0.1), ("b", 1.0)];
        let ranked = select_top_k(scored, 0.0, &HashSet::from(["b"]), 10);
        assert_eq!(ranked, vec![("a", 0.1)]);
    }

    #[test]
    fn top_k_truncates_and_oversized_returns_all() {
        let scored = vec![(1, 0.3), (2, 0.2), (3, 0.1)];
        assert_eq!(select_top_k(scored.clone(), 0.0, &HashSet::new(), 2).len(), 2);
        assert_eq!(select_top_k(scored, 0.0, &HashSet::new(), 10).len(), 3);
    }

    #[test]
    fn rank_scores_by_cosine() {
        let query = SparseVector::from_pairs(vec![(0, 1.0)]);
        let near = SparseVector::from_pairs(vec![(0, 1.0), (1, 0.1)]);
        let far = SparseVector::from_pairs(vec![(0, 0.1), (1, 1.0)]);
        let none = SparseVector::default();
        let candidates = vec![(0usize, none.view()), (1, far.view()), (2, near.view())];
        let ranked = rank(query.view(), candidates, 0.0, &HashSet::new(), 3);
        let keys: Vec<usize> = ranked.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![2, 1, 0]);
        assert_eq!(ranked[2].1, 0.0);
    }
}
