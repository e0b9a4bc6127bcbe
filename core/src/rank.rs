use crate::index::TfIdfMatrix;
use crate::ItemId;

/// Cosine similarity of two items, i.e. the dot product of their normalized rows.
///
/// Zero rows score 0. The result is clamped to [0, 1] to absorb float rounding.
pub fn score(matrix: &TfIdfMatrix, a: ItemId, b: ItemId) -> f32 {
    match (matrix.row(a), matrix.row(b)) {
        (Some(ra), Some(rb)) => ra.dot(rb).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Rank every other item against `query`. Scores descend, ties go to the lower id,
/// and at most `k` entries are returned. An unknown `query` ranks nothing.
pub fn rank(query: ItemId, matrix: &TfIdfMatrix, k: usize) -> Vec<(ItemId, f32)> {
    let Some(target) = matrix.row(query) else {
        return Vec::new();
    };
    let mut scored: Vec<(ItemId, f32)> = matrix
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| (i as ItemId, row))
        .filter(|(i, _)| *i != query)
        .map(|(i, row)| (i, target.dot(row).clamp(0.0, 1.0)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorIndex;
    use crate::tokenizer::TokenizerOptions;

    fn index(texts: &[&str]) -> VectorIndex {
        let blobs: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        VectorIndex::build(&blobs, &TokenizerOptions::default()).unwrap()
    }

    #[test]
    fn excludes_query_and_sorts_descending() {
        let idx = index(&["aamir khan drama", "aamir khan comedy", "romance musical", "aamir khan drama sports"]);
        let ranked = rank(0, idx.matrix(), 10);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|(id, _)| *id != 0));
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(ranked[0].0, 3);
        assert_eq!(ranked[2], (2, 0.0));
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let idx = index(&["khan", "zzz", "yyy", "xxx"]);
        let ranked = rank(0, idx.matrix(), 3);
        assert_eq!(ranked, vec![(1, 0.0), (2, 0.0), (3, 0.0)]);
    }

    #[test]
    fn truncates_to_k() {
        let idx = index(&["a1", "a1 b2", "a1 c3", "a1 d4"]);
        assert_eq!(rank(0, idx.matrix(), 2).len(), 2);
        assert!(rank(0, idx.matrix(), 0).is_empty());
        assert!(rank(99, idx.matrix(), 2).is_empty());
    }

    #[test]
    fn scores_are_symmetric_and_self_is_one() {
        let idx = index(&["aamir khan drama", "aamir khan comedy drama", "shah rukh khan", "   "]);
        let m = idx.matrix();
        for a in 0..4 {
            for b in 0..4 {
                assert_eq!(score(m, a, b), score(m, b, a));
            }
        }
        assert!((score(m, 0, 0) - 1.0).abs() < 1e-5);
        assert_eq!(score(m, 3, 3), 0.0);
    }
}
