pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, na, nb) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(d, aa, bb), (x, y)| {
            (d + (x * y), aa + (x * x), bb + (y * y))
        });

    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

/// Scores every row against `query`, best first. Equal scores keep row order.
pub fn top_k(query: &[f32], rows: &[Vec<f32>], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query, row)))
        .collect();

    // sort_by is stable, so ties stay in ascending index order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    scored
}

/// Best-scoring row; the lowest index wins a tie.
pub fn top_match(query: &[f32], rows: &[Vec<f32>]) -> Option<(usize, f32)> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query, row)))
        .fold(None, |best, (i, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((i, score)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_works_for_unit_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn top_match_selects_best_row() {
        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let (idx, score) = top_match(&[0.1, 0.9], &rows).expect("match");

        assert_eq!(idx, 1);
        assert!(score > 0.9);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        let rows = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]];

        assert_eq!(top_match(&[1.0, 0.0], &rows).map(|m| m.0), Some(1));
        let ranked: Vec<usize> = top_k(&[1.0, 0.0], &rows, 3).iter().map(|m| m.0).collect();
        assert_eq!(ranked, vec![1, 2, 0]);

        // all-zero query ties everything at 0.0
        assert_eq!(top_match(&[0.0, 0.0], &rows), Some((0, 0.0)));
    }

    #[test]
    fn top_match_on_no_rows_is_none() {
        assert!(top_match(&[1.0], &[]).is_none());
        assert!(top_k(&[1.0], &[], 5).is_empty());
    }
}
