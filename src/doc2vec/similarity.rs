// Vector similarity helpers.

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Opposite vectors score negative. Clamped to [-1, 1] to absorb rounding.
/// Mismatched lengths, empty input and zero vectors all give 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let denom = norm(a) * norm(b);
    if denom < f32::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Euclidean length.
pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let a = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_proportional() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_is_negative() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6, "got {sim}");
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = [1.0, 3.0, -2.0, 0.5];
        let b = [2.0, -1.0, 4.0, 0.0];
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_stays_within_bounds() {
        for scale in [1e-3_f32, 0.1, 0.7, 3.3, 1e3] {
            let a = [scale, scale * 1.1, scale * 0.3];
            let neg = [-scale, -scale * 1.1, -scale * 0.3];
            let same = cosine_similarity(&a, &a);
            let opposite = cosine_similarity(&a, &neg);
            assert!((-1.0..=1.0).contains(&same), "got {same}");
            assert!((-1.0..=1.0).contains(&opposite), "got {opposite}");
        }
    }
}
