//! Relevance scoring of `(query, title, body)` (spec §4.6).

fn words(s: &str) -> Vec<&str> {
    s.split_ascii_whitespace().collect()
}

/// Score a single `(query, title, body)` triple, compared case-insensitively.
/// Always in `[0, 1]`.
pub fn score(query: &str, title: &str, body: &str) -> f64 {
    let q = query.to_lowercase();
    let t = title.to_lowercase();
    let b = body.to_lowercase();

    let mut s = 0.0;
    if t == q {
        s += 1.0;
    } else if t.contains(&q) {
        s += 0.7;
    }
    if b.contains(&q) {
        s += 0.3;
    }

    let qw = words(&q);
    if !qw.is_empty() {
        let tw: std::collections::HashSet<&str> = words(&t).into_iter().collect();
        let overlap = qw.iter().filter(|w| tw.contains(*w)).count();
        s += 0.5 * (overlap as f64 / qw.len() as f64);
    }

    s.min(1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn exact_match_scores_one() {
        assert_eq!(score("alpha", "alpha", ""), 1.0);
    }

    #[test]
    fn substring_title_match_scores_point_seven_plus_overlap() {
        // title "alpha beta" contains query "alpha"; word overlap = 1/1.
        // Raw sum is 0.7 + 0.5 = 1.2, clamped to 1.0 by the invariant-6 cap.
        assert_eq!(score("alpha", "alpha beta", ""), 1.0_f64);
    }

    #[test]
    fn body_substring_adds_point_three() {
        assert_eq!(score("alpha", "unrelated", "contains alpha somewhere"), 0.3);
    }

    #[test]
    fn no_match_scores_zero() {
        assert_eq!(score("alpha", "beta", "gamma"), 0.0);
    }

    #[test]
    fn case_is_ignored() {
        assert_eq!(score("Alpha", "ALPHA", ""), 1.0);
    }

    proptest! {
        #[test]
        fn score_is_always_in_unit_interval(q in ".{0,40}", t in ".{0,40}", b in ".{0,40}") {
            let s = score(&q, &t, &b);
            prop_assert!((0.0..=1.0).contains(&s), "score {s} out of range for q={q:?} t={t:?} b={b:?}");
        }

        #[test]
        fn score_is_deterministic(q in ".{0,40}", t in ".{0,40}", b in ".{0,40}") {
            prop_assert_eq!(score(&q, &t, &b), score(&q, &t, &b));
        }
    }
}
