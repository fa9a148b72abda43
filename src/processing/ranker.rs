//! Ordering of scored resumes

use crate::processing::document::{Document, ScoredMatch};

/// Sort by score, highest first. Equal scores keep their input order.
pub fn rank(scored: Vec<(Document, f32)>) -> Vec<ScoredMatch> {
    let mut ranked: Vec<ScoredMatch> = scored
        .into_iter()
        .map(|(document, score)| ScoredMatch { document, score })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::text_processor::TextNormalizer;
    use std::path::PathBuf;

    fn doc(name: &str) -> Document {
        Document::new(
            PathBuf::from(name),
            name.to_string(),
            format!("{} resume", name),
            &TextNormalizer::new(),
        )
    }

    fn names(ranked: &[ScoredMatch]) -> Vec<&str> {
        ranked.iter().map(|m| m.document.display_name.as_str()).collect()
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank(vec![(doc("A"), 0.5714), (doc("B"), 0.9), (doc("C"), 0.5714)]);

        assert_eq!(names(&ranked), vec!["B", "A", "C"]);
        assert_eq!(ranked[0].score, 0.9);
        assert_eq!(ranked[1].score, 0.5714);
    }

    #[test]
    fn test_negative_scores_sort_last() {
        let ranked = rank(vec![(doc("A"), -0.2), (doc("B"), 0.0), (doc("C"), 0.3)]);
        assert_eq!(names(&ranked), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_never_drops_or_duplicates() {
        let input: Vec<_> = (0..25)
            .map(|i| (doc(&format!("R{}", i)), ((i * 7) % 5) as f32 / 10.0))
            .collect();

        let ranked = rank(input);

        assert_eq!(ranked.len(), 25);
        let mut seen: Vec<_> = names(&ranked).into_iter().map(String::from).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 25);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }
}
