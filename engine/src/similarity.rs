use crate::{
    error::AppError,
    features::TfidfVectorizer,
    roster::Roster,
    types::Match,
};
use nalgebra::DVector;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Cosine of the angle between two vectors; 0 when either has zero length.
pub fn cosine_similarity(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let denominator = a.norm() * b.norm();
    if denominator == 0.0 {
        return 0.0;
    }
    a.dot(b) / denominator
}

/// Immutable roster plus its encoded vectors. Built once at startup.
pub struct MatchEngine {
    roster: Roster,
    vectorizer: TfidfVectorizer,
    vectors: Vec<DVector<f64>>,
    top_k: usize,
}

impl MatchEngine {
    pub fn new(roster: Roster, top_k: usize) -> Result<Self, AppError> {
        let documents: Vec<String> = roster
            .students()
            .iter()
            .map(|student| student.feature_text())
            .collect();
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&documents)?;

        info!(
            "Match engine ready: {} students, {} terms, top_k={}",
            roster.len(),
            vectorizer.vocabulary().len(),
            top_k
        );

        Ok(Self {
            roster,
            vectorizer,
            vectors,
            top_k,
        })
    }

    /// Similarity of the named student against every roster row, in roster order.
    pub fn similarities(&self, query_name: &str) -> Result<Vec<f64>, AppError> {
        let index = self
            .roster
            .position(query_name)
            .ok_or_else(|| AppError::NotFound(query_name.to_string()))?;
        let query = &self.vectors[index];

        Ok(self
            .vectors
            .iter()
            .map(|vector| cosine_similarity(query, vector))
            .collect())
    }

    /// Closest peers for `query_name`, best first, never including the query itself.
    pub fn rank_matches(&self, query_name: &str) -> Result<Vec<Match>, AppError> {
        let scores = self.similarities(query_name)?;

        let mut candidates: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(index, _)| self.roster.students()[*index].name != query_name)
            .collect();

        // Stable: equal scores keep roster order.
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        candidates.truncate(self.top_k);

        let matches: Vec<Match> = candidates
            .into_iter()
            .map(|(index, similarity)| Match {
                name: self.roster.students()[index].name.clone(),
                similarity,
            })
            .collect();

        debug!("Ranked {} matches for {}", matches.len(), query_name);
        Ok(matches)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StudentRecord;

    fn engine(students: Vec<StudentRecord>) -> MatchEngine {
        MatchEngine::new(Roster::new(students), 3).unwrap()
    }

    fn study_group() -> MatchEngine {
        engine(vec![
            StudentRecord::new("Alice", "math physics calculus", "weekday evenings"),
            StudentRecord::new("Bob", "history literature", "weekend mornings"),
            StudentRecord::new("Carol", "math calculus statistics", "weekday evenings"),
            StudentRecord::new("Dave", "chemistry biology", "weekend afternoons"),
            StudentRecord::new("Erin", "physics astronomy", "weekday mornings"),
        ])
    }

    #[test]
    fn test_cosine_similarity() {
        let a = DVector::from_vec(vec![1.0, 0.0]);
        let b = DVector::from_vec(vec![0.0, 2.0]);
        let c = DVector::from_vec(vec![3.0, 0.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert!((cosine_similarity(&a, &c) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&a, &DVector::zeros(2)), 0.0);
    }

    #[test]
    fn test_four_students_returns_three_others() {
        let engine = engine(vec![
            StudentRecord::new("Alice", "math physics", "evenings"),
            StudentRecord::new("Bob", "history art", "weekends"),
            StudentRecord::new("Carol", "chemistry", "mornings"),
            StudentRecord::new("Dave", "music theory", "afternoons"),
        ]);

        let matches = engine.rank_matches("Alice").unwrap();
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| m.name != "Alice"));
    }

    #[test]
    fn test_best_match_first() {
        let matches = study_group().rank_matches("Alice").unwrap();
        assert_eq!(matches[0].name, "Carol");
        for pair in matches.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_self_similarity_is_one() {
        let engine = study_group();
        let scores = engine.similarities("Alice").unwrap();
        assert!((scores[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_student() {
        let err = study_group().rank_matches("Zoe").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref name) if name == "Zoe"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(study_group().rank_matches("alice").is_err());
    }

    #[test]
    fn test_rank_is_idempotent() {
        let engine = study_group();
        let first = engine.rank_matches("Bob").unwrap();
        let second = engine.rank_matches("Bob").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let engine = engine(vec![
            StudentRecord::new("Query", "chess", "noon"),
            StudentRecord::new("First", "painting", "dusk"),
            StudentRecord::new("Second", "rowing", "dawn"),
            StudentRecord::new("Third", "poetry", "night"),
            StudentRecord::new("Fourth", "baking", "late"),
        ]);

        let names: Vec<String> = engine
            .rank_matches("Query")
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_small_roster_returns_fewer() {
        let engine = engine(vec![
            StudentRecord::new("Alice", "math", "evenings"),
            StudentRecord::new("Bob", "math", "mornings"),
        ]);
        assert_eq!(engine.rank_matches("Alice").unwrap().len(), 1);

        let lonely = self::engine(vec![StudentRecord::new("Solo", "math", "evenings")]);
        assert!(lonely.rank_matches("Solo").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_names_are_all_excluded() {
        let engine = engine(vec![
            StudentRecord::new("Alice", "math", "evenings"),
            StudentRecord::new("Alice", "math", "evenings"),
            StudentRecord::new("Bob", "art", "mornings"),
        ]);
        let matches = engine.rank_matches("Alice").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Bob");
    }

    #[test]
    fn test_top_k_is_configurable() {
        let engine = MatchEngine::new(
            Roster::new(vec![
                StudentRecord::new("A", "math", "x1"),
                StudentRecord::new("B", "math", "x2"),
                StudentRecord::new("C", "math", "x3"),
            ]),
            1,
        )
        .unwrap();
        assert_eq!(engine.rank_matches("A").unwrap().len(), 1);
    }
}
