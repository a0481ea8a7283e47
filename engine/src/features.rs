use crate::error::AppError;
use nalgebra::DVector;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Words of two or more word characters, matched after lowercasing.
const TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// TF-IDF encoder fitted on the roster's feature text.
///
/// Term frequency is the raw count, IDF is smoothed as
/// `ln((1 + n) / (1 + df)) + 1`, and every encoded row is L2-normalised.
/// Vocabulary indices follow lexicographic term order.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    token_pattern: Regex,
    vocabulary: BTreeMap<String, usize>,
    idf: DVector<f64>,
}

impl TfidfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self, AppError> {
        let token_pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| AppError::Internal(format!("invalid token pattern: {}", e)))?;

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            let unique: HashSet<String> = tokenize(&token_pattern, document.as_ref())
                .into_iter()
                .collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            warn!("Fitted TF-IDF on an empty vocabulary; every vector will be zero");
        }

        let n_documents = documents.len() as f64;
        let vocabulary: BTreeMap<String, usize> = document_frequency
            .keys()
            .enumerate()
            .map(|(index, term)| (term.clone(), index))
            .collect();
        let idf = DVector::from_iterator(
            document_frequency.len(),
            document_frequency
                .values()
                .map(|&df| ((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0),
        );

        debug!(
            "Fitted TF-IDF on {} documents, {} terms",
            documents.len(),
            vocabulary.len()
        );

        Ok(Self {
            token_pattern,
            vocabulary,
            idf,
        })
    }

    pub fn fit_transform<S: AsRef<str>>(
        documents: &[S],
    ) -> Result<(Self, Vec<DVector<f64>>), AppError> {
        let vectorizer = Self::fit(documents)?;
        let vectors = documents
            .iter()
            .map(|document| vectorizer.transform(document.as_ref()))
            .collect();
        Ok((vectorizer, vectors))
    }

    /// Encodes text against the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> DVector<f64> {
        let mut vector = DVector::zeros(self.vocabulary.len());
        for token in tokenize(&self.token_pattern, text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                vector[index] += 1.0;
            }
        }

        vector.component_mul_assign(&self.idf);

        let norm = vector.norm();
        if norm > 0.0 {
            vector /= norm;
        }
        vector
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(&self.token_pattern, text)
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&index| self.idf[index])
    }
}

fn tokenize(pattern: &Regex, text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    pattern
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
