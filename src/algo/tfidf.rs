use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

use crate::algo::normalize;

/// Vectorizer parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorizerConfig {
    /// Shortest word n-gram emitted.
    pub min_ngram: usize,
    /// Longest word n-gram emitted.
    pub max_ngram: usize,
    /// Terms found in fewer documents than this are noise.
    pub min_df: usize,
    /// Terms found in more than this fraction of documents carry no signal.
    pub max_df: f64,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            min_ngram: 1,
            max_ngram: 3,
            min_df: 2,
            max_df: 0.85,
        }
    }
}

/// A sparse document vector: `(feature index, weight)` pairs sorted by index.
pub type SparseRow = Vec<(usize, f64)>;

/// TF-IDF document-term matrix over a pruned, lexicographically sorted vocabulary.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    vocabulary: Vec<String>,
    /// document index -> L2-normalized weights
    rows: Vec<SparseRow>,
}

impl FeatureMatrix {
    /// Fit the vocabulary on `texts` and weight every document against it.
    ///
    /// Pipeline:
    /// 1. Analyze each text into word n-grams and count them
    /// 2. Count document frequency per term
    /// 3. Prune terms with `df < min_df` or `df > max_df * n_docs`
    /// 4. idf = ln((1 + n) / (1 + df)) + 1
    /// 5. weight = count * idf, then L2-normalize each row
    pub fn fit_transform(texts: &[String], config: &VectorizerConfig) -> Self {
        let n_docs = texts.len();
        let counts: Vec<HashMap<String, u32>> = texts
            .par_iter()
            .map(|text| {
                let mut term_counts: HashMap<String, u32> = HashMap::new();
                for term in normalize::analyze(text, config.min_ngram, config.max_ngram) {
                    *term_counts.entry(term).or_insert(0) += 1;
                }
                term_counts
            })
            .collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let max_doc_count = config.max_df * n_docs as f64;
        let kept: BTreeSet<&str> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= config.min_df && df as f64 <= max_doc_count)
            .map(|(&term, _)| term)
            .collect();
        let vocabulary: Vec<String> = kept.into_iter().map(str::to_string).collect();

        let term_idx: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let n = n_docs as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|t| {
                let df = doc_freq[t.as_str()] as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows: Vec<SparseRow> = counts
            .par_iter()
            .map(|doc| {
                let mut row: SparseRow = doc
                    .iter()
                    .filter_map(|(term, &count)| {
                        term_idx
                            .get(term.as_str())
                            .map(|&j| (j, count as f64 * idf[j]))
                    })
                    .collect();
                row.sort_unstable_by_key(|&(j, _)| j);
                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in &mut row {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        Self { vocabulary, rows }
    }

    pub fn num_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn num_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }
}
