use serde::Serialize;

use crate::document::ClusterLabel;

/// Characteristic terms of one cluster, strongest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTopic {
    pub id: usize,
    pub terms: Vec<(String, f64)>,
}

impl ClusterTopic {
    pub fn term_names(&self) -> Vec<&str> {
        self.terms.iter().map(|(t, _)| t.as_str()).collect()
    }

    /// `"Cluster <id>: term1, term2, ..."`
    pub fn description(&self) -> String {
        let terms = self.term_names().join(", ");
        format!("Cluster {}: {terms}", self.id).trim_end().to_string()
    }

    pub fn label(&self) -> ClusterLabel {
        ClusterLabel {
            id: self.id,
            description: self.description(),
        }
    }
}

/// Get the top `n` terms of a centroid. Only positive weights qualify; ties
/// keep vocabulary order.
pub fn top_terms(centroid: &[f64], vocabulary: &[String], n: usize) -> Vec<(String, f64)> {
    let mut indexed: Vec<(usize, f64)> = centroid
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, w)| w > 0.0)
        .collect();
    indexed.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    indexed
        .into_iter()
        .take(n)
        .map(|(i, w)| (vocabulary[i].clone(), w))
        .collect()
}

/// One topic per centroid, ids in centroid order.
pub fn label_clusters(centroids: &[Vec<f64>], vocabulary: &[String], n: usize) -> Vec<ClusterTopic> {
    centroids
        .iter()
        .enumerate()
        .map(|(id, centroid)| ClusterTopic {
            id,
            terms: top_terms(centroid, vocabulary, n),
        })
        .collect()
}
