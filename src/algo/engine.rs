use tracing::{debug, info, warn};

use crate::algo::kmeans::{self, KMeansConfig};
use crate::algo::labels::{self, ClusterTopic};
use crate::algo::tfidf::{FeatureMatrix, VectorizerConfig};
use crate::document::ClusterLabel;

/// Configuration for one clustering run.
#[derive(Debug, Clone, Copy)]
pub struct ClusterConfig {
    /// Requested number of clusters.
    pub k: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Maximum k-means iterations.
    pub max_iter: usize,
    /// Convergence threshold on total squared centroid shift.
    pub tol: f64,
    /// Number of seedings tried; the tightest partition wins.
    pub n_init: usize,
    /// Number of terms in each cluster label.
    pub label_terms: usize,
    pub vectorizer: VectorizerConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 15,
            seed: 42,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            label_terms: 5,
            vectorizer: VectorizerConfig::default(),
        }
    }
}

/// Outcome of a clustering run over a non-empty corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Corpus index -> cluster id in `0..k_effective`.
    pub assignments: Vec<usize>,
    /// One topic per cluster id.
    pub topics: Vec<ClusterTopic>,
    pub k_requested: usize,
    pub k_effective: usize,
    pub vocabulary_size: usize,
    pub inertia: f64,
    pub iterations: usize,
}

impl Clustering {
    pub fn labels(&self) -> Vec<ClusterLabel> {
        self.topics.iter().map(ClusterTopic::label).collect()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k_effective];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }
}

/// Clusters actually used: the request, capped at the corpus size.
/// A request of zero is treated as one.
pub fn effective_k(n_docs: usize, k_requested: usize) -> usize {
    k_requested.max(1).min(n_docs)
}

/// Cluster a corpus of normalized texts.
///
/// Pipeline:
/// 1. Fit TF-IDF features (1-3 grams, document-frequency pruning)
/// 2. Cap k at the corpus size
/// 3. Partition with seeded k-means
/// 4. Label each cluster by its strongest centroid terms
///
/// Returns `None` when there is nothing to cluster.
pub fn cluster_corpus(texts: &[String], config: &ClusterConfig) -> Option<Clustering> {
    let matrix = FeatureMatrix::fit_transform(texts, &config.vectorizer);
    let n_docs = matrix.num_docs();
    if n_docs == 0 {
        info!("nothing to cluster");
        return None;
    }

    let k = effective_k(n_docs, config.k);
    if k < config.k {
        warn!(
            documents = n_docs,
            requested = config.k,
            "fewer documents than requested clusters, using {k}"
        );
    }
    if matrix.num_features() == 0 {
        warn!(
            documents = n_docs,
            "no term survived document-frequency pruning; clusters will carry no terms"
        );
    }
    debug!(
        documents = n_docs,
        vocabulary = matrix.num_features(),
        k,
        "feature matrix built"
    );

    let result = kmeans::kmeans(
        matrix.rows(),
        matrix.num_features(),
        &KMeansConfig {
            k,
            max_iter: config.max_iter,
            tol: config.tol,
            n_init: config.n_init,
            seed: config.seed,
        },
    );
    debug!(
        iterations = result.iterations,
        inertia = result.inertia,
        "k-means finished"
    );

    let topics = labels::label_clusters(&result.centroids, matrix.vocabulary(), config.label_terms);

    Some(Clustering {
        assignments: result.assignments,
        topics,
        k_requested: config.k,
        k_effective: k,
        vocabulary_size: matrix.num_features(),
        inertia: result.inertia,
        iterations: result.iterations,
    })
}
