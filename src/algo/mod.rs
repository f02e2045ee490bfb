pub mod dedup;
pub mod engine;
pub mod filter;
pub mod kmeans;
pub mod labels;
pub mod normalize;
pub mod stopwords;
pub mod tfidf;
