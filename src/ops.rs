//! Pipeline stages shared by the CLI, tests and benches.
//!
//! `op_*` functions transform a [`Document`] in memory and never touch the
//! filesystem. `run_*` functions wrap them with load and atomic write, so a
//! failed run leaves no output behind.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::algo::dedup::{self, DedupReport, Scope};
use crate::algo::engine::{self, ClusterConfig};
use crate::algo::filter::{self, FilterConfig, FilterReport};
use crate::algo::stopwords::StopwordSet;
use crate::document::{ClusterLabel, Document, INSTITUTIONS_KEY};
use crate::error::{Error, Result};

// ── Document I/O ─────────────────────────────────────────────────────────────

/// Read and parse an input document.
pub fn load_document(path: &Path) -> Result<Document> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::InputNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(Error::InputRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let value: Value = serde_json::from_str(&raw).map_err(|source| Error::InputMalformed {
        path: path.to_path_buf(),
        source,
    })?;
    if value.get(INSTITUTIONS_KEY).is_none() {
        return Err(Error::MissingKey {
            path: path.to_path_buf(),
            key: INSTITUTIONS_KEY,
        });
    }

    let doc: Document = serde_json::from_value(value).map_err(|source| Error::InputMalformed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        institutions = doc.institutions.len(),
        repositories = doc.repository_count(),
        "document loaded"
    );
    Ok(doc)
}

/// Write `doc` as 2-space indented JSON. The file is staged next to `path`
/// and renamed into place, so readers see the old content or the new one.
/// The result keeps the mode of the file it replaces, or 0644 when new.
pub fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let fail = |source: io::Error| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(fail)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, doc).map_err(|e| fail(io::Error::from(e)))?;
        writer.write_all(b"\n").map_err(fail)?;
        writer.flush().map_err(fail)?;
    }
    #[cfg(unix)]
    staged
        .as_file()
        .set_permissions(output_permissions(path))
        .map_err(fail)?;
    staged.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn output_permissions(path: &Path) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => fs::Permissions::from_mode(0o644),
    }
}

// ── Cluster ──────────────────────────────────────────────────────────────────

/// What a clustering run did, printed by the CLI as one JSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub repositories: usize,
    pub k_requested: usize,
    pub k_effective: usize,
    pub vocabulary_size: usize,
    pub inertia: f64,
    pub iterations: usize,
    pub cluster_sizes: Vec<usize>,
    pub labels: Vec<ClusterLabel>,
    pub stopwords_version: String,
}

/// Cluster every repository of `doc` and write ids and labels back.
///
/// Returns `None`, leaving `doc` untouched, when it holds no repositories.
pub fn op_cluster(
    doc: &mut Document,
    stopwords: &StopwordSet,
    config: &ClusterConfig,
) -> Option<ClusterSummary> {
    let corpus = doc.corpus(stopwords);
    if corpus.is_empty() {
        warn!("document has no repositories; nothing to cluster");
        return None;
    }

    let texts: Vec<String> = corpus.iter().map(|e| e.text.clone()).collect();
    let clustering = engine::cluster_corpus(&texts, config)?;
    let labels = clustering.labels();
    for label in &labels {
        info!("{}", label.description);
    }

    let summary = ClusterSummary {
        repositories: corpus.len(),
        k_requested: clustering.k_requested,
        k_effective: clustering.k_effective,
        vocabulary_size: clustering.vocabulary_size,
        inertia: clustering.inertia,
        iterations: clustering.iterations,
        cluster_sizes: clustering.cluster_sizes(),
        labels: labels.clone(),
        stopwords_version: stopwords.version().to_string(),
    };
    doc.apply_clusters(&corpus, &clustering.assignments, labels);
    Some(summary)
}

/// Load, cluster, write. An empty corpus writes nothing and yields `Ok(None)`.
pub fn run_cluster(
    input: &Path,
    output: &Path,
    stopwords: &StopwordSet,
    config: &ClusterConfig,
) -> Result<Option<ClusterSummary>> {
    let mut doc = load_document(input)?;
    let Some(summary) = op_cluster(&mut doc, stopwords, config) else {
        return Ok(None);
    };
    write_document(output, &doc)?;
    info!(
        repositories = summary.repositories,
        clusters = summary.k_effective,
        output = %output.display(),
        "clustered document written"
    );
    Ok(Some(summary))
}

// ── Dedup ────────────────────────────────────────────────────────────────────

pub fn op_dedup(doc: &mut Document, scope: Scope) -> DedupReport {
    let report = dedup::dedup(doc, scope);
    info!(
        seen = report.records_seen,
        kept = report.records_kept,
        institutions_dropped = report.institutions_dropped,
        "dedup finished"
    );
    report
}

pub fn run_dedup(input: &Path, output: &Path, scope: Scope) -> Result<DedupReport> {
    let mut doc = load_document(input)?;
    let report = op_dedup(&mut doc, scope);
    write_document(output, &doc)?;
    Ok(report)
}

// ── Filter ───────────────────────────────────────────────────────────────────

pub fn op_filter(doc: &mut Document, stopwords: &StopwordSet, config: &FilterConfig) -> FilterReport {
    let report = filter::filter_document(doc, stopwords, config);
    info!(
        seen = report.records_seen,
        kept = report.records_kept,
        title_blacklist = report.title_blacklist,
        acronym_fragment = report.acronym_fragment,
        language = report.language,
        boilerplate = report.boilerplate,
        unstarred = report.unstarred,
        "filter finished"
    );
    report
}

pub fn run_filter(
    input: &Path,
    output: &Path,
    stopwords: &StopwordSet,
    config: &FilterConfig,
) -> Result<FilterReport> {
    let mut doc = load_document(input)?;
    let report = op_filter(&mut doc, stopwords, config);
    write_document(output, &doc)?;
    Ok(report)
}
