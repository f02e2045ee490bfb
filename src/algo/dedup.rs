use serde::Serialize;
use std::collections::HashSet;

use crate::document::{Document, RepositoryRecord};

/// Which dedup passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Scope {
    /// Repeated `(name, url)` keys inside one institution.
    Institution,
    /// Repeated keys anywhere in the document; the earliest institution keeps it.
    Global,
    /// Institution pass followed by the global pass.
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub records_seen: usize,
    pub records_kept: usize,
    pub institutions_dropped: usize,
}

/// Keep the first record of every `(name, url)` key within each institution.
/// Returns how many records were removed.
pub fn dedup_within_institutions(doc: &mut Document) -> usize {
    let mut removed = 0;
    for inst in &mut doc.institutions {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        removed += inst.retain_repositories(|r| seen.insert(owned_key(r)));
    }
    removed
}

/// Keep the first occurrence of each key across the whole document, then drop
/// institutions left empty. Returns `(records removed, institutions dropped)`.
pub fn dedup_across_institutions(doc: &mut Document) -> (usize, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut removed = 0;
    for inst in &mut doc.institutions {
        removed += inst.retain_repositories(|r| seen.insert(owned_key(r)));
    }
    let dropped = doc.prune_empty_institutions();
    (removed, dropped)
}

fn owned_key(r: &RepositoryRecord) -> (String, String) {
    let (name, url) = r.key();
    (name.to_string(), url.to_string())
}

pub fn dedup(doc: &mut Document, scope: Scope) -> DedupReport {
    let records_seen = doc.repository_count();
    let mut institutions_dropped = 0;
    if matches!(scope, Scope::Institution | Scope::Both) {
        dedup_within_institutions(doc);
    }
    if matches!(scope, Scope::Global | Scope::Both) {
        institutions_dropped = dedup_across_institutions(doc).1;
    }
    DedupReport {
        records_seen,
        records_kept: doc.repository_count(),
        institutions_dropped,
    }
}
