use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::algo::normalize::fold_tokens;
use crate::error::{Error, Result};

/// Embedded default stopword artifact, compiled from `stopwords/default.json`.
/// Users override by placing a file at `$XDG_DATA_HOME/repo-clusters/stopwords.json`
/// or `$REPO_CLUSTERS_STOPWORDS` env var, or passing `--stopwords <path>`.
const EMBEDDED_DEFAULT: &str = include_str!("../../stopwords/default.json");

/// On-disk stopword artifact. The lists are curated over time, so the file
/// carries its own version string which is logged with every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopwordFile {
    pub version: String,
    #[serde(default)]
    pub portuguese: Vec<String>,
    #[serde(default)]
    pub english: Vec<String>,
    /// Generic institutional vocabulary and known-bad name fragments.
    #[serde(default)]
    pub domain: Vec<String>,
    /// Title fragments of mis-scraped repositories, matched by the filter stage.
    #[serde(default)]
    pub title_blacklist: Vec<String>,
    /// Markers of tutorial/template repositories, matched by the filter stage.
    #[serde(default)]
    pub boilerplate: Vec<String>,
}

/// Compiled lookup form of a [`StopwordFile`].
#[derive(Debug, Clone)]
pub struct StopwordSet {
    version: String,
    words: HashSet<String>,
    phrases: Vec<Vec<String>>,
    title_blacklist: Vec<String>,
    boilerplate: Vec<String>,
}

impl StopwordSet {
    /// Fold every entry the same way text is folded. Entries that fold to a
    /// single token become stopwords, longer ones become phrases.
    pub fn from_file(file: &StopwordFile) -> Self {
        let mut words = HashSet::new();
        let mut phrases: Vec<Vec<String>> = Vec::new();

        let entries = file
            .portuguese
            .iter()
            .chain(&file.english)
            .chain(&file.domain);
        for entry in entries {
            let mut tokens = fold_tokens(entry);
            match tokens.len() {
                0 => {}
                1 => {
                    words.insert(tokens.remove(0));
                }
                _ => {
                    if !phrases.contains(&tokens) {
                        phrases.push(tokens);
                    }
                }
            }
        }
        // Longest phrases first so a longer match wins over its prefix.
        phrases.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            version: file.version.clone(),
            words,
            phrases,
            title_blacklist: lowercase_nonempty(&file.title_blacklist),
            boilerplate: lowercase_nonempty(&file.boilerplate),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn phrases(&self) -> &[Vec<String>] {
        &self.phrases
    }

    pub fn title_blacklist(&self) -> &[String] {
        &self.title_blacklist
    }

    pub fn boilerplate(&self) -> &[String] {
        &self.boilerplate
    }

    /// Number of single-token stopwords.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

impl Default for StopwordSet {
    fn default() -> Self {
        Self::from_file(&default_stopword_file())
    }
}

fn lowercase_nonempty(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Load the default stopword artifact using this resolution order:
///
/// 1. `$REPO_CLUSTERS_STOPWORDS` env var (path to JSON file)
/// 2. `$XDG_DATA_HOME/repo-clusters/stopwords.json` (user override)
/// 3. `~/.local/share/repo-clusters/stopwords.json` (fallback XDG path)
/// 4. Embedded compile-time default from `stopwords/default.json`
///
/// Any resolution step that fails silently falls through to the next.
pub fn default_stopword_file() -> StopwordFile {
    if let Ok(path) = std::env::var("REPO_CLUSTERS_STOPWORDS") {
        if let Ok(file) = load_stopwords(Path::new(&path)) {
            return file;
        }
    }

    if let Some(path) = xdg_stopwords_path() {
        if path.exists() {
            if let Ok(file) = load_stopwords(&path) {
                return file;
            }
        }
    }

    embedded_default()
}

/// An explicit path must load; without one, fall back to [`default_stopword_file`].
pub fn resolve_stopword_file(explicit: Option<&Path>) -> Result<StopwordFile> {
    match explicit {
        Some(path) => load_stopwords(path),
        None => Ok(default_stopword_file()),
    }
}

/// The compiled-in artifact, ignoring any user override.
pub fn embedded_default() -> StopwordFile {
    parse_stopwords(EMBEDDED_DEFAULT).expect("embedded default stopwords are invalid JSON")
}

/// Parse a stopword artifact from a JSON string.
pub fn parse_stopwords(json: &str) -> std::result::Result<StopwordFile, String> {
    serde_json::from_str(json).map_err(|e| format!("Failed to parse stopwords: {e}"))
}

/// Load a stopword artifact from a file path.
pub fn load_stopwords(path: &Path) -> Result<StopwordFile> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::Stopwords {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_stopwords(&json).map_err(|reason| Error::Stopwords {
        path: path.to_path_buf(),
        reason,
    })
}

fn xdg_stopwords_path() -> Option<PathBuf> {
    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local/share"))
        })?;
    Some(data_home.join("repo-clusters/stopwords.json"))
}

/// Return the embedded default artifact as a JSON string.
/// Useful for seeding a user-customizable file.
pub fn embedded_default_json() -> &'static str {
    EMBEDDED_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_json_is_valid() {
        let file: StopwordFile = serde_json::from_str(embedded_default_json()).unwrap();
        assert!(!file.version.is_empty());
        assert!(!file.portuguese.is_empty());
        assert!(!file.english.is_empty());
    }

    #[test]
    fn default_set_covers_both_languages_and_domain() {
        let set = StopwordSet::from_file(&embedded_default());
        for word in ["de", "não", "the", "because", "projeto", "sistema", "universidade", "project"] {
            assert!(set.contains(word), "missing stopword '{word}'");
        }
        assert!(!set.contains("rust"));
    }

    #[test]
    fn multi_token_entries_become_phrases() {
        let set = StopwordSet::from_file(&embedded_default());
        assert!(set
            .phrases()
            .iter()
            .any(|p| p == &["fba", "port", "to", "ios"]));
        assert!(!set.contains("fba port to ios"));
    }

    #[test]
    fn phrases_sorted_longest_first() {
        let file = StopwordFile {
            version: "t".into(),
            domain: vec!["open data".into(), "open data portal".into()],
            ..Default::default()
        };
        let set = StopwordSet::from_file(&file);
        assert_eq!(set.phrases()[0].len(), 3);
    }

    #[test]
    fn blacklists_are_lowercased() {
        let set = StopwordSet::from_file(&embedded_default());
        assert!(set.title_blacklist().iter().any(|t| t == "blooketpanel"));
        assert!(set.boilerplate().iter().any(|t| t == "tutorial"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_stopwords(Path::new("/nonexistent/stopwords.json")).unwrap_err();
        assert!(matches!(err, Error::Stopwords { .. }));
    }

    #[test]
    fn partial_file_defaults_missing_lists() {
        let file = parse_stopwords(r#"{"version": "x", "english": ["the"]}"#).unwrap();
        assert!(file.portuguese.is_empty());
        let set = StopwordSet::from_file(&file);
        assert!(set.contains("the"));
        assert_eq!(set.word_count(), 1);
    }

    #[test]
    fn invalid_json_reports_reason() {
        let err = parse_stopwords("{not json").unwrap_err();
        assert!(err.contains("Failed to parse stopwords"));
    }
}
