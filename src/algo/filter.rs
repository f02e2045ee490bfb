use regex::Regex;
use serde::Serialize;
use whatlang::Lang;

use crate::algo::stopwords::StopwordSet;
use crate::document::{Document, RepositoryRecord};

/// Rules applied by [`filter_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Drop names containing a blacklisted title fragment.
    pub title_blacklist: bool,
    /// Drop names where the institution acronym only appears glued to other text.
    pub acronym_fragments: bool,
    /// Drop repositories whose description is neither Portuguese nor English.
    pub language: bool,
    /// Drop tutorials, templates and similar boilerplate.
    pub boilerplate: bool,
    /// Drop repositories without a single star.
    pub require_stars: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            title_blacklist: true,
            acronym_fragments: true,
            language: true,
            boilerplate: false,
            require_stars: false,
        }
    }
}

/// Why a repository was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TitleBlacklist,
    AcronymFragment,
    Language,
    Boilerplate,
    Unstarred,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub records_seen: usize,
    pub records_kept: usize,
    pub title_blacklist: usize,
    pub acronym_fragment: usize,
    pub language: usize,
    pub boilerplate: usize,
    pub unstarred: usize,
    pub institutions_dropped: usize,
}

/// Matches the acronym as a standalone word followed by a space, hyphen or
/// the end of the name. `None` for an empty acronym.
fn clean_acronym_pattern(acronym: &str) -> Option<Regex> {
    if acronym.is_empty() {
        return None;
    }
    Regex::new(&format!(r"\b{}(?:[ \-]|$)", regex::escape(acronym))).ok()
}

const ACCEPTED_LANGUAGES: [Lang; 2] = [Lang::Por, Lang::Eng];

/// An empty or missing description passes. Otherwise the detected language
/// must be accepted; text with no detectable language fails.
pub fn description_language_ok(description: Option<&str>) -> bool {
    match description.map(str::trim) {
        None | Some("") => true,
        Some(text) => whatlang::detect(text).is_some_and(|info| ACCEPTED_LANGUAGES.contains(&info.lang())),
    }
}

/// First rule rejecting `repo`, if any. `acronym` must already be lower-cased.
pub fn check_repository(
    repo: &RepositoryRecord,
    acronym: &str,
    acronym_pattern: Option<&Regex>,
    stopwords: &StopwordSet,
    config: &FilterConfig,
) -> Option<Rejection> {
    let name = repo.name().to_lowercase();

    if config.title_blacklist && stopwords.title_blacklist().iter().any(|t| name.contains(t.as_str())) {
        return Some(Rejection::TitleBlacklist);
    }

    if config.acronym_fragments && !acronym.is_empty() && name.contains(acronym) {
        if let Some(pattern) = acronym_pattern {
            if !pattern.is_match(&name) {
                return Some(Rejection::AcronymFragment);
            }
        }
    }

    if config.language && !description_language_ok(repo.description()) {
        return Some(Rejection::Language);
    }

    if config.boilerplate {
        let description = repo.description().unwrap_or("").to_lowercase();
        let hit = stopwords
            .boilerplate()
            .iter()
            .any(|b| name.contains(b.as_str()) || description.contains(b.as_str()));
        if hit {
            return Some(Rejection::Boilerplate);
        }
    }

    if config.require_stars && repo.stars() == 0 {
        return Some(Rejection::Unstarred);
    }

    None
}

/// Remove rejected repositories in place and drop institutions left empty.
pub fn filter_document(doc: &mut Document, stopwords: &StopwordSet, config: &FilterConfig) -> FilterReport {
    let mut report = FilterReport {
        records_seen: doc.repository_count(),
        ..Default::default()
    };

    for inst in &mut doc.institutions {
        let acronym = inst.acronym().to_lowercase();
        let pattern = clean_acronym_pattern(&acronym);
        inst.retain_repositories(|repo| {
            match check_repository(repo, &acronym, pattern.as_ref(), stopwords, config) {
                None => true,
                Some(rejection) => {
                    match rejection {
                        Rejection::TitleBlacklist => report.title_blacklist += 1,
                        Rejection::AcronymFragment => report.acronym_fragment += 1,
                        Rejection::Language => report.language += 1,
                        Rejection::Boilerplate => report.boilerplate += 1,
                        Rejection::Unstarred => report.unstarred += 1,
                    }
                    false
                }
            }
        });
    }

    report.institutions_dropped = doc.prune_empty_institutions();
    report.records_kept = doc.repository_count();
    report
}
