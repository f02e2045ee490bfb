//! Wire model of the institution/repository document.
//!
//! Field names are the ones the upstream fetch stage writes and downstream
//! viewers read, so they are kept verbatim (including accents). Institutions
//! and repositories keep every key they came with; a run never invents one
//! beyond `Cluster_ID` and `cluster_descriptions`.

use rayon::prelude::*;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::algo::normalize::normalize_repository_text;
use crate::algo::stopwords::StopwordSet;

pub const INSTITUTIONS_KEY: &str = "institutions_data";
pub const REPOSITORIES_KEY: &str = "Repositorios";
pub const ACRONYM_KEY: &str = "Sigla";
pub const NAME_KEY: &str = "Nome do Repositório";
pub const DESCRIPTION_KEY: &str = "Descricao";
pub const STARS_KEY: &str = "Estrelas";
pub const URL_KEY: &str = "Link de Acesso";
pub const CLUSTER_ID_KEY: &str = "Cluster_ID";

fn text<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// One repository as returned by the search stage.
///
/// Kept as the raw object so a run only ever adds `Cluster_ID`. Readers treat
/// a missing, null or mistyped field as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryRecord {
    fields: Map<String, Value>,
}

impl RepositoryRecord {
    pub fn name(&self) -> &str {
        text(&self.fields, NAME_KEY).unwrap_or("")
    }

    /// `None` when absent, null or not a string.
    pub fn description(&self) -> Option<&str> {
        text(&self.fields, DESCRIPTION_KEY)
    }

    pub fn url(&self) -> &str {
        text(&self.fields, URL_KEY).unwrap_or("")
    }

    /// Star count; anything that is not a non-negative integer counts as zero.
    pub fn stars(&self) -> u64 {
        self.fields.get(STARS_KEY).and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn cluster_id(&self) -> Option<usize> {
        self.fields
            .get(CLUSTER_ID_KEY)
            .and_then(Value::as_u64)
            .map(|id| id as usize)
    }

    pub fn set_cluster_id(&mut self, id: usize) {
        self.fields.insert(CLUSTER_ID_KEY.to_string(), Value::from(id));
    }

    /// Dedup identity.
    pub fn key(&self) -> (&str, &str) {
        (self.name(), self.url())
    }
}

/// One institution and its repositories.
///
/// Every key is written back in its original position. Only a `Repositorios`
/// array is taken apart into records; any other value under that key is left
/// as it was and the institution counts as having no repositories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstitutionGroup {
    fields: Map<String, Value>,
    repositories: Vec<RepositoryRecord>,
    listed: bool,
}

impl InstitutionGroup {
    /// Trimmed `Sigla`, empty when missing.
    pub fn acronym(&self) -> &str {
        text(&self.fields, ACRONYM_KEY).unwrap_or("").trim()
    }

    pub fn repositories(&self) -> &[RepositoryRecord] {
        &self.repositories
    }

    /// Keep only the repositories `keep` accepts. Returns how many went.
    pub fn retain_repositories<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&RepositoryRecord) -> bool,
    {
        let before = self.repositories.len();
        self.repositories.retain(keep);
        before - self.repositories.len()
    }
}

impl<'de> Deserialize<'de> for InstitutionGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::deserialize(deserializer)?;
        let mut repositories: Vec<RepositoryRecord> = Vec::new();
        let mut listed = false;
        if let Some(Value::Array(items)) = fields.get_mut(REPOSITORIES_KEY) {
            repositories = std::mem::take(items)
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()
                .map_err(D::Error::custom)?;
            listed = true;
        }
        Ok(Self {
            fields,
            repositories,
            listed,
        })
    }
}

impl Serialize for InstitutionGroup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            if self.listed && key == REPOSITORIES_KEY {
                map.serialize_entry(key, &self.repositories)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// `{id, description}` entry of the cluster catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLabel {
    pub id: usize,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "institutions_data")]
    pub institutions: Vec<InstitutionGroup>,
    #[serde(
        rename = "cluster_descriptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_labels: Option<Vec<ClusterLabel>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Position of a repository inside the nested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub institution: usize,
    pub repository: usize,
}

/// A flattened repository ready for vectorization.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub record: RecordRef,
    pub text: String,
}

impl Document {
    pub fn repository_count(&self) -> usize {
        self.institutions.iter().map(|i| i.repositories.len()).sum()
    }

    /// Every repository position, institutions in order, repositories in order.
    pub fn record_refs(&self) -> Vec<RecordRef> {
        self.institutions
            .iter()
            .enumerate()
            .flat_map(|(i, inst)| {
                (0..inst.repositories.len()).map(move |r| RecordRef {
                    institution: i,
                    repository: r,
                })
            })
            .collect()
    }

    fn repository_mut(&mut self, at: RecordRef) -> Option<&mut RepositoryRecord> {
        self.institutions
            .get_mut(at.institution)?
            .repositories
            .get_mut(at.repository)
    }

    /// Flatten all repositories into normalized corpus entries, in document order.
    pub fn corpus(&self, stopwords: &StopwordSet) -> Vec<CorpusEntry> {
        self.record_refs()
            .into_par_iter()
            .map(|at| {
                let repo = &self.institutions[at.institution].repositories[at.repository];
                CorpusEntry {
                    record: at,
                    text: normalize_repository_text(repo.name(), repo.description(), stopwords),
                }
            })
            .collect()
    }

    /// Write cluster ids back by position and install the label catalog.
    /// `entries[i]` receives `assignments[i]`.
    pub fn apply_clusters(
        &mut self,
        entries: &[CorpusEntry],
        assignments: &[usize],
        labels: Vec<ClusterLabel>,
    ) {
        for (entry, &cluster) in entries.iter().zip(assignments) {
            if let Some(repo) = self.repository_mut(entry.record) {
                repo.set_cluster_id(cluster);
            }
        }
        self.cluster_labels = Some(labels);
    }

    /// Drop institutions left without repositories. Returns how many went.
    pub fn prune_empty_institutions(&mut self) -> usize {
        let before = self.institutions.len();
        self.institutions.retain(|i| !i.repositories.is_empty());
        before - self.institutions.len()
    }
}
