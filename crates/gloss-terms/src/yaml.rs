//! YAML term repository.
//!
//! A term file is a YAML sequence of records. `name` is required, `scope`
//! (storage id) defaults to 0 and a missing `language` makes the record
//! visible in every language. All other keys become the render payload:
//!
//! ```yaml
//! - name: API Gateway
//!   scope: 4
//!   description: Entry point for all HTTP traffic.
//! - name: Cache
//!   scope: 4
//!   language: 1
//!   description: Zwischenspeicher.
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use serde::Deserialize;

use crate::provider::{TermError, TermProvider};
use crate::term::{Term, TermCatalog};

/// A stored term with its storage scope and language.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TermRecord {
    /// Display name.
    pub name: String,
    /// Storage scope (page id of the term folder).
    #[serde(default)]
    pub scope: u32,
    /// Language id. `None` means all languages.
    #[serde(default)]
    pub language: Option<u32>,
    /// Remaining fields, passed through to the renderer.
    #[serde(flatten)]
    pub payload: BTreeMap<String, serde_json::Value>,
}

impl TermRecord {
    /// Whether the record is visible for the given scopes and language.
    #[must_use]
    pub fn is_visible(&self, scope_ids: &[u32], language: u32) -> bool {
        scope_ids.contains(&self.scope) && self.language.is_none_or(|lang| lang == language)
    }

    fn to_term(&self) -> Term {
        Term {
            name: self.name.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// Parsed records cached against the file's modification time.
#[derive(Debug)]
struct CachedRecords {
    mtime: SystemTime,
    records: Arc<Vec<TermRecord>>,
}

/// Term provider backed by a YAML file.
///
/// The file is re-read only when its modification time changes.
#[derive(Debug)]
pub struct YamlTermProvider {
    path: PathBuf,
    cache: RwLock<Option<CachedRecords>>,
}

impl YamlTermProvider {
    /// Create a provider for the given term file.
    ///
    /// The file is not read until the first fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Path of the term file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn records(&self) -> Result<Arc<Vec<TermRecord>>, TermError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TermError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let mtime = metadata.modified()?;

        if let Ok(guard) = self.cache.read()
            && let Some(cached) = guard.as_ref()
            && cached.mtime == mtime
        {
            return Ok(Arc::clone(&cached.records));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let records = Arc::new(parse_records(&content, &self.path)?);
        tracing::debug!(
            path = %self.path.display(),
            count = records.len(),
            "Loaded term file"
        );

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(CachedRecords {
                mtime,
                records: Arc::clone(&records),
            });
        }

        Ok(records)
    }
}

impl TermProvider for YamlTermProvider {
    fn fetch_all(&self, scope_ids: &[u32], language: u32) -> Result<TermCatalog, TermError> {
        let records = self.records()?;
        let catalog: TermCatalog = records
            .iter()
            .filter(|record| record.is_visible(scope_ids, language))
            .map(TermRecord::to_term)
            .collect();
        Ok(catalog.sorted_by_name_length())
    }
}

/// Parse term records from YAML content.
///
/// Empty content yields no records. Records with a blank name are dropped.
fn parse_records(content: &str, path: &Path) -> Result<Vec<TermRecord>, TermError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<TermRecord> =
        serde_yaml::from_str(trimmed).map_err(|e| TermError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(records
        .into_iter()
        .filter(|record| {
            let blank = record.name.trim().is_empty();
            if blank {
                tracing::warn!(path = %path.display(), scope = record.scope, "Skipping term without a name");
            }
            !blank
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    const TERMS: &str = "\
- name: API
  scope: 4
  description: Application programming interface
- name: API Gateway
  scope: 4
- name: Cache
  scope: 4
  language: 1
  description: Zwischenspeicher
- name: Archived
  scope: 9
";

    fn write_terms(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("terms.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    fn names(catalog: &TermCatalog) -> Vec<&str> {
        catalog.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_fetch_all_filters_scope_and_orders_by_length() {
        let dir = tempfile::tempdir().unwrap();
        let provider = YamlTermProvider::new(write_terms(dir.path(), TERMS));

        let catalog = provider.fetch_all(&[4], 0).unwrap();

        assert_eq!(names(&catalog), vec!["API Gateway", "API"]);
        assert_eq!(
            catalog.as_slice()[1].field("description"),
            Some("Application programming interface")
        );
    }

    #[test]
    fn test_fetch_all_includes_matching_language() {
        let dir = tempfile::tempdir().unwrap();
        let provider = YamlTermProvider::new(write_terms(dir.path(), TERMS));

        let catalog = provider.fetch_all(&[4, 9], 1).unwrap();

        assert_eq!(names(&catalog), vec!["API Gateway", "Archived", "Cache", "API"]);
    }

    #[test]
    fn test_fetch_all_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = YamlTermProvider::new(dir.path().join("missing.yaml"));

        let err = provider.fetch_all(&[4], 0).unwrap_err();

        assert!(matches!(err, TermError::NotFound(_)), "got {err:?}");
    }

    #[test]
    fn test_fetch_all_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let provider = YamlTermProvider::new(write_terms(dir.path(), "- name: [broken"));

        let err = provider.fetch_all(&[4], 0).unwrap_err();

        assert!(matches!(err, TermError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().contains("terms.yaml"));
    }

    #[test]
    fn test_empty_file_has_no_terms() {
        let dir = tempfile::tempdir().unwrap();
        let provider = YamlTermProvider::new(write_terms(dir.path(), "  \n"));

        assert!(provider.fetch_all(&[0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_blank_names_are_dropped() {
        let records = parse_records("- name: \"  \"\n- name: Cache\n", Path::new("t.yaml")).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Cache");
    }

    #[test]
    fn test_reloads_when_mtime_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_terms(dir.path(), "- name: Cache\n");
        let provider = YamlTermProvider::new(&path);
        assert_eq!(names(&provider.fetch_all(&[0], 0).unwrap()), vec!["Cache"]);

        fs::write(&path, "- name: Queue\n").unwrap();
        let later = SystemTime::now() + Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert_eq!(names(&provider.fetch_all(&[0], 0).unwrap()), vec!["Queue"]);
    }

    #[test]
    fn test_record_visibility() {
        let record = TermRecord {
            name: "Cache".to_owned(),
            scope: 4,
            language: Some(1),
            payload: BTreeMap::new(),
        };

        assert!(record.is_visible(&[4], 1));
        assert!(!record.is_visible(&[4], 0));
        assert!(!record.is_visible(&[5], 1));
    }
}
