//! The working copy (draft) of the structural content map.
//!
//! `reset` and `apply` are pure: they take a map and return a new one. `DraftStore`
//! persists one draft as JSON. Writes are whole-file and unserialized, so concurrent
//! writers race and the last one wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::models::{FieldPath, StructuralContentMap};

/// A new value for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: FieldPath,
    pub value: String,
}

impl FieldUpdate {
    pub fn new(path: FieldPath, value: impl Into<String>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// An update that was not merged, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedField {
    pub field: String,
    pub reason: String,
}

impl RejectedField {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A fresh draft: a copy of the seed.
pub fn reset(seed: &StructuralContentMap) -> StructuralContentMap {
    seed.clone()
}

/// Returns `draft` with `updates` merged in order. Updates naming a field the draft
/// does not have are returned as rejected; they never create fields.
pub fn apply(draft: &StructuralContentMap, updates: &[FieldUpdate]) -> (StructuralContentMap, Vec<RejectedField>) {
    let mut next = draft.clone();
    let mut rejected = Vec::new();
    for update in updates {
        match next.get_mut(&update.path) {
            Some(slot) => *slot = update.value.trim().to_string(),
            None => {
                debug!(field = %update.path, "Update names a field the draft does not have");
                rejected.push(RejectedField::new(update.path.to_string(), "field does not exist in draft"));
            }
        }
    }
    (next, rejected)
}

// ────────────────────────────────────────────────────────────────────────────
// File-backed store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("draft at {path} is not a valid content map: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DraftError {
        DraftError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// The stored draft, or `None` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<StructuralContentMap>, DraftError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| DraftError::Json {
                path: self.path.clone(),
                source,
            })
    }

    /// The stored draft, or a fresh one from `seed` (persisted) when nothing is stored.
    pub async fn load_or_reset(&self, seed: &StructuralContentMap) -> Result<StructuralContentMap, DraftError> {
        match self.load().await? {
            Some(draft) => Ok(draft),
            None => self.reset(seed).await,
        }
    }

    pub async fn save(&self, draft: &StructuralContentMap) -> Result<(), DraftError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_vec_pretty(draft).map_err(|source| DraftError::Json {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "Saved draft");
        Ok(())
    }

    /// Overwrites the stored draft with a copy of `seed`.
    pub async fn reset(&self, seed: &StructuralContentMap) -> Result<StructuralContentMap, DraftError> {
        let draft = reset(seed);
        self.save(&draft).await?;
        info!(path = %self.path.display(), "Draft reset from template");
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::extractor::extract_content;
    use crate::content::models::Section;
    use crate::docx::fixtures;

    fn seed() -> StructuralContentMap {
        extract_content(&fixtures::resume_docx(), "resume.docx").unwrap()
    }

    #[test]
    fn test_reset_copies_seed() {
        let seed = seed();
        assert_eq!(reset(&seed), seed);
    }

    #[test]
    fn test_apply_is_pure_and_rejects_unknown_fields() {
        let seed = seed();
        let updates = vec![
            FieldUpdate::new(FieldPath::Skill("languages".into()), "Rust, Go  "),
            FieldUpdate::new(FieldPath::Skill("hobbies".into()), "Chess"),
            FieldUpdate::new(
                FieldPath::Bullet { section: Section::Projects, entry: 0, bullet: 4 },
                "Nope",
            ),
        ];
        let (draft, rejected) = apply(&seed, &updates);

        assert_eq!(draft.skill("languages").unwrap().line.value, "Rust, Go");
        assert!(draft.skill("hobbies").is_none());
        let fields: Vec<&str> = rejected.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, ["skills.hobbies", "projects[0].bullets[4]"]);
        // The input is untouched.
        assert_eq!(seed.skill("languages").unwrap().line.value, "Python, Java, C++, SQL");
    }

    #[test]
    fn test_later_updates_win() {
        let path = FieldPath::TechStack { section: Section::Professional, entry: 0 };
        let (draft, rejected) = apply(
            &seed(),
            &[FieldUpdate::new(path.clone(), "Go"), FieldUpdate::new(path.clone(), "Rust")],
        );
        assert!(rejected.is_empty());
        assert_eq!(draft.get(&path), Some("Rust"));
    }

    #[tokio::test]
    async fn test_store_round_trip_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("nested").join("draft.json"));
        let seed = seed();

        assert!(store.load().await.unwrap().is_none());
        let draft = store.load_or_reset(&seed).await.unwrap();
        assert_eq!(draft, seed);

        let (edited, _) = apply(
            &draft,
            &[FieldUpdate::new(FieldPath::Skill("languages".into()), "Rust")],
        );
        store.save(&edited).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(edited));

        let restored = store.reset(&seed).await.unwrap();
        assert_eq!(restored, seed);
        assert_eq!(store.load().await.unwrap(), Some(seed));
    }

    #[tokio::test]
    async fn test_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = DraftStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, DraftError::Json { .. }));
    }
}
