//! Directory-backed model store
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   <tag>.model.json   canonical JSON of one TrainedModel (forest + schema)
//!   LATEST             tag of the most recently saved model
//!   .store.lock        advisory lock held while saving
//! ```
//!
//! Artifacts are written to a temp file in `<root>` and linked into place
//! without overwriting, so readers see either no file or the whole artifact.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use noshow_core::serde_canon::to_canonical_json;
use noshow_core::{ModelSelector, NoShowError, Result, TrainedModel, VersionTag};
use tempfile::NamedTempFile;
use tracing::instrument;

use crate::ModelStore;

const ARTIFACT_SUFFIX: &str = ".model.json";
const LATEST_FILE: &str = "LATEST";
const LOCK_FILE: &str = ".store.lock";

/// Exclusive advisory lock over the store directory, released on drop
struct SaveLock {
    file: File,
}

impl SaveLock {
    fn acquire(root: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(root.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for SaveLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Model store keeping one JSON file per version tag
#[derive(Debug, Clone)]
pub struct FsModelStore {
    root: PathBuf,
}

impl FsModelStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, tag: &VersionTag) -> PathBuf {
        self.root.join(format!("{tag}{ARTIFACT_SUFFIX}"))
    }

    fn write_artifact(&self, model: &TrainedModel) -> Result<()> {
        let json = to_canonical_json(model)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;

        tmp.persist_noclobber(self.artifact_path(&model.version))
            .map_err(|err| match err.error.kind() {
                io::ErrorKind::AlreadyExists => NoShowError::VersionConflict(model.version.to_string()),
                _ => NoShowError::Io(err.error),
            })?;
        Ok(())
    }

    fn write_latest(&self, tag: &VersionTag) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        writeln!(tmp, "{tag}")?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.root.join(LATEST_FILE))
            .map_err(|err| NoShowError::Io(err.error))?;
        Ok(())
    }

    fn read_latest(&self) -> Result<Option<VersionTag>> {
        let raw = match fs::read_to_string(self.root.join(LATEST_FILE)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        VersionTag::new(raw.trim())
            .map(Some)
            .map_err(|_| NoShowError::CorruptArtifact {
                tag: LATEST_FILE.to_string(),
                reason: format!("pointer holds an invalid tag {:?}", raw.trim()),
            })
    }

    fn read_artifact(&self, tag: &VersionTag) -> Result<TrainedModel> {
        let raw = match fs::read_to_string(self.artifact_path(tag)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(NoShowError::ModelNotFound(tag.to_string()))
            }
            Err(err) => {
                return Err(NoShowError::CorruptArtifact {
                    tag: tag.to_string(),
                    reason: err.to_string(),
                })
            }
        };

        let corrupt = |reason: String| NoShowError::CorruptArtifact {
            tag: tag.to_string(),
            reason,
        };

        let model: TrainedModel = serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;
        if &model.version != tag {
            return Err(corrupt(format!("file holds version {}", model.version)));
        }
        model.verify().map_err(corrupt)?;
        Ok(model)
    }
}

impl ModelStore for FsModelStore {
    #[instrument(skip(self, model), fields(tag = %model.version, root = %self.root.display()))]
    fn save(&self, model: &TrainedModel) -> Result<()> {
        let _lock = SaveLock::acquire(&self.root)?;

        self.write_artifact(model)?;
        if let Err(err) = self.write_latest(&model.version) {
            // Unpublish so the tag stays free for a retry
            if let Err(cleanup) = fs::remove_file(self.artifact_path(&model.version)) {
                tracing::warn!(error = %cleanup, "failed to remove artifact after pointer update failed");
            }
            return Err(err);
        }

        tracing::info!(hash = %model.model_hash, "model saved");
        Ok(())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn load(&self, selector: &ModelSelector) -> Result<TrainedModel> {
        let tag = match selector {
            ModelSelector::Latest => self
                .read_latest()?
                .ok_or_else(|| NoShowError::ModelNotFound(selector.to_string()))?,
            ModelSelector::Tag(tag) => tag.clone(),
        };

        let model = self.read_artifact(&tag)?;
        tracing::debug!(tag = %tag, hash = %model.model_hash, "model loaded");
        Ok(model)
    }

    fn tags(&self) -> Result<Vec<VersionTag>> {
        let mut tags = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(ARTIFACT_SUFFIX)) else {
                continue;
            };
            match VersionTag::new(stem) {
                Ok(tag) => tags.push(tag),
                Err(_) => tracing::warn!(file = ?name, "ignoring artifact with invalid tag"),
            }
        }
        tags.sort();
        Ok(tags)
    }

    fn latest_tag(&self) -> Result<Option<VersionTag>> {
        self.read_latest()
    }
}
