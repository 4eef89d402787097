//! Versioned storage of trained no-show models
//!
//! A stored artifact is always the forest together with the column schema it
//! was fit on. Tags are immutable once written, and `latest` resolves to the
//! most recently saved tag.

pub mod fs;
pub mod memory;

use noshow_core::{ModelSelector, Result, TrainedModel, VersionTag};

pub use fs::FsModelStore;
pub use memory::InMemoryModelStore;

/// Tag-indexed repository of trained models
pub trait ModelStore: Send + Sync {
    /// Commit `model` under `model.version`.
    ///
    /// Fails with `VersionConflict` if the tag is already taken.
    fn save(&self, model: &TrainedModel) -> Result<()>;

    /// Load a model by tag or the latest one.
    ///
    /// Absence is `ModelNotFound`; an artifact that exists but can't be
    /// trusted is `CorruptArtifact`.
    fn load(&self, selector: &ModelSelector) -> Result<TrainedModel>;

    /// All stored tags, sorted
    fn tags(&self) -> Result<Vec<VersionTag>>;

    /// Tag `latest` currently resolves to
    fn latest_tag(&self) -> Result<Option<VersionTag>>;
}

macro_rules! forward_model_store {
    ($($wrapper:ty),*) => {$(
        impl<S: ModelStore + ?Sized> ModelStore for $wrapper {
            fn save(&self, model: &TrainedModel) -> Result<()> {
                (**self).save(model)
            }

            fn load(&self, selector: &ModelSelector) -> Result<TrainedModel> {
                (**self).load(selector)
            }

            fn tags(&self) -> Result<Vec<VersionTag>> {
                (**self).tags()
            }

            fn latest_tag(&self) -> Result<Option<VersionTag>> {
                (**self).latest_tag()
            }
        }
    )*};
}

forward_model_store!(&S, std::sync::Arc<S>, Box<S>);
