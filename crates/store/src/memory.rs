//! In-process model store

use std::collections::BTreeMap;

use noshow_core::{ModelSelector, NoShowError, Result, TrainedModel, VersionTag};
use parking_lot::RwLock;

use crate::ModelStore;

#[derive(Default)]
struct Slots {
    models: BTreeMap<VersionTag, TrainedModel>,
    /// Tags in save order; the last one is `latest`
    history: Vec<VersionTag>,
}

/// Model store held in memory, for tests and embedding
#[derive(Default)]
pub struct InMemoryModelStore {
    slots: RwLock<Slots>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.read().models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().models.is_empty()
    }
}

impl ModelStore for InMemoryModelStore {
    fn save(&self, model: &TrainedModel) -> Result<()> {
        let mut slots = self.slots.write();
        if slots.models.contains_key(&model.version) {
            return Err(NoShowError::VersionConflict(model.version.to_string()));
        }
        slots.models.insert(model.version.clone(), model.clone());
        slots.history.push(model.version.clone());
        tracing::debug!(tag = %model.version, "model stored in memory");
        Ok(())
    }

    fn load(&self, selector: &ModelSelector) -> Result<TrainedModel> {
        let slots = self.slots.read();
        let tag = match selector {
            ModelSelector::Latest => slots.history.last(),
            ModelSelector::Tag(tag) => Some(tag),
        };
        tag.and_then(|tag| slots.models.get(tag))
            .cloned()
            .ok_or_else(|| NoShowError::ModelNotFound(selector.to_string()))
    }

    fn tags(&self) -> Result<Vec<VersionTag>> {
        Ok(self.slots.read().models.keys().cloned().collect())
    }

    fn latest_tag(&self) -> Result<Option<VersionTag>> {
        Ok(self.slots.read().history.last().cloned())
    }
}
