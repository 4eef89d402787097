//! Trained model artifacts and the version tags they are stored under

use crate::errors::{NoShowError, Result};
use crate::forest::ForestModel;
use crate::schema::FeatureSchema;
use crate::serde_canon::hash_canonical_hex;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TIMESTAMP_TAG_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";
const TIMESTAMP_TAG_PARSE: &str = "%Y%m%dT%H%M%S%.fZ";

/// Identifier of one stored model version.
///
/// Restricted to `[A-Za-z0-9._-]` so it can double as a file stem, and never
/// equal to the `latest` alias.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(String);

impl VersionTag {
    /// Alias resolving to the most recently saved version
    pub const LATEST_ALIAS: &'static str = "latest";

    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        let legal = !tag.is_empty()
            && !tag.starts_with('.')
            && tag.len() <= 128
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !legal || tag.eq_ignore_ascii_case(Self::LATEST_ALIAS) {
            return Err(NoShowError::InvalidVersionTag(tag));
        }
        Ok(Self(tag))
    }

    /// Tag for a training run finishing at `at`, e.g. `20240108T093000.000000Z`
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.format(TIMESTAMP_TAG_FORMAT).to_string())
    }

    /// Fresh timestamp tag that sorts strictly after `latest` when `latest`
    /// is itself a timestamp tag.
    pub fn next_after(latest: Option<&VersionTag>, now: DateTime<Utc>) -> Self {
        let at = match latest.and_then(VersionTag::timestamp) {
            Some(prev) if prev >= now => prev + Duration::microseconds(1),
            _ => now,
        };
        Self::from_timestamp(at)
    }

    /// Training time encoded in a timestamp tag
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.0, TIMESTAMP_TAG_PARSE)
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VersionTag {
    type Error = NoShowError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.0
    }
}

impl FromStr for VersionTag {
    type Err = NoShowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Which stored version to load
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelSelector {
    Latest,
    Tag(VersionTag),
}

impl From<Option<&VersionTag>> for ModelSelector {
    fn from(tag: Option<&VersionTag>) -> Self {
        match tag {
            Some(tag) => ModelSelector::Tag(tag.clone()),
            None => ModelSelector::Latest,
        }
    }
}

impl FromStr for ModelSelector {
    type Err = NoShowError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case(VersionTag::LATEST_ALIAS) {
            Ok(ModelSelector::Latest)
        } else {
            VersionTag::new(s.trim()).map(ModelSelector::Tag)
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelector::Latest => f.write_str(VersionTag::LATEST_ALIAS),
            ModelSelector::Tag(tag) => tag.fmt(f),
        }
    }
}

#[derive(Serialize)]
struct HashedContent<'a> {
    schema: &'a FeatureSchema,
    forest: &'a ForestModel,
}

/// A fitted forest bundled with the schema it was fit on.
///
/// Model and schema travel together everywhere, so a reader can never see
/// one without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub version: VersionTag,
    pub trained_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub forest: ForestModel,
    /// Historical rows the forest was fit on
    pub training_rows: usize,
    /// Of which were no-shows
    pub positive_rows: usize,
    /// BLAKE3 over canonical `(schema, forest)`
    pub model_hash: String,
}

impl TrainedModel {
    pub fn new(
        version: VersionTag,
        trained_at: DateTime<Utc>,
        schema: FeatureSchema,
        forest: ForestModel,
        training_rows: usize,
        positive_rows: usize,
    ) -> Result<Self> {
        let model_hash = Self::compute_hash(&schema, &forest)?;
        Ok(Self {
            version,
            trained_at,
            schema,
            forest,
            training_rows,
            positive_rows,
            model_hash,
        })
    }

    pub fn compute_hash(schema: &FeatureSchema, forest: &ForestModel) -> Result<String> {
        Ok(hash_canonical_hex(&HashedContent { schema, forest })?)
    }

    /// Structural and integrity checks run by stores on every load.
    pub fn verify(&self) -> std::result::Result<(), String> {
        self.schema.validate().map_err(|e| e.to_string())?;
        self.forest.validate()?;
        if self.schema.len() != self.forest.feature_count {
            return Err(format!(
                "schema has {} columns but forest was fit on {}",
                self.schema.len(),
                self.forest.feature_count
            ));
        }
        let expected = Self::compute_hash(&self.schema, &self.forest).map_err(|e| e.to_string())?;
        if expected != self.model_hash {
            return Err(format!(
                "model hash mismatch: recorded {}, computed {}",
                self.model_hash, expected
            ));
        }
        Ok(())
    }
}
