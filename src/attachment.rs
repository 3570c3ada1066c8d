//! Stored template attachments.
//!
//! A [`TrackedAttachment`] is the record a user uploads once and that is then
//! rendered for every recipient of a campaign. Storage of the records is up
//! to the caller; this module defines the record, its JSON shape and the
//! validation that must pass before a record is handed to the generator.

use crate::error::Result;
use crate::generate::{DocumentGenerator, GeneratedDocument};
use crate::render::{TemplateContext, TemplateRenderer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a record is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Tracked Attachment name not specified")]
    NameNotSpecified,

    #[error("Tracked Attachment content not specified")]
    ContentNotSpecified,

    #[error("Tracked Attachment type not specified")]
    TypeNotSpecified,

    #[error("Tracked Attachment filename not specified")]
    FilenameNotSpecified,
}

/// A template package owned by a user.
///
/// `content` holds the original, unrendered package and is base64 encoded in
/// JSON. `user_id` never leaves the server and is not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAttachment {
    #[serde(default)]
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    /// MIME type of the package
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(with = "base64_content")]
    pub content: Vec<u8>,
    #[serde(default)]
    pub modified_date: DateTime<Utc>,
    pub filename: String,
}

impl TrackedAttachment {
    /// Check that every required field is present.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::NameNotSpecified);
        }
        if self.content.is_empty() {
            return Err(ValidationError::ContentNotSpecified);
        }
        if self.mime_type.is_empty() {
            return Err(ValidationError::TypeNotSpecified);
        }
        if self.filename.is_empty() {
            return Err(ValidationError::FilenameNotSpecified);
        }
        Ok(())
    }

    /// Record a modification at the current time.
    pub fn touch(&mut self) {
        self.modified_date = Utc::now();
    }

    /// Validate the record and render it with the default generator.
    pub fn generate(&self, context: &TemplateContext) -> Result<GeneratedDocument> {
        self.generate_with(&DocumentGenerator::new(), context)
    }

    /// Validate the record and render it with `generator`.
    pub fn generate_with<R: TemplateRenderer>(
        &self,
        generator: &DocumentGenerator<R>,
        context: &TemplateContext,
    ) -> Result<GeneratedDocument> {
        self.validate()?;
        generator.generate(&self.content, context)
    }
}

mod base64_content {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(content))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
