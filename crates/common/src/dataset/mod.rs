use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, ToDocument};

mod reference;

pub use reference::{DatasetRef, RefParseError};

/// Author-supplied description of a version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Descriptive metadata. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Shape of the dataset body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub format: String,
    #[serde(default)]
    pub entries: u64,
    #[serde(default)]
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

/// A single version of a dataset as stored in a repo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// content path of this version, set by the repo on write
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// content path of the version this one replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<Commit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Dataset {
    /// Title used for display: meta title, falling back to the commit title.
    pub fn title(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .or_else(|| self.commit.as_ref().map(|c| c.title.as_str()))
    }
}

impl ToDocument for Commit {
    fn to_document(&self) -> Document {
        Document::record()
            .field("title", &self.title)
            .field("message", &self.message)
            .field("author", &self.author)
            .field("timestamp", &self.timestamp)
            .build()
    }
}

impl ToDocument for Meta {
    fn to_document(&self) -> Document {
        let mut fields = vec![
            ("title".to_string(), self.title.to_document()),
            ("description".to_string(), self.description.to_document()),
            ("keywords".to_string(), self.keywords.to_document()),
            ("license".to_string(), self.license.to_document()),
        ];
        fields.extend(
            self.extra
                .iter()
                .map(|(k, v)| (k.clone(), v.to_document())),
        );
        Document::Record(fields)
    }
}

impl ToDocument for Structure {
    fn to_document(&self) -> Document {
        Document::record()
            .field("format", &self.format)
            .field("entries", &self.entries)
            .field("length", &self.length)
            .field("schema", &self.schema)
            .build()
    }
}

impl ToDocument for Dataset {
    fn to_document(&self) -> Document {
        Document::record()
            .field("path", &self.path)
            .field("previous_path", &self.previous_path)
            .field("commit", &self.commit)
            .field("meta", &self.meta)
            .field("structure", &self.structure)
            .field("body", &self.body)
            .build()
    }
}
