use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, ToDocument};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefParseError {
    #[error("empty dataset reference")]
    Empty,
    #[error("invalid dataset reference '{0}': {1}")]
    Invalid(String, &'static str),
}

/// Identifies a dataset: who holds it, what it's called locally, and where
///  its content lives. Title, author and timestamp are denormalized from
///  the dataset for display and are never used for resolution.
///
/// The string form is `peername/name@path`; every part is optional but at
///  least one of name or path must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub peername: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DatasetRef {
    pub fn new(peername: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            peername: peername.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// True when nothing identifies a dataset. An empty ref is an error
    ///  for every operation, never a wildcard.
    pub fn is_empty(&self) -> bool {
        self.peername.is_empty() && self.name.is_empty() && self.path.is_empty()
    }

    /// Reference stripped down to its identifying parts.
    pub fn identity(&self) -> DatasetRef {
        DatasetRef {
            peername: self.peername.clone(),
            profile_id: self.profile_id.clone(),
            name: self.name.clone(),
            path: self.path.clone(),
            ..Default::default()
        }
    }

    pub fn parse(s: &str) -> Result<Self, RefParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RefParseError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(RefParseError::Invalid(s.to_string(), "contains whitespace"));
        }

        let (handle, path) = match s.split_once('@') {
            Some((handle, path)) => (handle, path),
            None => (s, ""),
        };

        if !path.is_empty() && !path.starts_with('/') {
            return Err(RefParseError::Invalid(
                s.to_string(),
                "path must start with '/'",
            ));
        }

        let (peername, name) = match handle.split_once('/') {
            Some((peername, name)) => (peername, name),
            None => ("", handle),
        };

        if name.contains('/') {
            return Err(RefParseError::Invalid(
                s.to_string(),
                "expected peername/name",
            ));
        }
        if !peername.is_empty() && name.is_empty() {
            return Err(RefParseError::Invalid(s.to_string(), "missing name"));
        }
        if name.is_empty() && path.is_empty() {
            return Err(RefParseError::Empty);
        }

        Ok(DatasetRef {
            peername: peername.to_string(),
            name: name.to_string(),
            path: path.to_string(),
            ..Default::default()
        })
    }
}

impl FromStr for DatasetRef {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetRef::parse(s)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.peername.is_empty() {
            write!(f, "{}/", self.peername)?;
        }
        write!(f, "{}", self.name)?;
        if !self.path.is_empty() {
            write!(f, "@{}", self.path)?;
        }
        Ok(())
    }
}

impl ToDocument for DatasetRef {
    fn to_document(&self) -> Document {
        Document::record()
            .field("peername", &self.peername)
            .field("profile_id", &self.profile_id)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("title", &self.title)
            .field("author", &self.author)
            .field("timestamp", &self.timestamp)
            .build()
    }
}
