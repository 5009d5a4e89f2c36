use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public description of the peer that owns a repo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// peer id (hex public key)
    pub id: String,
    /// handle used in dataset references (`peername/name`)
    pub peername: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub created: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: impl Into<String>, peername: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            peername: peername.into(),
            name: None,
            description: None,
            homepage: None,
            created: Utc::now(),
        }
    }
}
