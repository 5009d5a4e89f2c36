use std::sync::Arc;

use serde_json::json;

use crate::dataset::{Commit, Dataset, Meta, Structure};
use crate::profile::Profile;
use crate::repo::{MemoryRepo, Repo};

/// A small dataset with every component filled in
pub fn sample_dataset(title: &str, keywords: &[&str]) -> Dataset {
    Dataset {
        commit: Some(Commit {
            title: title.to_string(),
            message: None,
            author: Some("b5".to_string()),
            timestamp: "2020-01-01T00:00:00Z"
                .parse()
                .unwrap_or_default(),
        }),
        meta: Some(Meta {
            title: Some(format!("{} data", title)),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }),
        structure: Some(Structure {
            format: "json".to_string(),
            entries: 2,
            ..Default::default()
        }),
        body: Some(json!([{"city": "toronto", "mm": 12}, {"city": "berlin", "mm": 7}])),
        ..Default::default()
    }
}

/// Repo owned by peer `b5` holding:
///  - `precip`: two versions ("init" then "update"), keywords weather/rain
///  - `wind`: one version, keyword weather
pub async fn sample_repo() -> Arc<MemoryRepo> {
    let repo = MemoryRepo::new(Profile::new("b5-id", "b5"));
    let versions = [
        ("precip", sample_dataset("init", &["weather", "rain"])),
        ("precip", sample_dataset("update", &["weather", "rain"])),
        ("wind", sample_dataset("gusts", &["weather"])),
    ];
    for (name, dataset) in versions {
        // in-memory puts only fail on encoding, which these datasets can't
        let _ = repo.put_dataset(name, dataset).await;
    }
    Arc::new(repo)
}
