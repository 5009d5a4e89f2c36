use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{canonicalize, ConfigError, Executor, RequestError};
use crate::dataset::DatasetRef;
use crate::document::{select, ToDocument};
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const SELECT: &str = "SelectionRequests.Select";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectParams {
    #[serde(rename = "ref")]
    pub reference: DatasetRef,
    /// dot-separated, case-insensitive; empty selects the whole dataset
    #[serde(default)]
    pub path: String,
}

/// Pull a single value out of a dataset
#[derive(Debug, Clone)]
pub struct SelectionRequests {
    executor: Executor<Arc<dyn Repo>>,
}

impl SelectionRequests {
    pub fn new(local: Option<Arc<dyn Repo>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    pub async fn select(&self, params: &SelectParams) -> Result<serde_json::Value, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(SELECT, params).await,
            Executor::Local(local) => local.handle(),
        };
        let reference = canonicalize(repo.as_ref(), &params.reference).await?;
        let dataset = repo.load_dataset(&reference.path).await?;
        Ok(select(&dataset.to_document(), &params.path)?)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::document::PathError;
    use crate::testkit::sample_repo;

    async fn select_path(path: &str) -> Result<serde_json::Value, RequestError> {
        SelectionRequests::new(Some(sample_repo().await), None)
            .unwrap()
            .select(&SelectParams {
                reference: DatasetRef::new("me", "precip"),
                path: path.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn test_select_paths() {
        assert_eq!(select_path("Commit.Title").await.unwrap(), json!("update"));
        assert_eq!(select_path("commit.title").await.unwrap(), json!("update"));
        assert_eq!(select_path("meta.keywords.1").await.unwrap(), json!("rain"));
        assert_eq!(select_path("body.1.MM").await.unwrap(), json!(7));

        let whole = select_path("").await.unwrap();
        assert_eq!(whole["commit"]["title"], json!("update"));
    }

    #[tokio::test]
    async fn test_select_errors() {
        assert_eq!(
            select_path("commit.missing").await.unwrap_err(),
            RequestError::Path(PathError::InvalidPath("commit.missing".to_string()))
        );
        assert_eq!(
            select_path("meta.keywords.5").await.unwrap_err(),
            RequestError::Path(PathError::InvalidIndex("5".to_string()))
        );
        // unset optional fields are absent, not null
        assert!(matches!(
            select_path("commit.message").await.unwrap_err(),
            RequestError::Path(PathError::InvalidPath(_))
        ));
    }
}
