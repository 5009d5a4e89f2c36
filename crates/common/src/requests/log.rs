use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{canonicalize, ConfigError, Executor, ListParams, RequestError};
use crate::dataset::DatasetRef;
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const LOG: &str = "LogRequests.Log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogParams {
    #[serde(rename = "ref")]
    pub reference: DatasetRef,
    #[serde(flatten)]
    pub page: ListParams,
}

/// Version history of a dataset
#[derive(Debug, Clone)]
pub struct LogRequests {
    executor: Executor<Arc<dyn Repo>>,
}

impl LogRequests {
    pub fn new(local: Option<Arc<dyn Repo>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    /// Versions from the referenced one back to the first, newest first.
    ///  Each entry is a reference to that version.
    pub async fn log(&self, params: &LogParams) -> Result<Vec<DatasetRef>, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(LOG, params).await,
            Executor::Local(local) => local.handle(),
        };
        let head = canonicalize(repo.as_ref(), &params.reference).await?;

        let mut entries = Vec::new();
        let mut next = Some(head.path.clone());
        let mut position = 0;
        while let Some(path) = next {
            if entries.len() >= params.page.limit {
                break;
            }
            let version = repo.load_dataset(&path).await?;
            if position >= params.page.offset {
                entries.push(DatasetRef {
                    path: version.path.clone(),
                    title: version.title().map(str::to_string),
                    author: version.commit.as_ref().and_then(|c| c.author.clone()),
                    timestamp: version.commit.as_ref().map(|c| c.timestamp),
                    ..head.identity()
                });
            }
            position += 1;
            next = version.previous_path;
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testkit::sample_repo;

    fn params(limit: usize, offset: usize) -> LogParams {
        LogParams {
            reference: DatasetRef::new("me", "precip"),
            page: ListParams { limit, offset },
        }
    }

    #[tokio::test]
    async fn test_log_walks_back_to_first_version() {
        let requests = LogRequests::new(Some(sample_repo().await), None).unwrap();

        let log = requests.log(&params(10, 0)).await.unwrap();
        let titles: Vec<_> = log.iter().map(|r| r.title.as_deref().unwrap()).collect();
        assert_eq!(titles, ["update data", "init data"]);
        assert!(log.iter().all(|r| r.name == "precip" && r.peername == "b5"));
        assert_ne!(log[0].path, log[1].path);
    }

    #[tokio::test]
    async fn test_log_pages() {
        let requests = LogRequests::new(Some(sample_repo().await), None).unwrap();

        let page = requests.log(&params(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title.as_deref(), Some("init data"));

        assert!(requests.log(&params(10, 2)).await.unwrap().is_empty());
        assert!(requests.log(&params(0, 0)).await.unwrap().is_empty());
    }

    #[test]
    fn test_log_params_flatten_paging() {
        let params: LogParams = serde_json::from_str(r#"{"ref": {"name": "precip"}}"#).unwrap();
        assert_eq!(params.page, ListParams::default());
        assert_eq!(params.reference.name, "precip");
    }
}
