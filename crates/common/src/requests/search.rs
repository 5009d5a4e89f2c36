use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Executor, ListParams, RequestError};
use crate::dataset::{Dataset, DatasetRef};
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const SEARCH: &str = "SearchRequests.Search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "q")]
    pub query: String,
    #[serde(flatten)]
    pub page: ListParams,
}

/// Find local datasets by name, title or keyword
#[derive(Debug, Clone)]
pub struct SearchRequests {
    executor: Executor<Arc<dyn Repo>>,
}

fn is_match(reference: &DatasetRef, dataset: &Dataset, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(&reference.name)
        || dataset.title().is_some_and(hit)
        || dataset
            .meta
            .as_ref()
            .is_some_and(|m| m.keywords.iter().any(|k| hit(k)))
}

impl SearchRequests {
    pub fn new(local: Option<Arc<dyn Repo>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    /// Case-insensitive substring search over dataset heads, in name order
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<DatasetRef>, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(SEARCH, params).await,
            Executor::Local(local) => local.handle(),
        };
        let needle = params.query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(RequestError::InvalidParams("search query is required".to_string()));
        }

        let mut found = Vec::new();
        for reference in repo.list(usize::MAX, 0).await? {
            let dataset = repo.load_dataset(&reference.path).await?;
            if is_match(&reference, &dataset, &needle) {
                found.push(reference);
            }
        }
        tracing::debug!(query = %needle, hits = found.len(), "searched datasets");

        Ok(found
            .into_iter()
            .skip(params.page.offset)
            .take(params.page.limit)
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testkit::sample_repo;

    fn query(q: &str) -> SearchParams {
        SearchParams {
            query: q.to_string(),
            page: ListParams::default(),
        }
    }

    async fn names(requests: &SearchRequests, q: &str) -> Vec<String> {
        requests
            .search(&query(q))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    #[tokio::test]
    async fn test_search_fields() {
        let requests = SearchRequests::new(Some(sample_repo().await), None).unwrap();

        // keyword shared by both
        assert_eq!(names(&requests, "Weather").await, ["precip", "wind"]);
        // keyword on one
        assert_eq!(names(&requests, "RAIN").await, ["precip"]);
        // name
        assert_eq!(names(&requests, "win").await, ["wind"]);
        // title
        assert_eq!(names(&requests, "gusts").await, ["wind"]);
        assert!(names(&requests, "snow").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let requests = SearchRequests::new(Some(sample_repo().await), None).unwrap();
        assert!(matches!(
            requests.search(&query("  ")).await,
            Err(RequestError::InvalidParams(_))
        ));
    }
}
