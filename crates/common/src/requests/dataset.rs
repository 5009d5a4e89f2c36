use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{canonicalize, ConfigError, Executor, ListParams, RequestError};
use crate::dataset::{Dataset, DatasetRef};
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const LIST: &str = "DatasetRequests.List";
pub const GET: &str = "DatasetRequests.Get";
pub const SAVE: &str = "DatasetRequests.Save";
pub const RENAME: &str = "DatasetRequests.Rename";
pub const REMOVE: &str = "DatasetRequests.Remove";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveParams {
    pub name: String,
    pub dataset: Dataset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameParams {
    pub current: DatasetRef,
    pub new_name: String,
}

/// Dataset names are path-like handles: lowercase-friendly, no separators
///  the reference syntax uses.
pub fn validate_name(name: &str) -> Result<(), RequestError> {
    if name.is_empty() {
        return Err(RequestError::InvalidParams("dataset name is required".to_string()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(RequestError::InvalidParams(format!(
            "dataset name '{}' contains '{}', only letters, digits, '_' and '-' are allowed",
            name, c
        )));
    }
    Ok(())
}

/// Read and write the datasets held in a repo
#[derive(Debug, Clone)]
pub struct DatasetRequests {
    executor: Executor<Arc<dyn Repo>>,
}

impl DatasetRequests {
    pub fn new(local: Option<Arc<dyn Repo>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    pub async fn list(&self, params: &ListParams) -> Result<Vec<DatasetRef>, RequestError> {
        match &self.executor {
            Executor::Remote(remote) => remote.call(LIST, params).await,
            Executor::Local(local) => Ok(local.handle().list(params.limit, params.offset).await?),
        }
    }

    pub async fn get(&self, reference: &DatasetRef) -> Result<Dataset, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(GET, reference).await,
            Executor::Local(local) => local.handle(),
        };
        let reference = canonicalize(repo.as_ref(), reference).await?;
        Ok(repo.load_dataset(&reference.path).await?)
    }

    /// Store a new version under `name`, returning the new head
    pub async fn save(&self, params: &SaveParams) -> Result<DatasetRef, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(SAVE, params).await,
            Executor::Local(local) => local.handle(),
        };
        validate_name(&params.name)?;
        let head = repo.put_dataset(&params.name, params.dataset.clone()).await?;
        tracing::info!(reference = %head, "saved dataset version");
        Ok(head)
    }

    pub async fn rename(&self, params: &RenameParams) -> Result<DatasetRef, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(RENAME, params).await,
            Executor::Local(local) => local.handle(),
        };
        validate_name(&params.new_name)?;
        let current = canonicalize(repo.as_ref(), &params.current).await?;
        let renamed = repo.rename(&current, &params.new_name).await?;
        tracing::info!(from = %current.name, to = %renamed.name, "renamed dataset");
        Ok(renamed)
    }

    /// Drop a dataset name, returning the reference that was removed
    pub async fn remove(&self, reference: &DatasetRef) -> Result<DatasetRef, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(REMOVE, reference).await,
            Executor::Local(local) => local.handle(),
        };
        let reference = canonicalize(repo.as_ref(), reference).await?;
        repo.delete(&reference).await?;
        tracing::info!(%reference, "removed dataset");
        Ok(reference)
    }
}
