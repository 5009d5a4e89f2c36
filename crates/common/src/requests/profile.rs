use std::sync::Arc;

use super::dataset::validate_name;
use super::{ConfigError, Executor, RequestError};
use crate::profile::Profile;
use crate::repo::Repo;
use crate::rpc::RpcClient;

pub const GET_PROFILE: &str = "ProfileRequests.GetProfile";
pub const SAVE_PROFILE: &str = "ProfileRequests.SaveProfile";

/// The repo owner's public profile
#[derive(Debug, Clone)]
pub struct ProfileRequests {
    executor: Executor<Arc<dyn Repo>>,
}

impl ProfileRequests {
    pub fn new(local: Option<Arc<dyn Repo>>, remote: Option<RpcClient>) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: Executor::from_parts(local, remote)?,
        })
    }

    pub async fn get_profile(&self) -> Result<Profile, RequestError> {
        match &self.executor {
            Executor::Remote(remote) => remote.call(GET_PROFILE, &()).await,
            Executor::Local(local) => Ok(local.handle().profile().await?),
        }
    }

    /// Update the profile. The peer id and creation time are owned by the
    ///  repo and can't be changed; changing the peername re-labels every
    ///  local dataset reference.
    pub async fn save_profile(&self, profile: &Profile) -> Result<Profile, RequestError> {
        let repo = match &self.executor {
            Executor::Remote(remote) => return remote.call(SAVE_PROFILE, profile).await,
            Executor::Local(local) => local.handle(),
        };
        validate_name(&profile.peername)
            .map_err(|_| RequestError::InvalidParams(format!("invalid peername '{}'", profile.peername)))?;

        let current = repo.profile().await?;
        let updated = Profile {
            id: current.id,
            created: current.created,
            ..profile.clone()
        };
        repo.set_profile(updated.clone()).await?;
        tracing::info!(peername = %updated.peername, "saved profile");
        Ok(updated)
    }
}
