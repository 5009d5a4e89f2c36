use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    canonical_ref, content_path, head_ref, named_ref, page, referenced_version, Repo, RepoError,
};
use crate::dataset::{Dataset, DatasetRef};
use crate::profile::Profile;

/// In-memory repo, used by tests and throwaway peers
#[derive(Debug, Clone)]
pub struct MemoryRepo {
    inner: Arc<RwLock<MemoryRepoInner>>,
}

#[derive(Debug)]
struct MemoryRepoInner {
    profile: Profile,
    /// named heads, kept sorted by name
    refs: Vec<DatasetRef>,
    /// content path -> version
    versions: HashMap<String, Dataset>,
}

impl MemoryRepo {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryRepoInner {
                profile,
                refs: Vec::new(),
                versions: HashMap::new(),
            })),
        }
    }
}

#[async_trait]
impl Repo for MemoryRepo {
    async fn canonicalize(&self, reference: &DatasetRef) -> Result<DatasetRef, RepoError> {
        let (refs, peername) = {
            let inner = self.inner.read();
            (inner.refs.clone(), inner.profile.peername.clone())
        };
        let version = referenced_version(self, &refs, reference, &peername).await?;
        canonical_ref(&refs, reference, &peername, version.as_ref())
    }

    async fn load_dataset(&self, path: &str) -> Result<Dataset, RepoError> {
        self.inner
            .read()
            .versions
            .get(path)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(path.to_string()))
    }

    async fn put_dataset(&self, name: &str, mut dataset: Dataset) -> Result<DatasetRef, RepoError> {
        let mut inner = self.inner.write();

        let position = inner.refs.iter().position(|r| r.name == name);
        dataset.previous_path = position.map(|i| inner.refs[i].path.clone());
        dataset.path = content_path(&dataset)?;

        let head = head_ref(&inner.profile, name, &dataset);
        inner.versions.insert(dataset.path.clone(), dataset);
        match position {
            Some(i) => inner.refs[i] = head.clone(),
            None => {
                inner.refs.push(head.clone());
                inner.refs.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }

        Ok(head)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<DatasetRef>, RepoError> {
        Ok(page(&self.inner.read().refs, limit, offset))
    }

    async fn rename(
        &self,
        current: &DatasetRef,
        new_name: &str,
    ) -> Result<DatasetRef, RepoError> {
        let mut inner = self.inner.write();

        if inner.refs.iter().any(|r| r.name == new_name) {
            return Err(RepoError::Exists(new_name.to_string()));
        }

        let found = named_ref(&inner.refs, current, &inner.profile.peername)?;
        let entry = inner
            .refs
            .iter_mut()
            .find(|r| r.name == found.name)
            .ok_or_else(|| RepoError::NotFound(current.to_string()))?;
        entry.name = new_name.to_string();
        let renamed = entry.clone();
        inner.refs.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(renamed)
    }

    async fn delete(&self, reference: &DatasetRef) -> Result<(), RepoError> {
        let mut inner = self.inner.write();
        let found = named_ref(&inner.refs, reference, &inner.profile.peername)?;
        inner.refs.retain(|r| r.name != found.name);
        Ok(())
    }

    async fn profile(&self) -> Result<Profile, RepoError> {
        Ok(self.inner.read().profile.clone())
    }

    async fn set_profile(&self, profile: Profile) -> Result<(), RepoError> {
        let mut inner = self.inner.write();
        for r in inner.refs.iter_mut() {
            r.peername = profile.peername.clone();
        }
        inner.profile = profile;
        Ok(())
    }
}
