use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use super::{
    canonical_ref, content_path, head_ref, named_ref, page, referenced_version, Repo,
    RepoError, CONTENT_PATH_PREFIX,
};
use crate::dataset::{Dataset, DatasetRef};
use crate::profile::Profile;

const REFS_FILE_NAME: &str = "refs.json";
const PROFILE_FILE_NAME: &str = "profile.json";
const VERSIONS_DIR_NAME: &str = "versions";

/// Repo persisted as JSON files under a directory:
///
/// ```text
/// <root>/profile.json
/// <root>/refs.json
/// <root>/versions/<sha256>.json
/// ```
#[derive(Debug, Clone)]
pub struct FsRepo {
    root: PathBuf,
    // serializes read-modify-write cycles on refs.json within this process
    write_lock: Arc<Mutex<()>>,
}

impl FsRepo {
    /// Open (creating if needed) a repo rooted at `root`. `profile` is only
    ///  written when the repo has none yet.
    pub async fn open(root: impl Into<PathBuf>, profile: Profile) -> Result<Self, RepoError> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(VERSIONS_DIR_NAME)).await?;

        let repo = Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        };

        if !tokio::fs::try_exists(repo.profile_path()).await? {
            write_json(&repo.profile_path(), &profile).await?;
        }
        if !tokio::fs::try_exists(repo.refs_path()).await? {
            write_json(&repo.refs_path(), &Vec::<DatasetRef>::new()).await?;
        }

        tracing::debug!(root = %repo.root.display(), "opened repo");
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn refs_path(&self) -> PathBuf {
        self.root.join(REFS_FILE_NAME)
    }

    fn profile_path(&self) -> PathBuf {
        self.root.join(PROFILE_FILE_NAME)
    }

    fn version_path(&self, path: &str) -> Option<PathBuf> {
        let hash = path.strip_prefix(CONTENT_PATH_PREFIX)?;
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(self.root.join(VERSIONS_DIR_NAME).join(format!("{}.json", hash)))
    }

    async fn refs(&self) -> Result<Vec<DatasetRef>, RepoError> {
        read_json(&self.refs_path()).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RepoError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RepoError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    // write-then-rename so readers never observe a partial file
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl Repo for FsRepo {
    async fn canonicalize(&self, reference: &DatasetRef) -> Result<DatasetRef, RepoError> {
        let refs = self.refs().await?;
        let profile = self.profile().await?;
        let version = referenced_version(self, &refs, reference, &profile.peername).await?;
        canonical_ref(&refs, reference, &profile.peername, version.as_ref())
    }

    async fn load_dataset(&self, path: &str) -> Result<Dataset, RepoError> {
        let file = self
            .version_path(path)
            .ok_or_else(|| RepoError::NotFound(path.to_string()))?;
        match read_json(&file).await {
            Err(RepoError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepoError::NotFound(path.to_string()))
            }
            result => result,
        }
    }

    async fn put_dataset(&self, name: &str, mut dataset: Dataset) -> Result<DatasetRef, RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut refs = self.refs().await?;
        let profile = self.profile().await?;

        let position = refs.iter().position(|r| r.name == name);
        dataset.previous_path = position.map(|i| refs[i].path.clone());
        dataset.path = content_path(&dataset)?;

        let file = self
            .version_path(&dataset.path)
            .ok_or_else(|| RepoError::Internal(format!("bad content path {}", dataset.path)))?;
        write_json(&file, &dataset).await?;

        let head = head_ref(&profile, name, &dataset);
        match position {
            Some(i) => refs[i] = head.clone(),
            None => {
                refs.push(head.clone());
                refs.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }
        write_json(&self.refs_path(), &refs).await?;

        tracing::debug!(name, path = %head.path, "stored dataset version");
        Ok(head)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<DatasetRef>, RepoError> {
        Ok(page(&self.refs().await?, limit, offset))
    }

    async fn rename(
        &self,
        current: &DatasetRef,
        new_name: &str,
    ) -> Result<DatasetRef, RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut refs = self.refs().await?;
        let profile = self.profile().await?;

        if refs.iter().any(|r| r.name == new_name) {
            return Err(RepoError::Exists(new_name.to_string()));
        }

        let found = named_ref(&refs, current, &profile.peername)?;
        let entry = refs
            .iter_mut()
            .find(|r| r.name == found.name)
            .ok_or_else(|| RepoError::NotFound(current.to_string()))?;
        entry.name = new_name.to_string();
        let renamed = entry.clone();
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        write_json(&self.refs_path(), &refs).await?;

        Ok(renamed)
    }

    async fn delete(&self, reference: &DatasetRef) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut refs = self.refs().await?;
        let profile = self.profile().await?;

        let found = named_ref(&refs, reference, &profile.peername)?;
        refs.retain(|r| r.name != found.name);
        write_json(&self.refs_path(), &refs).await
    }

    async fn profile(&self) -> Result<Profile, RepoError> {
        read_json(&self.profile_path()).await
    }

    async fn set_profile(&self, profile: Profile) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut refs = self.refs().await?;
        for r in refs.iter_mut() {
            r.peername = profile.peername.clone();
        }
        write_json(&self.refs_path(), &refs).await?;
        write_json(&self.profile_path(), &profile).await
    }
}
