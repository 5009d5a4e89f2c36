use std::fmt::Debug;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::dataset::{Dataset, DatasetRef};
use crate::profile::Profile;

mod fs;
mod memory;

pub use fs::FsRepo;
pub use memory::MemoryRepo;

/// Prefix of content paths produced by the repos in this crate
pub const CONTENT_PATH_PREFIX: &str = "/map/";

/// Peername alias for "the peer that owns this repo"
pub const SELF_PEERNAME: &str = "me";

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("dataset not found: {0}")]
    NotFound(String),
    #[error("dataset name already in use: {0}")]
    Exists(String),
    #[error("repo io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("repo encoding error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("repo error: {0}")]
    Internal(String),
}

/// Local store of dataset versions and the names that point at them.
///
/// Names map to the head version of a dataset. Versions are immutable and
///  addressed by content path; each one records the path it replaced.
#[async_trait]
pub trait Repo: Send + Sync + Debug + 'static {
    /// Fill in the missing identifying parts of a reference
    ///
    /// # Errors
    /// * `RepoError::NotFound` - no dataset matches the reference
    async fn canonicalize(&self, reference: &DatasetRef) -> Result<DatasetRef, RepoError>;

    /// Load a version by content path
    async fn load_dataset(&self, path: &str) -> Result<Dataset, RepoError>;

    /// Store a new version of `name`, linking it to the current head.
    ///  Returns the reference to the new head.
    async fn put_dataset(&self, name: &str, dataset: Dataset) -> Result<DatasetRef, RepoError>;

    /// Page through the named datasets, ordered by name
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<DatasetRef>, RepoError>;

    /// Point a new name at an existing dataset head
    ///
    /// # Errors
    /// * `RepoError::Exists` - the new name is taken
    async fn rename(&self, current: &DatasetRef, new_name: &str)
        -> Result<DatasetRef, RepoError>;

    /// Drop a name. Stored versions are left in place.
    async fn delete(&self, reference: &DatasetRef) -> Result<(), RepoError>;

    async fn profile(&self) -> Result<Profile, RepoError>;

    async fn set_profile(&self, profile: Profile) -> Result<(), RepoError>;
}

/// Content path of a dataset version: the sha256 of its JSON encoding
///  with the path itself left out.
pub fn content_path(dataset: &Dataset) -> Result<String, RepoError> {
    let unaddressed = Dataset {
        path: String::new(),
        ..dataset.clone()
    };
    let bytes = serde_json::to_vec(&unaddressed)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{}{}", CONTENT_PATH_PREFIX, hex::encode(digest)))
}

fn is_own_peername(peername: &str, own: &str) -> bool {
    peername.is_empty() || peername == SELF_PEERNAME || peername == own
}

/// Find the stored reference a (possibly partial) reference points at.
///  Name lookups win over path lookups; a path-only reference matches the
///  first head at that path.
pub(crate) fn find_ref<'a>(
    refs: &'a [DatasetRef],
    reference: &DatasetRef,
    own_peername: &str,
) -> Option<&'a DatasetRef> {
    if !reference.name.is_empty() {
        return refs.iter().find(|r| {
            r.name == reference.name
                && (r.peername == reference.peername
                    || (is_own_peername(&reference.peername, own_peername)
                        && r.peername == own_peername))
        });
    }
    if !reference.path.is_empty() {
        return refs.iter().find(|r| r.path == reference.path);
    }
    None
}

/// Stored reference a rename or delete acts on. Only the name (or, for
///  unnamed references, the head path) is considered.
pub(crate) fn named_ref(
    refs: &[DatasetRef],
    reference: &DatasetRef,
    own_peername: &str,
) -> Result<DatasetRef, RepoError> {
    find_ref(refs, reference, own_peername)
        .cloned()
        .ok_or_else(|| RepoError::NotFound(reference.to_string()))
}

/// Version an explicit reference path points at, if this repo holds it.
///  For a named reference the version must be the head or one of its
///  ancestors.
pub(crate) async fn referenced_version<R: Repo + ?Sized>(
    repo: &R,
    refs: &[DatasetRef],
    reference: &DatasetRef,
    own_peername: &str,
) -> Result<Option<Dataset>, RepoError> {
    if reference.path.is_empty() {
        return Ok(None);
    }
    match find_ref(refs, reference, own_peername) {
        Some(head) if !reference.name.is_empty() => {
            let mut next = Some(head.path.clone());
            while let Some(path) = next {
                let Some(version) = stored_version(repo, &path).await? else {
                    return Ok(None);
                };
                if path == reference.path {
                    return Ok(Some(version));
                }
                next = version.previous_path;
            }
            Ok(None)
        }
        _ => stored_version(repo, &reference.path).await,
    }
}

async fn stored_version<R: Repo + ?Sized>(
    repo: &R,
    path: &str,
) -> Result<Option<Dataset>, RepoError> {
    match repo.load_dataset(path).await {
        Ok(version) => Ok(Some(version)),
        Err(RepoError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Canonical form of `reference` given the stored refs. `version` is the
///  stored version at the reference's explicit path, as found by
///  `referenced_version`.
pub(crate) fn canonical_ref(
    refs: &[DatasetRef],
    reference: &DatasetRef,
    own_peername: &str,
    version: Option<&Dataset>,
) -> Result<DatasetRef, RepoError> {
    if reference.is_empty() {
        return Err(RepoError::NotFound("empty reference".to_string()));
    }

    match (find_ref(refs, reference, own_peername), version) {
        (Some(found), _) if reference.path.is_empty() || found.path == reference.path => {
            Ok(found.clone())
        }
        // an explicit path pins an older version of a named dataset
        (Some(found), Some(version)) => Ok(DatasetRef {
            path: reference.path.clone(),
            title: version.title().map(str::to_string),
            author: version.commit.as_ref().and_then(|c| c.author.clone()),
            timestamp: version.commit.as_ref().map(|c| c.timestamp),
            ..found.clone()
        }),
        (None, Some(_)) if reference.name.is_empty() => Ok(reference.identity()),
        _ => Err(RepoError::NotFound(reference.to_string())),
    }
}

/// Reference for a freshly stored head, with display fields copied from
///  the version.
pub(crate) fn head_ref(profile: &Profile, name: &str, dataset: &Dataset) -> DatasetRef {
    DatasetRef {
        peername: profile.peername.clone(),
        profile_id: profile.id.clone(),
        name: name.to_string(),
        path: dataset.path.clone(),
        title: dataset.title().map(str::to_string),
        author: dataset.commit.as_ref().and_then(|c| c.author.clone()),
        timestamp: dataset.commit.as_ref().map(|c| c.timestamp),
    }
}

pub(crate) fn page<T: Clone>(items: &[T], limit: usize, offset: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}
