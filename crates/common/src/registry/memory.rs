use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{PinRequest, RegistryClient, RegistryError, RegistryStatus};
use crate::dataset::DatasetRef;

/// In-process registry. Datasets are keyed by `peername/name`, so
///  publishing a newer version replaces the older listing.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    pinning: bool,
    inner: Arc<RwLock<MemoryRegistryInner>>,
}

#[derive(Debug, Default)]
struct MemoryRegistryInner {
    published: HashMap<String, DatasetRef>,
    pins: Vec<PinRequest>,
}

fn listing_key(reference: &DatasetRef) -> String {
    format!("{}/{}", reference.peername, reference.name)
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            pinning: true,
            inner: Arc::new(RwLock::new(MemoryRegistryInner::default())),
        }
    }

    /// A registry that only indexes; every pin is refused
    pub fn without_pinning() -> Self {
        Self {
            pinning: false,
            ..Self::new()
        }
    }

    pub fn published(&self) -> Vec<DatasetRef> {
        let mut refs: Vec<_> = self.inner.read().published.values().cloned().collect();
        refs.sort_by_key(listing_key);
        refs
    }

    pub fn pins(&self) -> Vec<PinRequest> {
        self.inner.read().pins.clone()
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn pin(&self, reference: &DatasetRef, addrs: &[String]) -> Result<(), RegistryError> {
        if !self.pinning {
            return Err(RegistryError::PinningNotSupported);
        }
        self.inner.write().pins.push(PinRequest {
            reference: reference.clone(),
            addrs: addrs.to_vec(),
        });
        Ok(())
    }

    async fn publish(&self, reference: &DatasetRef) -> Result<(), RegistryError> {
        self.inner
            .write()
            .published
            .insert(listing_key(reference), reference.clone());
        Ok(())
    }

    async fn unpublish(&self, reference: &DatasetRef) -> Result<(), RegistryError> {
        self.inner
            .write()
            .published
            .remove(&listing_key(reference))
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(reference.to_string()))
    }

    async fn status(&self, reference: &DatasetRef) -> Result<RegistryStatus, RegistryError> {
        Ok(RegistryStatus {
            published: self
                .inner
                .read()
                .published
                .contains_key(&listing_key(reference)),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_publish_lifecycle() {
        let registry = MemoryRegistry::new();
        let v1 = DatasetRef::new("b5", "precip").with_path("/map/a");
        let v2 = DatasetRef::new("b5", "precip").with_path("/map/b");

        assert!(!registry.status(&v1).await.unwrap().published);
        registry.publish(&v1).await.unwrap();
        registry.publish(&v2).await.unwrap();
        assert!(registry.status(&v1).await.unwrap().published);
        assert_eq!(registry.published(), vec![v2.clone()]);

        registry.unpublish(&v2).await.unwrap();
        assert!(matches!(
            registry.unpublish(&v2).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_pinning_toggle() {
        let reference = DatasetRef::new("b5", "precip");
        let addrs = vec!["/ip4/127.0.0.1/tcp/1/p2p/a".to_string()];

        let registry = MemoryRegistry::new();
        registry.pin(&reference, &addrs).await.unwrap();
        assert_eq!(registry.pins()[0].addrs, addrs);

        let registry = MemoryRegistry::without_pinning();
        assert!(matches!(
            registry.pin(&reference, &addrs).await,
            Err(RegistryError::PinningNotSupported)
        ));
        assert!(registry.pins().is_empty());
    }
}
