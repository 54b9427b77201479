//! In-memory store and fixtures for controller tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

use async_trait::async_trait;

use crate::controller::child::{ChildResource, ResourceKind};
use crate::controller::store::ResourceStore;
use crate::crd::{
    NodeTopologyMap, StorageCluster, StorageClusterSpec, StorageClusterStatus,
    ZONE_TOPOLOGY_LABEL,
};
use crate::error::{Error, Result};
use crate::platform::{CloudPlatform, VALID_CLOUD_PLATFORMS};

// =============================================================================
// Fixtures
// =============================================================================

/// Zones observed in the fixture topology
pub fn test_zones() -> Vec<String> {
    vec!["zone1".into(), "zone2".into(), "zone3".into()]
}

/// A persisted StorageCluster with a fully resolved status: failure domain
/// "zone" and three zones in the topology map.
pub fn test_cluster(name: &str) -> StorageCluster {
    let mut labels = BTreeMap::new();
    labels.insert(ZONE_TOPOLOGY_LABEL.to_string(), test_zones());

    let mut cluster = StorageCluster::new(name, StorageClusterSpec::default());
    cluster.metadata.uid = Some(format!("{}-uid", name));
    cluster.status = Some(StorageClusterStatus {
        phase: Some("Ready".into()),
        failure_domain: Some("zone".into()),
        node_topologies: Some(NodeTopologyMap { labels }),
    });
    cluster
}

/// Every classification reconciliation behavior is asserted against: the
/// recognized clouds plus the two non-cloud sentinels.
pub fn all_test_platforms() -> Vec<CloudPlatform> {
    let mut platforms: Vec<CloudPlatform> = VALID_CLOUD_PLATFORMS.to_vec();
    platforms.push(CloudPlatform::Unknown);
    platforms.push(CloudPlatform::Other("NonCloudPlatform".into()));
    platforms
}

// =============================================================================
// Memory Store
// =============================================================================

type ChildKey = (ResourceKind, String, String);

/// `ResourceStore` over in-memory maps, with write counters and failure
/// injection for exercising the convergence paths.
#[derive(Default)]
pub struct MemoryStore {
    clusters: RwLock<BTreeMap<(String, String), StorageCluster>>,
    children: RwLock<BTreeMap<ChildKey, ChildResource>>,
    creates: AtomicUsize,
    updates: AtomicUsize,
    /// When set, the next create stores the object but reports a conflict,
    /// simulating a concurrent writer winning the race.
    conflict_on_create: AtomicBool,
    /// Writes against this kind fail
    failing_kind: Mutex<Option<ResourceKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn child_key(kind: ResourceKind, namespace: Option<&str>, name: &str) -> ChildKey {
        (kind, namespace.unwrap_or_default().to_string(), name.to_string())
    }

    pub async fn insert_cluster(&self, cluster: StorageCluster) {
        let key = (
            cluster.metadata.namespace.clone().unwrap_or_default(),
            cluster.name().to_string(),
        );
        self.clusters.write().await.insert(key, cluster);
    }

    /// Place a child directly, bypassing counters, as if it pre-existed
    pub async fn seed_child(&self, mut child: ChildResource) {
        let meta = child.metadata_mut();
        meta.uid.get_or_insert_with(|| "seeded-uid".to_string());
        meta.resource_version.get_or_insert_with(|| "1".to_string());
        let key = Self::child_key(child.kind(), child.namespace(), child.name());
        self.children.write().await.insert(key, child);
    }

    pub async fn get_child(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<ChildResource> {
        let key = Self::child_key(kind, namespace, name);
        self.children.read().await.get(&key).cloned()
    }

    pub async fn child_count(&self) -> usize {
        self.children.read().await.len()
    }

    pub async fn names_of_kind(&self, kind: ResourceKind) -> Vec<String> {
        self.children
            .read()
            .await
            .keys()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, _, name)| name.clone())
            .collect()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn inject_create_conflict(&self) {
        self.conflict_on_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_kind(&self, kind: ResourceKind) {
        *self.failing_kind.lock().unwrap() = Some(kind);
    }

    fn check_failing(&self, kind: ResourceKind) -> Result<()> {
        if *self.failing_kind.lock().unwrap() == Some(kind) {
            return Err(Error::Internal(format!("injected failure for {}", kind)));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<Option<StorageCluster>> {
        let key = (namespace.to_string(), name.to_string());
        Ok(self.clusters.read().await.get(&key).cloned())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ChildResource>> {
        Ok(self.get_child(kind, namespace, name).await)
    }

    async fn create(&self, resource: &ChildResource) -> Result<()> {
        let kind = resource.kind();
        self.check_failing(kind)?;

        let key = Self::child_key(kind, resource.namespace(), resource.name());
        let exists = Error::ResourceExists {
            kind: kind.as_str().to_string(),
            name: resource.name().to_string(),
        };

        let mut children = self.children.write().await;
        if children.contains_key(&key) {
            return Err(exists);
        }

        let mut stored = resource.clone();
        let meta = stored.metadata_mut();
        meta.uid = Some(format!("{}-uid", resource.name()));
        meta.resource_version = Some("1".to_string());
        children.insert(key, stored);

        if self.conflict_on_create.swap(false, Ordering::SeqCst) {
            // The object landed, but as far as the caller knows a
            // concurrent writer beat it there.
            return Err(exists);
        }

        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, resource: &ChildResource) -> Result<()> {
        let kind = resource.kind();
        self.check_failing(kind)?;

        let key = Self::child_key(kind, resource.namespace(), resource.name());
        let mut children = self.children.write().await;
        if !children.contains_key(&key) {
            return Err(Error::ResourceNotFound {
                kind: kind.as_str().to_string(),
                name: resource.name().to_string(),
            });
        }
        children.insert(key, resource.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
