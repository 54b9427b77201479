//! Initialization reconciler
//!
//! One reconciliation pass: resolve the StorageCluster named by the
//! request, synthesize every applicable child resource for the detected
//! platform, attach ownership, and hand the batch to the convergence
//! engine. A request that resolves to no cluster is a successful no-op.

use std::time::Duration;
use tracing::{debug, info};

use crate::controller::child::ChildResource;
use crate::controller::converge::ConvergenceEngine;
use crate::controller::ownership;
use crate::controller::store::ResourceStoreRef;
use crate::controller::synthesis::SYNTHESIZERS;
use crate::crd::StorageCluster;
use crate::error::Result;
use crate::platform::CloudPlatform;

// =============================================================================
// Request and Outcome
// =============================================================================

/// Identity of the cluster a reconciliation pass targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub name: String,
    pub namespace: String,
}

impl ReconcileRequest {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// What the control loop should do after a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Requeue delay, `None` to wait for the next watch event
    pub requeue_after: Option<Duration>,
}

impl ReconcileOutcome {
    /// Converged; wait for changes
    pub fn done() -> Self {
        Self {
            requeue_after: None,
        }
    }
}

// =============================================================================
// Reconciler
// =============================================================================

pub struct Reconciler {
    store: ResourceStoreRef,
    platform: CloudPlatform,
    engine: ConvergenceEngine,
}

impl Reconciler {
    pub fn new(store: ResourceStoreRef, platform: CloudPlatform) -> Self {
        Self {
            engine: ConvergenceEngine::new(store.clone()),
            store,
            platform,
        }
    }

    /// Run one reconciliation pass for `request`.
    ///
    /// Synthesis is all-or-nothing: every applicable synthesizer must
    /// produce its resources before anything is written, so a cluster with
    /// incomplete status never gets a partial child set created.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> Result<ReconcileOutcome> {
        let Some(cluster) = self
            .store
            .get_cluster(&request.namespace, &request.name)
            .await?
        else {
            info!(
                namespace = %request.namespace,
                name = %request.name,
                "No StorageCluster for request, nothing to reconcile"
            );
            return Ok(ReconcileOutcome::done());
        };

        let desired = self.synthesize(&cluster)?;
        let applied = self.engine.converge(desired).await?;
        info!(
            name = %cluster.name(),
            platform = %self.platform,
            resources = applied.len(),
            "StorageCluster children converged"
        );
        Ok(ReconcileOutcome::done())
    }

    fn synthesize(&self, cluster: &StorageCluster) -> Result<Vec<ChildResource>> {
        let mut desired = Vec::new();
        for synthesizer in SYNTHESIZERS {
            if !(synthesizer.applies)(&self.platform) {
                debug!(
                    kind = %synthesizer.kind,
                    platform = %self.platform,
                    "Kind not applicable on this platform"
                );
                continue;
            }
            let mut batch = (synthesizer.synthesize)(cluster)?;
            for resource in &mut batch {
                ownership::apply(resource, cluster);
            }
            desired.append(&mut batch);
        }
        Ok(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::child::ResourceKind;
    use crate::controller::testing::{all_test_platforms, test_cluster, MemoryStore};
    use crate::crd::{CephBlockPool, CephBlockPoolSpec, ReplicatedSpec, StorageClusterSpec};
    use crate::error::Error;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_cluster(test_cluster("ocsinit")).await;
        store
    }

    fn request() -> ReconcileRequest {
        ReconcileRequest::new("", "ocsinit")
    }

    #[tokio::test]
    async fn test_request_without_cluster_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(store.clone(), CloudPlatform::Unknown);

        let outcome = reconciler
            .reconcile(&ReconcileRequest::new(
                "ocsinit-test-not-found",
                "ocsinit-test-not-found",
            ))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::done());
        assert_eq!(store.create_count(), 0);
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_creates_expected_children_per_platform() {
        for platform in all_test_platforms() {
            let store = seeded_store().await;
            let reconciler = Reconciler::new(store.clone(), platform.clone());
            reconciler.reconcile(&request()).await.unwrap();

            // Unconditional on every platform
            for (kind, name) in [
                (ResourceKind::StorageClass, "ocsinit-cephfs"),
                (ResourceKind::StorageClass, "ocsinit-ceph-rbd"),
                (ResourceKind::CephFilesystem, "ocsinit-cephfilesystem"),
                (ResourceKind::CephBlockPool, "ocsinit-cephblockpool"),
            ] {
                assert!(
                    store.get_child(kind, None, name).await.is_some(),
                    "{}/{} missing on {}",
                    kind,
                    name,
                    platform
                );
            }

            let user = store
                .get_child(
                    ResourceKind::CephObjectStoreUser,
                    None,
                    "ocsinit-cephobjectstoreuser",
                )
                .await;
            if platform == CloudPlatform::Aws {
                assert!(user.is_none(), "user should not exist on aws");
            } else {
                assert!(user.is_some(), "user missing on {}", platform);
            }

            let object_store = store
                .get_child(ResourceKind::CephObjectStore, None, "ocsinit-cephobjectstore")
                .await;
            if platform.is_known_cloud() {
                assert!(
                    object_store.is_none(),
                    "object store should not exist on {}",
                    platform
                );
            } else {
                assert!(object_store.is_some(), "object store missing on {}", platform);
            }
        }
    }

    #[tokio::test]
    async fn test_ownership_per_kind() {
        let store = seeded_store().await;
        let reconciler = Reconciler::new(store.clone(), CloudPlatform::Unknown);
        reconciler.reconcile(&request()).await.unwrap();

        let sc = store
            .get_child(ResourceKind::StorageClass, None, "ocsinit-cephfs")
            .await
            .unwrap();
        assert!(sc.owner_references().is_empty());

        for (kind, name) in [
            (ResourceKind::CephFilesystem, "ocsinit-cephfilesystem"),
            (ResourceKind::CephBlockPool, "ocsinit-cephblockpool"),
            (ResourceKind::CephObjectStore, "ocsinit-cephobjectstore"),
            (
                ResourceKind::CephObjectStoreUser,
                "ocsinit-cephobjectstoreuser",
            ),
        ] {
            let child = store.get_child(kind, None, name).await.unwrap();
            let refs = child.owner_references();
            assert_eq!(refs.len(), 1, "{} should have one owner", kind);
            assert_eq!(refs[0].name, "ocsinit");
        }
    }

    #[tokio::test]
    async fn test_child_counts_per_platform() {
        for (platform, expected) in [
            (CloudPlatform::Aws, 4),
            (CloudPlatform::Gce, 5),
            (CloudPlatform::Azure, 5),
            (CloudPlatform::Unknown, 6),
            (CloudPlatform::Other("NonCloudPlatform".into()), 6),
        ] {
            let store = seeded_store().await;
            let reconciler = Reconciler::new(store.clone(), platform.clone());
            reconciler.reconcile(&request()).await.unwrap();
            assert_eq!(
                store.child_count().await,
                expected,
                "wrong child count on {}",
                platform
            );
        }
    }

    #[tokio::test]
    async fn test_restores_drifted_child() {
        let store = seeded_store().await;
        store
            .seed_child(ChildResource::CephBlockPool(CephBlockPool::new(
                "ocsinit-cephblockpool",
                CephBlockPoolSpec {
                    failure_domain: Some("host".into()),
                    replicated: ReplicatedSpec { size: 2 },
                },
            )))
            .await;

        let reconciler = Reconciler::new(store.clone(), CloudPlatform::Unknown);
        reconciler.reconcile(&request()).await.unwrap();

        let live = store
            .get_child(ResourceKind::CephBlockPool, None, "ocsinit-cephblockpool")
            .await
            .unwrap();
        let ChildResource::CephBlockPool(pool) = live else {
            panic!("expected a CephBlockPool");
        };
        assert_eq!(pool.spec.failure_domain.as_deref(), Some("zone"));
        assert_eq!(pool.spec.replicated.size, 3);
        // Seeded identity survives the write
        assert_eq!(pool.metadata.uid.as_deref(), Some("seeded-uid"));
    }

    #[tokio::test]
    async fn test_reconcile_twice_changes_nothing() {
        let store = seeded_store().await;
        let reconciler = Reconciler::new(store.clone(), CloudPlatform::Unknown);

        reconciler.reconcile(&request()).await.unwrap();
        let creates = store.create_count();
        reconciler.reconcile(&request()).await.unwrap();

        assert_eq!(store.create_count(), creates);
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_status_applies_nothing() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_cluster(StorageCluster::new("ocsinit", StorageClusterSpec::default()))
            .await;
        let reconciler = Reconciler::new(store.clone(), CloudPlatform::Unknown);

        let err = reconciler.reconcile(&request()).await.unwrap_err();
        assert_matches!(err, Error::Synthesis { .. });
        assert_eq!(store.child_count().await, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_applied_subset() {
        let store = seeded_store().await;
        store.fail_kind(ResourceKind::CephObjectStore);
        let reconciler = Reconciler::new(store.clone(), CloudPlatform::Unknown);

        let err = reconciler.reconcile(&request()).await.unwrap_err();
        assert_matches!(&err, Error::Converge(failures) if failures.len() == 1);
        // Everything else converged despite the failure
        assert!(store
            .get_child(ResourceKind::CephBlockPool, None, "ocsinit-cephblockpool")
            .await
            .is_some());
    }
}
