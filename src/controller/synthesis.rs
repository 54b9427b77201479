//! Child resource synthesis
//!
//! Five pure synthesizers map (StorageCluster, platform) to desired child
//! specs. Platform gating lives in the `SYNTHESIZERS` table as a predicate
//! per kind rather than branching in the control loop, so adding a platform
//! or a kind is a local table edit.

use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use crate::controller::child::{ChildResource, ResourceKind};
use crate::crd::{
    CephBlockPool, CephBlockPoolSpec, CephFilesystem, CephFilesystemSpec, CephObjectStore,
    CephObjectStoreSpec, CephObjectStoreUser, CephObjectStoreUserSpec, GatewaySpec,
    MetadataServerSpec, PoolSpec, StorageCluster, TopologyPlacement, ZONE_TOPOLOGY_LABEL,
};
use crate::error::{Error, Result};
use crate::platform::CloudPlatform;

// =============================================================================
// Naming
// =============================================================================

// Child name suffixes. These are part of the operator's external contract:
// existing deployments address children by these derived names.
pub const CEPHFS_STORAGECLASS_SUFFIX: &str = "cephfs";
pub const RBD_STORAGECLASS_SUFFIX: &str = "ceph-rbd";
pub const FILESYSTEM_SUFFIX: &str = "cephfilesystem";
pub const BLOCK_POOL_SUFFIX: &str = "cephblockpool";
pub const OBJECT_STORE_SUFFIX: &str = "cephobjectstore";
pub const OBJECT_STORE_USER_SUFFIX: &str = "cephobjectstoreuser";

/// Namespace used for CSI provisioner and secret derivation when the
/// cluster itself carries none (cluster-scoped requests).
const DEFAULT_OPERATOR_NAMESPACE: &str = "openshift-storage";

fn cluster_namespace(cluster: &StorageCluster) -> &str {
    cluster
        .metadata
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .unwrap_or(DEFAULT_OPERATOR_NAMESPACE)
}

// =============================================================================
// Synthesizer Table
// =============================================================================

/// One entry per child kind: when it applies and how to synthesize it
pub struct Synthesizer {
    pub kind: ResourceKind,
    /// Platform applicability predicate
    pub applies: fn(&CloudPlatform) -> bool,
    /// Pure mapping from parent state to desired specs
    pub synthesize: fn(&StorageCluster) -> Result<Vec<ChildResource>>,
}

fn always(_: &CloudPlatform) -> bool {
    true
}

// Object store users are provisioned everywhere except AWS, where S3
// credentials come from the provider.
fn not_aws(platform: &CloudPlatform) -> bool {
    *platform != CloudPlatform::Aws
}

// An RGW object store is only stood up off-cloud; recognized clouds bring
// their own object storage.
fn not_known_cloud(platform: &CloudPlatform) -> bool {
    !platform.is_known_cloud()
}

/// All synthesizers in their required apply order. The order is fixed within
/// one reconciliation; the engine never fans out across kinds.
pub const SYNTHESIZERS: &[Synthesizer] = &[
    Synthesizer {
        kind: ResourceKind::StorageClass,
        applies: always,
        synthesize: storage_classes,
    },
    Synthesizer {
        kind: ResourceKind::CephFilesystem,
        applies: always,
        synthesize: ceph_filesystems,
    },
    Synthesizer {
        kind: ResourceKind::CephObjectStoreUser,
        applies: not_aws,
        synthesize: ceph_object_store_users,
    },
    Synthesizer {
        kind: ResourceKind::CephBlockPool,
        applies: always,
        synthesize: ceph_block_pools,
    },
    Synthesizer {
        kind: ResourceKind::CephObjectStore,
        applies: not_known_cloud,
        synthesize: ceph_object_stores,
    },
];

// =============================================================================
// Required Parent State
// =============================================================================

fn missing(kind: ResourceKind, field: &str) -> Error {
    Error::Synthesis {
        kind: kind.as_str().to_string(),
        reason: format!("StorageCluster status is missing {}", field),
    }
}

fn required_failure_domain(cluster: &StorageCluster, kind: ResourceKind) -> Result<String> {
    cluster
        .failure_domain()
        .map(str::to_string)
        .ok_or_else(|| missing(kind, "a failure domain"))
}

fn zone_placement(cluster: &StorageCluster) -> Option<TopologyPlacement> {
    let zones = cluster.node_topologies()?.zone_values()?;
    if zones.is_empty() {
        return None;
    }
    Some(TopologyPlacement {
        key: ZONE_TOPOLOGY_LABEL.to_string(),
        values: zones.clone(),
    })
}

fn required_zone_placement(
    cluster: &StorageCluster,
    kind: ResourceKind,
) -> Result<TopologyPlacement> {
    zone_placement(cluster).ok_or_else(|| missing(kind, "zone topology labels"))
}

// =============================================================================
// Synthesizers
// =============================================================================

/// The cephfs and rbd storage classes. Always two, on every platform.
pub fn storage_classes(cluster: &StorageCluster) -> Result<Vec<ChildResource>> {
    let ns = cluster_namespace(cluster);
    let fs_name = cluster.child_name(FILESYSTEM_SUFFIX);

    let mut cephfs_params = BTreeMap::new();
    cephfs_params.insert("clusterID".to_string(), ns.to_string());
    cephfs_params.insert("fsName".to_string(), fs_name.clone());
    cephfs_params.insert("pool".to_string(), format!("{}-data0", fs_name));
    cephfs_params.insert(
        "csi.storage.k8s.io/provisioner-secret-name".to_string(),
        "rook-csi-cephfs-provisioner".to_string(),
    );
    cephfs_params.insert(
        "csi.storage.k8s.io/provisioner-secret-namespace".to_string(),
        ns.to_string(),
    );
    cephfs_params.insert(
        "csi.storage.k8s.io/node-stage-secret-name".to_string(),
        "rook-csi-cephfs-node".to_string(),
    );
    cephfs_params.insert(
        "csi.storage.k8s.io/node-stage-secret-namespace".to_string(),
        ns.to_string(),
    );

    let mut rbd_params = BTreeMap::new();
    rbd_params.insert("clusterID".to_string(), ns.to_string());
    rbd_params.insert(
        "pool".to_string(),
        cluster.child_name(BLOCK_POOL_SUFFIX),
    );
    rbd_params.insert("imageFormat".to_string(), "2".to_string());
    rbd_params.insert("imageFeatures".to_string(), "layering".to_string());
    rbd_params.insert(
        "csi.storage.k8s.io/provisioner-secret-name".to_string(),
        "rook-csi-rbd-provisioner".to_string(),
    );
    rbd_params.insert(
        "csi.storage.k8s.io/provisioner-secret-namespace".to_string(),
        ns.to_string(),
    );
    rbd_params.insert(
        "csi.storage.k8s.io/node-stage-secret-name".to_string(),
        "rook-csi-rbd-node".to_string(),
    );
    rbd_params.insert(
        "csi.storage.k8s.io/node-stage-secret-namespace".to_string(),
        ns.to_string(),
    );

    Ok(vec![
        ChildResource::StorageClass(storage_class(
            cluster.child_name(CEPHFS_STORAGECLASS_SUFFIX),
            format!("{}.cephfs.csi.ceph.com", ns),
            cephfs_params,
        )),
        ChildResource::StorageClass(storage_class(
            cluster.child_name(RBD_STORAGECLASS_SUFFIX),
            format!("{}.rbd.csi.ceph.com", ns),
            rbd_params,
        )),
    ])
}

fn storage_class(
    name: String,
    provisioner: String,
    parameters: BTreeMap<String, String>,
) -> StorageClass {
    StorageClass {
        metadata: ObjectMeta {
            name: Some(name),
            ..Default::default()
        },
        provisioner,
        parameters: Some(parameters),
        reclaim_policy: Some("Delete".to_string()),
        ..Default::default()
    }
}

/// The CephFS filesystem: replicated metadata pool, one data pool spread
/// across the failure domain, and a warm-standby MDS pinned to the
/// cluster's zones.
pub fn ceph_filesystems(cluster: &StorageCluster) -> Result<Vec<ChildResource>> {
    let kind = ResourceKind::CephFilesystem;
    let failure_domain = required_failure_domain(cluster, kind)?;
    let placement = required_zone_placement(cluster, kind)?;

    let mut fs = CephFilesystem::new(
        &cluster.child_name(FILESYSTEM_SUFFIX),
        CephFilesystemSpec {
            metadata_pool: PoolSpec::default(),
            data_pools: vec![PoolSpec {
                failure_domain: Some(failure_domain),
                ..Default::default()
            }],
            metadata_server: MetadataServerSpec {
                active_count: 1,
                active_standby: true,
                placement: Some(placement),
            },
        },
    );
    fs.metadata.namespace = cluster.metadata.namespace.clone();
    Ok(vec![ChildResource::CephFilesystem(fs)])
}

/// The RBD block pool backing the rbd storage class
pub fn ceph_block_pools(cluster: &StorageCluster) -> Result<Vec<ChildResource>> {
    let failure_domain = required_failure_domain(cluster, ResourceKind::CephBlockPool)?;

    let mut pool = CephBlockPool::new(
        &cluster.child_name(BLOCK_POOL_SUFFIX),
        CephBlockPoolSpec {
            failure_domain: Some(failure_domain),
            ..Default::default()
        },
    );
    pool.metadata.namespace = cluster.metadata.namespace.clone();
    Ok(vec![ChildResource::CephBlockPool(pool)])
}

/// The RGW object store, gated to non-cloud platforms by the table
pub fn ceph_object_stores(cluster: &StorageCluster) -> Result<Vec<ChildResource>> {
    let kind = ResourceKind::CephObjectStore;
    let failure_domain = required_failure_domain(cluster, kind)?;

    let mut store = CephObjectStore::new(
        &cluster.child_name(OBJECT_STORE_SUFFIX),
        CephObjectStoreSpec {
            metadata_pool: PoolSpec {
                failure_domain: Some(failure_domain.clone()),
                ..Default::default()
            },
            data_pool: PoolSpec {
                failure_domain: Some(failure_domain),
                ..Default::default()
            },
            gateway: GatewaySpec {
                port: 80,
                instances: 1,
                placement: zone_placement(cluster),
            },
        },
    );
    store.metadata.namespace = cluster.metadata.namespace.clone();
    Ok(vec![ChildResource::CephObjectStore(store)])
}

/// The default S3 user for the object store, gated off AWS by the table
pub fn ceph_object_store_users(cluster: &StorageCluster) -> Result<Vec<ChildResource>> {
    let mut user = CephObjectStoreUser::new(
        &cluster.child_name(OBJECT_STORE_USER_SUFFIX),
        CephObjectStoreUserSpec {
            store: cluster.child_name(OBJECT_STORE_SUFFIX),
            display_name: cluster.name().to_string(),
        },
    );
    user.metadata.namespace = cluster.metadata.namespace.clone();
    Ok(vec![ChildResource::CephObjectStoreUser(user)])
}
