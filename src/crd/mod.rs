//! Custom Resource Definitions
//!
//! The parent StorageCluster (plus its initialization marker) and the Ceph
//! child resources the operator converges it into.

pub mod ceph;
pub mod storage_cluster;

pub use ceph::{
    CephBlockPool, CephBlockPoolSpec, CephFilesystem, CephFilesystemSpec, CephObjectStore,
    CephObjectStoreSpec, CephObjectStoreUser, CephObjectStoreUserSpec, GatewaySpec,
    MetadataServerSpec, PoolSpec, ReplicatedSpec, TopologyPlacement,
};
pub use storage_cluster::{
    NodeTopologyMap, StorageCluster, StorageClusterInitialization,
    StorageClusterInitializationSpec, StorageClusterSpec, StorageClusterStatus,
    TopologyLabelValues, ZONE_TOPOLOGY_LABEL,
};
