//! Ceph child resource CRDs
//!
//! Declarative specifications for the Ceph resources the operator synthesizes
//! from a StorageCluster: a filesystem, a block pool, an object store and an
//! object store user. Only the fields this operator owns are modeled; the
//! storage engine consuming these resources fills in the rest.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared Pool Types
// =============================================================================

/// Replication settings for a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedSpec {
    /// Number of replicas per object
    #[serde(default = "default_replica_size")]
    pub size: u32,
}

impl Default for ReplicatedSpec {
    fn default() -> Self {
        Self {
            size: default_replica_size(),
        }
    }
}

/// Pool settings shared by filesystem, block pool and object store specs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    /// Failure domain replicas are spread across (e.g. "zone", "host")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_domain: Option<String>,

    /// Replication settings
    #[serde(default)]
    pub replicated: ReplicatedSpec,
}

/// Scheduling constraint pinning Ceph daemons to a set of topology values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyPlacement {
    /// Node label key to match against
    pub key: String,

    /// Label values daemons may be scheduled onto
    #[serde(default)]
    pub values: Vec<String>,
}

// =============================================================================
// CephFilesystem CRD
// =============================================================================

/// CephFilesystem describes a CephFS instance backed by a metadata pool,
/// one or more data pools and a metadata server deployment.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephFilesystem",
    plural = "cephfilesystems",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CephFilesystemSpec {
    /// Pool backing filesystem metadata
    #[serde(default)]
    pub metadata_pool: PoolSpec,

    /// Pools backing filesystem data
    #[serde(default)]
    pub data_pools: Vec<PoolSpec>,

    /// Metadata server deployment settings
    #[serde(default)]
    pub metadata_server: MetadataServerSpec,
}

/// Metadata server (MDS) deployment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataServerSpec {
    /// Number of active MDS daemons
    #[serde(default = "default_active_count")]
    pub active_count: u32,

    /// Whether standby daemons are kept warm for failover
    #[serde(default)]
    pub active_standby: bool,

    /// Topology constraint for MDS placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<TopologyPlacement>,
}

impl Default for MetadataServerSpec {
    fn default() -> Self {
        Self {
            active_count: default_active_count(),
            active_standby: false,
            placement: None,
        }
    }
}

// =============================================================================
// CephBlockPool CRD
// =============================================================================

/// CephBlockPool describes a replicated RADOS pool for RBD volumes.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephBlockPool",
    plural = "cephblockpools",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CephBlockPoolSpec {
    /// Failure domain replicas are spread across
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_domain: Option<String>,

    /// Replication settings
    #[serde(default)]
    pub replicated: ReplicatedSpec,
}

// =============================================================================
// CephObjectStore CRD
// =============================================================================

/// CephObjectStore describes an S3-compatible object store (RGW) with its
/// backing pools and gateway deployment.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephObjectStore",
    plural = "cephobjectstores",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CephObjectStoreSpec {
    /// Pool backing bucket index and metadata
    #[serde(default)]
    pub metadata_pool: PoolSpec,

    /// Pool backing object data
    #[serde(default)]
    pub data_pool: PoolSpec,

    /// RGW gateway deployment settings
    #[serde(default)]
    pub gateway: GatewaySpec,
}

/// RGW gateway deployment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// Port the gateway listens on
    #[serde(default = "default_gateway_port")]
    pub port: i32,

    /// Number of gateway instances
    #[serde(default = "default_gateway_instances")]
    pub instances: i32,

    /// Topology constraint for gateway placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<TopologyPlacement>,
}

impl Default for GatewaySpec {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            instances: default_gateway_instances(),
            placement: None,
        }
    }
}

// =============================================================================
// CephObjectStoreUser CRD
// =============================================================================

/// CephObjectStoreUser describes an S3 credential set in an object store.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ceph.rook.io",
    version = "v1",
    kind = "CephObjectStoreUser",
    plural = "cephobjectstoreusers",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CephObjectStoreUserSpec {
    /// Name of the CephObjectStore the user belongs to
    #[serde(default)]
    pub store: String,

    /// Human-readable display name
    #[serde(default)]
    pub display_name: String,
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_replica_size() -> u32 {
    3
}

fn default_active_count() -> u32 {
    1
}

fn default_gateway_port() -> i32 {
    80
}

fn default_gateway_instances() -> i32 {
    1
}
