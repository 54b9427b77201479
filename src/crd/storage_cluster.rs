//! StorageCluster CRD
//!
//! The parent resource describing a Ceph storage cluster, plus the
//! StorageClusterInitialization marker recording that first-time setup
//! has run. Reconciliation derives all child resources from the parent's
//! status (failure domain and node topology), never the other way around.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Topology label whose values carry the zone spread for pool placement.
pub const ZONE_TOPOLOGY_LABEL: &str = "failure-domain.kubernetes.io/zone";

// =============================================================================
// StorageCluster CRD
// =============================================================================

/// StorageCluster is the top-level description of a storage cluster. The
/// operator converges it into storage classes, Ceph pools, a filesystem and
/// an object store.
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ocs.openshift.io",
    version = "v1",
    kind = "StorageCluster",
    plural = "storageclusters",
    shortname = "sc",
    status = "StorageClusterStatus",
    printcolumn = r#"{"name": "FailureDomain", "type": "string", "jsonPath": ".status.failureDomain"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterSpec {
    /// Whether the operator may label and taint nodes for storage use
    #[serde(default)]
    pub manage_nodes: bool,
}

/// Status of the StorageCluster, written by the cluster-level controller
/// and read-only to the initialization reconciler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterStatus {
    /// Current lifecycle phase
    #[serde(default)]
    pub phase: Option<String>,

    /// Failure domain the Ceph pools spread replicas across (e.g. "zone")
    #[serde(default)]
    pub failure_domain: Option<String>,

    /// Observed node topology, keyed by topology label
    #[serde(default)]
    pub node_topologies: Option<NodeTopologyMap>,
}

/// Ordered values observed for a single topology label
pub type TopologyLabelValues = Vec<String>;

/// Topology labels observed across the cluster's nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeTopologyMap {
    /// Label key to the ordered set of values seen on nodes
    #[serde(default)]
    pub labels: BTreeMap<String, TopologyLabelValues>,
}

impl NodeTopologyMap {
    /// Values observed for the zone topology label, if any node carries it
    pub fn zone_values(&self) -> Option<&TopologyLabelValues> {
        self.labels.get(ZONE_TOPOLOGY_LABEL)
    }
}

// =============================================================================
// StorageClusterInitialization CRD
// =============================================================================

/// Marker resource recording that initialization ran for a cluster. Its
/// absence is not an error; a reconcile request that resolves to nothing
/// is a no-op.
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ocs.openshift.io",
    version = "v1",
    kind = "StorageClusterInitialization",
    plural = "storageclusterinitializations",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterInitializationSpec {}

// =============================================================================
// Implementations
// =============================================================================

impl StorageCluster {
    /// Get the name of this cluster
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Derive a child resource name from the cluster name.
    /// This convention is load-bearing for existing deployments.
    pub fn child_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.name(), suffix)
    }

    /// Failure domain from status, if the status writer has resolved one
    pub fn failure_domain(&self) -> Option<&str> {
        self.status.as_ref()?.failure_domain.as_deref()
    }

    /// Node topology map from status
    pub fn node_topologies(&self) -> Option<&NodeTopologyMap> {
        self.status.as_ref()?.node_topologies.as_ref()
    }
}
