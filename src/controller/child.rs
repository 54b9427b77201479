//! Child resource model
//!
//! A `ChildResource` is one synthesized desired object, addressed by
//! (kind, namespace, name). The enum keeps the convergence engine generic
//! over the five kinds without erasing their typed specs.

use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::fmt;

use crate::crd::{CephBlockPool, CephFilesystem, CephObjectStore, CephObjectStoreUser};

// =============================================================================
// Resource Kind
// =============================================================================

/// The child resource kinds this operator manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    StorageClass,
    CephFilesystem,
    CephBlockPool,
    CephObjectStore,
    CephObjectStoreUser,
}

impl ResourceKind {
    /// Kubernetes kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StorageClass => "StorageClass",
            ResourceKind::CephFilesystem => "CephFilesystem",
            ResourceKind::CephBlockPool => "CephBlockPool",
            ResourceKind::CephObjectStore => "CephObjectStore",
            ResourceKind::CephObjectStoreUser => "CephObjectStoreUser",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Child Resource
// =============================================================================

/// A synthesized child resource of a StorageCluster
#[derive(Debug, Clone)]
pub enum ChildResource {
    StorageClass(StorageClass),
    CephFilesystem(CephFilesystem),
    CephBlockPool(CephBlockPool),
    CephObjectStore(CephObjectStore),
    CephObjectStoreUser(CephObjectStoreUser),
}

impl ChildResource {
    /// Kind of the wrapped resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            ChildResource::StorageClass(_) => ResourceKind::StorageClass,
            ChildResource::CephFilesystem(_) => ResourceKind::CephFilesystem,
            ChildResource::CephBlockPool(_) => ResourceKind::CephBlockPool,
            ChildResource::CephObjectStore(_) => ResourceKind::CephObjectStore,
            ChildResource::CephObjectStoreUser(_) => ResourceKind::CephObjectStoreUser,
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ChildResource::StorageClass(o) => &o.metadata,
            ChildResource::CephFilesystem(o) => &o.metadata,
            ChildResource::CephBlockPool(o) => &o.metadata,
            ChildResource::CephObjectStore(o) => &o.metadata,
            ChildResource::CephObjectStoreUser(o) => &o.metadata,
        }
    }

    /// Mutable object metadata
    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ChildResource::StorageClass(o) => &mut o.metadata,
            ChildResource::CephFilesystem(o) => &mut o.metadata,
            ChildResource::CephBlockPool(o) => &mut o.metadata,
            ChildResource::CephObjectStore(o) => &mut o.metadata,
            ChildResource::CephObjectStoreUser(o) => &mut o.metadata,
        }
    }

    /// Resource name
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Resource namespace, absent for cluster-scoped kinds
    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    /// Owner references currently attached
    pub fn owner_references(&self) -> &[OwnerReference] {
        self.metadata()
            .owner_references
            .as_deref()
            .unwrap_or_default()
    }

    /// Compare the spec fields this operator owns. Metadata and anything
    /// the storage engine writes back are excluded from the comparison.
    pub fn spec_matches(&self, existing: &ChildResource) -> bool {
        match (self, existing) {
            (ChildResource::StorageClass(a), ChildResource::StorageClass(b)) => {
                a.provisioner == b.provisioner
                    && a.parameters == b.parameters
                    && a.reclaim_policy == b.reclaim_policy
            }
            (ChildResource::CephFilesystem(a), ChildResource::CephFilesystem(b)) => {
                a.spec == b.spec
            }
            (ChildResource::CephBlockPool(a), ChildResource::CephBlockPool(b)) => a.spec == b.spec,
            (ChildResource::CephObjectStore(a), ChildResource::CephObjectStore(b)) => {
                a.spec == b.spec
            }
            (ChildResource::CephObjectStoreUser(a), ChildResource::CephObjectStoreUser(b)) => {
                a.spec == b.spec
            }
            _ => false,
        }
    }

    /// Project the desired spec onto a live object, keeping the live
    /// object's identity (uid, resourceVersion, owner refs) intact so the
    /// write never clobbers fields other writers own.
    pub fn written_onto(&self, existing: &ChildResource) -> ChildResource {
        debug_assert_eq!(self.kind(), existing.kind());
        match (self, existing) {
            (ChildResource::StorageClass(desired), ChildResource::StorageClass(live)) => {
                let mut merged = live.clone();
                merged.provisioner = desired.provisioner.clone();
                merged.parameters = desired.parameters.clone();
                merged.reclaim_policy = desired.reclaim_policy.clone();
                ChildResource::StorageClass(merged)
            }
            (ChildResource::CephFilesystem(desired), ChildResource::CephFilesystem(live)) => {
                let mut merged = live.clone();
                merged.spec = desired.spec.clone();
                ChildResource::CephFilesystem(merged)
            }
            (ChildResource::CephBlockPool(desired), ChildResource::CephBlockPool(live)) => {
                let mut merged = live.clone();
                merged.spec = desired.spec.clone();
                ChildResource::CephBlockPool(merged)
            }
            (ChildResource::CephObjectStore(desired), ChildResource::CephObjectStore(live)) => {
                let mut merged = live.clone();
                merged.spec = desired.spec.clone();
                ChildResource::CephObjectStore(merged)
            }
            (
                ChildResource::CephObjectStoreUser(desired),
                ChildResource::CephObjectStoreUser(live),
            ) => {
                let mut merged = live.clone();
                merged.spec = desired.spec.clone();
                ChildResource::CephObjectStoreUser(merged)
            }
            // Kind mismatch only happens on a store keying bug; fall back
            // to the desired object unchanged.
            _ => self.clone(),
        }
    }
}
