//! Owner reference policy
//!
//! Which child kinds get an owner reference to their StorageCluster is a
//! policy decision, kept in one place: storage classes outlive the cluster
//! that minted them, everything else is garbage-collected with the parent.

use kube::Resource;

use crate::controller::child::{ChildResource, ResourceKind};
use crate::crd::StorageCluster;

/// Whether the given kind is owned by the StorageCluster.
///
/// StorageClasses are never owner-referenced: users keep addressing them
/// after the cluster is deleted and recreated, and cascading deletion
/// would strand their volumes.
pub fn attaches_owner(kind: ResourceKind) -> bool {
    match kind {
        ResourceKind::StorageClass => false,
        ResourceKind::CephFilesystem
        | ResourceKind::CephBlockPool
        | ResourceKind::CephObjectStore
        | ResourceKind::CephObjectStoreUser => true,
    }
}

/// Attach exactly one controller reference to `resource`, or none when the
/// kind's policy says the resource outlives the cluster.
pub fn apply(resource: &mut ChildResource, owner: &StorageCluster) {
    if !attaches_owner(resource.kind()) {
        return;
    }
    // None only when the owner has no uid, i.e. it was never persisted
    if let Some(reference) = owner.controller_owner_ref(&()) {
        resource.metadata_mut().owner_references = Some(vec![reference]);
    }
}
