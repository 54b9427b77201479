//! Storage Cluster Operator
//!
//! A Kubernetes operator that converges a StorageCluster resource into the
//! Ceph child resources and storage classes that make it usable.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Initialization Reconciler                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │   Platform   │   │  Synthesizer │   │     Ownership       │  │
//! │  │    Gating    │──▶│    Table     │──▶│      Policy         │  │
//! │  └──────────────┘   └──────────────┘   └──────────┬──────────┘  │
//! │                                                    │             │
//! │                                        ┌───────────┴──────────┐ │
//! │                                        │  Convergence Engine  │ │
//! │                                        │  (get/create/update) │ │
//! │                                        └───────────┬──────────┘ │
//! ├────────────────────────────────────────────────────┼────────────┤
//! │                    Resource Store Port             │            │
//! │  ┌─────────────────────────────────────────────────┴─────────┐  │
//! │  │                 Kubernetes API Server                     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controller`]: Synthesis, ownership and convergence pipeline
//! - [`crd`]: Custom Resource Definitions
//! - [`platform`]: Deployment platform classification
//! - [`error`]: Error types and handling

pub mod controller;
pub mod crd;
pub mod error;
pub mod platform;

// Re-export commonly used types
pub use controller::{
    ChildResource, ConvergenceEngine, KubeStore, ReconcileOutcome, ReconcileRequest, Reconciler,
    ResourceKind, ResourceStore, ResourceStoreRef, Synthesizer, SYNTHESIZERS,
};

pub use crd::{
    CephBlockPool, CephBlockPoolSpec, CephFilesystem, CephFilesystemSpec, CephObjectStore,
    CephObjectStoreSpec, CephObjectStoreUser, CephObjectStoreUserSpec, NodeTopologyMap,
    StorageCluster, StorageClusterInitialization, StorageClusterSpec, StorageClusterStatus,
};

pub use error::{Error, ErrorAction, Result};

pub use platform::{CloudPlatform, VALID_CLOUD_PLATFORMS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
