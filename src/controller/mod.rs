//! StorageCluster initialization controller
//!
//! Pipeline per reconciliation: resolve parent -> synthesize desired
//! children for the platform -> attach ownership -> converge against the
//! resource store.

pub mod child;
pub mod converge;
pub mod ownership;
pub mod reconciler;
pub mod store;
pub mod synthesis;

#[cfg(test)]
pub mod testing;

pub use child::{ChildResource, ResourceKind};
pub use converge::ConvergenceEngine;
pub use reconciler::{ReconcileOutcome, ReconcileRequest, Reconciler};
pub use store::{KubeStore, ResourceStore, ResourceStoreRef};
pub use synthesis::{Synthesizer, SYNTHESIZERS};
