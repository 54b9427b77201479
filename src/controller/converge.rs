//! Convergence engine
//!
//! Drives the cluster toward a set of desired child resources with
//! idempotent get-or-create-or-update steps. Failures are collected per
//! resource rather than aborting the pass, so one broken kind never blocks
//! the rest from converging.

use tracing::{debug, info, warn};

use crate::controller::child::ChildResource;
use crate::controller::store::ResourceStoreRef;
use crate::error::{Error, Result};

pub struct ConvergenceEngine {
    store: ResourceStoreRef,
}

impl ConvergenceEngine {
    pub fn new(store: ResourceStoreRef) -> Self {
        Self { store }
    }

    /// Converge every desired resource in order. Returns the applied set,
    /// or `Error::Converge` carrying one error per failed resource; the
    /// successfully applied subset stays in the cluster either way.
    pub async fn converge(&self, desired: Vec<ChildResource>) -> Result<Vec<ChildResource>> {
        let mut applied = Vec::with_capacity(desired.len());
        let mut failures = Vec::new();

        for resource in desired {
            match self.upsert(&resource).await {
                Ok(()) => applied.push(resource),
                Err(e) => {
                    warn!(
                        kind = %resource.kind(),
                        name = %resource.name(),
                        error = %e,
                        "Failed to converge child resource"
                    );
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            Ok(applied)
        } else {
            Err(Error::Converge(failures))
        }
    }

    async fn upsert(&self, desired: &ChildResource) -> Result<()> {
        let kind = desired.kind();
        let existing = self
            .store
            .get(kind, desired.namespace(), desired.name())
            .await?;

        match existing {
            Some(live) => self.update_if_drifted(desired, &live).await,
            None => match self.store.create(desired).await {
                Ok(()) => {
                    info!(kind = %kind, name = %desired.name(), "Created child resource");
                    Ok(())
                }
                // Lost a create race to a concurrent writer; re-read and
                // converge onto whatever won.
                Err(e) if e.is_conflict() => {
                    debug!(kind = %kind, name = %desired.name(), "Create conflict, re-reading");
                    let live = self
                        .store
                        .get(kind, desired.namespace(), desired.name())
                        .await?
                        .ok_or_else(|| {
                            Error::Internal(format!(
                                "{}/{} vanished between create conflict and re-read",
                                kind,
                                desired.name()
                            ))
                        })?;
                    self.update_if_drifted(desired, &live).await
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn update_if_drifted(&self, desired: &ChildResource, live: &ChildResource) -> Result<()> {
        if desired.spec_matches(live) {
            debug!(
                kind = %desired.kind(),
                name = %desired.name(),
                "Child resource already converged"
            );
            return Ok(());
        }

        let merged = desired.written_onto(live);
        self.store.update(&merged).await?;
        info!(
            kind = %desired.kind(),
            name = %desired.name(),
            "Updated drifted child resource"
        );
        Ok(())
    }
}
