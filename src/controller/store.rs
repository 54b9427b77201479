//! Resource store port
//!
//! The convergence engine talks to the cluster through this narrow
//! read/create/update port so reconciliation logic stays independent of
//! the API server client. `KubeStore` is the production adapter.

use async_trait::async_trait;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

use crate::controller::child::{ChildResource, ResourceKind};
use crate::crd::{
    CephBlockPool, CephFilesystem, CephObjectStore, CephObjectStoreUser, StorageCluster,
};
use crate::error::{Error, Result};

// =============================================================================
// Resource Store Port
// =============================================================================

/// Port for the external resource store. Every call is a single
/// request-response operation; no state is held across calls, which is
/// what makes concurrent reconciliations of the same identity safe.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Load the parent StorageCluster, `None` when absent
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<Option<StorageCluster>>;

    /// Read a child resource by kind, namespace and name
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ChildResource>>;

    /// Create a child resource; `Error::ResourceExists` on conflict
    async fn create(&self, resource: &ChildResource) -> Result<()>;

    /// Replace a child resource in place
    async fn update(&self, resource: &ChildResource) -> Result<()>;
}

pub type ResourceStoreRef = Arc<dyn ResourceStore>;

// =============================================================================
// Kubernetes Adapter
// =============================================================================

/// `ResourceStore` backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    /// Namespace children land in when the request carries none
    namespace: String,
}

impl KubeStore {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn effective_namespace<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace.filter(|ns| !ns.is_empty()).unwrap_or(&self.namespace)
    }

    fn storage_classes(&self) -> Api<StorageClass> {
        // Cluster-scoped
        Api::all(self.client.clone())
    }

    fn filesystems(&self, namespace: &str) -> Api<CephFilesystem> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn block_pools(&self, namespace: &str) -> Api<CephBlockPool> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn object_stores(&self, namespace: &str) -> Api<CephObjectStore> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn object_store_users(&self, namespace: &str) -> Api<CephObjectStoreUser> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

async fn get_opt<K>(api: &Api<K>, name: &str) -> Result<Option<K>>
where
    K: Clone + DeserializeOwned + Debug,
{
    match api.get(name).await {
        Ok(obj) => Ok(Some(obj)),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn create_obj<K>(api: &Api<K>, kind: ResourceKind, obj: &K) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    match api.create(&PostParams::default(), obj).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Err(Error::ResourceExists {
            kind: kind.as_str().to_string(),
            name: obj.meta().name.clone().unwrap_or_default(),
        }),
        Err(e) => Err(e.into()),
    }
}

async fn replace_obj<K>(api: &Api<K>, obj: &K) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or_else(|| Error::Internal("update on a resource without a name".into()))?;
    api.replace(&name, &PostParams::default(), obj).await?;
    Ok(())
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<Option<StorageCluster>> {
        let ns = self.effective_namespace(Some(namespace));
        let api: Api<StorageCluster> = Api::namespaced(self.client.clone(), ns);
        get_opt(&api, name).await
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ChildResource>> {
        let ns = self.effective_namespace(namespace);
        Ok(match kind {
            ResourceKind::StorageClass => get_opt(&self.storage_classes(), name)
                .await?
                .map(ChildResource::StorageClass),
            ResourceKind::CephFilesystem => get_opt(&self.filesystems(ns), name)
                .await?
                .map(ChildResource::CephFilesystem),
            ResourceKind::CephBlockPool => get_opt(&self.block_pools(ns), name)
                .await?
                .map(ChildResource::CephBlockPool),
            ResourceKind::CephObjectStore => get_opt(&self.object_stores(ns), name)
                .await?
                .map(ChildResource::CephObjectStore),
            ResourceKind::CephObjectStoreUser => get_opt(&self.object_store_users(ns), name)
                .await?
                .map(ChildResource::CephObjectStoreUser),
        })
    }

    async fn create(&self, resource: &ChildResource) -> Result<()> {
        let kind = resource.kind();
        let ns = self.effective_namespace(resource.namespace());
        match resource {
            ChildResource::StorageClass(o) => create_obj(&self.storage_classes(), kind, o).await,
            ChildResource::CephFilesystem(o) => create_obj(&self.filesystems(ns), kind, o).await,
            ChildResource::CephBlockPool(o) => create_obj(&self.block_pools(ns), kind, o).await,
            ChildResource::CephObjectStore(o) => create_obj(&self.object_stores(ns), kind, o).await,
            ChildResource::CephObjectStoreUser(o) => {
                create_obj(&self.object_store_users(ns), kind, o).await
            }
        }
    }

    async fn update(&self, resource: &ChildResource) -> Result<()> {
        let ns = self.effective_namespace(resource.namespace());
        match resource {
            ChildResource::StorageClass(o) => replace_obj(&self.storage_classes(), o).await,
            ChildResource::CephFilesystem(o) => replace_obj(&self.filesystems(ns), o).await,
            ChildResource::CephBlockPool(o) => replace_obj(&self.block_pools(ns), o).await,
            ChildResource::CephObjectStore(o) => replace_obj(&self.object_stores(ns), o).await,
            ChildResource::CephObjectStoreUser(o) => {
                replace_obj(&self.object_store_users(ns), o).await
            }
        }
    }
}
