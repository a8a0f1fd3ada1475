use crate::{Api, Client, ListParams, Pod, Service};
use async_trait::async_trait;
use pod_binder_core::{self as core, ClusterApi, Error, Result, Selector};

/// A [`ClusterApi`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for KubeClusterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterApi").finish_non_exhaustive()
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn get_instance(&self, namespace: &str, name: &str) -> Result<core::WorkloadInstance> {
        let api = Api::<Pod>::namespaced(self.client.clone(), namespace);
        match api.get_opt(name).await.map_err(Error::transport)? {
            Some(pod) => Ok(crate::workload_instance(&pod)),
            None => Err(Error::NotFound {
                kind: "pod",
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn list_services(
        &self,
        namespace: &str,
        selector: &Selector,
        limit: u32,
    ) -> Result<Vec<core::Service>> {
        let api = Api::<Service>::namespaced(self.client.clone(), namespace);
        let params = ListParams::default()
            .labels(&selector.to_string())
            .limit(limit);
        let list = api.list(&params).await.map_err(Error::transport)?;
        tracing::trace!(%namespace, %selector, items = list.items.len(), "Listed services");
        Ok(list.items.iter().map(crate::service).collect())
    }
}
