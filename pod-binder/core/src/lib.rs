#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod error;
mod event;
mod instance;
pub mod labels;

pub use self::{
    error::{Error, Result},
    event::LifecycleEvent,
    instance::{Service, WorkloadInstance},
    labels::{Labels, Selector},
};
use async_trait::async_trait;

/// The downstream effect dispatched for a pod lifecycle transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Attach a ready pod's address to its service.
    Bind,
    /// Detach a terminating pod's address from its service.
    Unbind,
}

/// Pairs a pod address with the service it is (un)bound from.
///
/// Built immediately before dispatch and owned by the action invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingTask {
    pub address: String,
    pub service_name: String,
}

/// Read access to the orchestration API needed by the binding pipeline.
#[async_trait]
pub trait ClusterApi: Clone + Send + Sync + 'static {
    /// Fetches a fresh snapshot of a pod.
    ///
    /// Fails with [`Error::NotFound`] if the pod does not exist.
    async fn get_instance(&self, namespace: &str, name: &str) -> Result<WorkloadInstance>;

    /// Lists at most `limit` services in `namespace` whose labels match `selector`.
    async fn list_services(
        &self,
        namespace: &str,
        selector: &Selector,
        limit: u32,
    ) -> Result<Vec<Service>>;
}

/// The external collaborator that performs bind and unbind actions.
///
/// Implementations may take arbitrarily long; callers never retry.
#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    async fn mount(&self, task: BindingTask) -> anyhow::Result<()>;

    async fn unmount(&self, task: BindingTask) -> anyhow::Result<()>;
}

// === impl Action ===

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Unbind => "unbind",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
