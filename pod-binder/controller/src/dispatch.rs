use crate::metrics::{ActionResult, Metrics};
use async_trait::async_trait;
use pod_binder_core::{Action, BindingTask, Error, Result, Service, Upstream, WorkloadInstance};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Invokes bind and unbind actions without waiting on their completion.
#[derive(Debug)]
pub struct Dispatcher<U> {
    upstream: Arc<U>,
    metrics: Metrics,
}

/// An [`Upstream`] that only logs each action.
#[derive(Clone, Debug, Default)]
pub struct LogUpstream(());

// === impl Dispatcher ===

impl<U> Clone for Dispatcher<U> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<U: Upstream> Dispatcher<U> {
    pub fn new(upstream: Arc<U>, metrics: Metrics) -> Self {
        Self { upstream, metrics }
    }

    /// Spawns the action for the pod's address and the service's name.
    ///
    /// Fails only if the pod has no address to bind. The action's own
    /// failure is logged and never retried.
    pub fn dispatch(
        &self,
        action: Action,
        instance: &WorkloadInstance,
        service: &Service,
    ) -> Result<JoinHandle<()>> {
        let address = instance.address.clone().ok_or_else(|| Error::NoAddress {
            pod: instance.name.clone(),
        })?;
        let task = BindingTask {
            address,
            service_name: service.name.clone(),
        };
        tracing::info!(pod = %instance.name, address = %task.address, service = %task.service_name, %action, "Found related service");

        let upstream = self.upstream.clone();
        let metrics = self.metrics.clone();
        let span = tracing::info_span!("action", %action, address = %task.address, service = %task.service_name);
        Ok(tokio::spawn(
            async move {
                let res = match action {
                    Action::Bind => upstream.mount(task).await,
                    Action::Unbind => upstream.unmount(task).await,
                };
                match res {
                    Ok(()) => metrics.action(action, ActionResult::Ok),
                    Err(error) => {
                        tracing::warn!(%error, "Action failed");
                        metrics.action(action, ActionResult::Failed);
                    }
                }
            }
            .instrument(span),
        ))
    }
}

// === impl LogUpstream ===

#[async_trait]
impl Upstream for LogUpstream {
    async fn mount(&self, task: BindingTask) -> anyhow::Result<()> {
        tracing::info!(address = %task.address, service = %task.service_name, "mount");
        Ok(())
    }

    async fn unmount(&self, task: BindingTask) -> anyhow::Result<()> {
        tracing::info!(address = %task.address, service = %task.service_name, "unmount");
        Ok(())
    }
}
