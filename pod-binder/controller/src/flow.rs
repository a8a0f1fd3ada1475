use crate::{
    dispatch::Dispatcher,
    metrics::{FlowResult, Metrics},
    ready::{ReadinessWaiter, TimedOut},
    resolve::ServiceResolver,
};
use pod_binder_core::{Action, ClusterApi, Upstream};
use thiserror::Error;
use tokio::time::{self, Duration};

pub const DEFAULT_READY_GRACE: Duration = Duration::from_secs(10);

/// The bind and unbind flows, from pod lookup through dispatch.
#[derive(Debug)]
pub struct Pipeline<C, U> {
    client: C,
    waiter: ReadinessWaiter<C>,
    resolver: ServiceResolver<C>,
    dispatcher: Dispatcher<U>,
    grace: Duration,
    metrics: Metrics,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    NotReady(#[from] TimedOut),

    #[error("failed to fetch pod: {0}")]
    Fetch(#[source] pod_binder_core::Error),

    #[error("failed to resolve service: {0}")]
    Resolve(#[source] pod_binder_core::Error),

    #[error("failed to dispatch: {0}")]
    Dispatch(#[source] pod_binder_core::Error),
}

// === impl Pipeline ===

impl<C: Clone, U> Clone for Pipeline<C, U> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            waiter: self.waiter.clone(),
            resolver: self.resolver.clone(),
            dispatcher: self.dispatcher.clone(),
            grace: self.grace,
            metrics: self.metrics.clone(),
        }
    }
}

impl<C: ClusterApi, U: Upstream> Pipeline<C, U> {
    pub fn new(
        client: C,
        waiter: ReadinessWaiter<C>,
        resolver: ServiceResolver<C>,
        dispatcher: Dispatcher<U>,
        grace: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            waiter,
            resolver,
            dispatcher,
            grace,
            metrics,
        }
    }

    /// Waits for the pod to become ready, then binds it to its service.
    pub async fn bind(&self, namespace: &str, name: &str) -> Result<(), FlowError> {
        self.waiter.wait_ready(namespace, name).await?;
        time::sleep(self.grace).await;
        self.dispatch(Action::Bind, namespace, name).await
    }

    /// Unbinds the pod from its service.
    pub async fn unbind(&self, namespace: &str, name: &str) -> Result<(), FlowError> {
        self.dispatch(Action::Unbind, namespace, name).await
    }

    async fn dispatch(&self, action: Action, namespace: &str, name: &str) -> Result<(), FlowError> {
        let instance = self
            .client
            .get_instance(namespace, name)
            .await
            .map_err(FlowError::Fetch)?;
        tracing::info!(pod = %instance.name, address = ?instance.address, "Fetched pod");

        let service = self
            .resolver
            .resolve(&instance, namespace)
            .await
            .map_err(FlowError::Resolve)?;
        self.dispatcher
            .dispatch(action, &instance, &service)
            .map_err(FlowError::Dispatch)?;
        Ok(())
    }

    /// Runs a flow to completion, logging and recording its outcome.
    pub(crate) async fn run(self, action: Action, namespace: String, name: String) {
        let res = match action {
            Action::Bind => self.bind(&namespace, &name).await,
            Action::Unbind => self.unbind(&namespace, &name).await,
        };
        let result = match res {
            Ok(()) => FlowResult::Dispatched,
            Err(FlowError::NotReady(error)) => {
                tracing::info!(%error, "Pod never became ready");
                FlowResult::NotReady
            }
            Err(error @ FlowError::Fetch(_)) => {
                tracing::warn!(%error);
                FlowResult::FetchFailed
            }
            Err(error @ FlowError::Resolve(_)) => {
                tracing::warn!(%error);
                FlowResult::Unresolved
            }
            Err(error @ FlowError::Dispatch(_)) => {
                tracing::warn!(%error);
                FlowResult::Unresolved
            }
        };
        self.metrics.flow(action, result);
    }
}
