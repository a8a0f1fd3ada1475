use crate::metrics::Metrics;
use futures::future::BoxFuture;
use pod_binder_core::Action;
use prometheus_client::metrics::gauge::Gauge;
use std::{future::Future, sync::Arc};
use tokio::sync::{mpsc, Semaphore};
use tracing::{info_span, Instrument};

/// Runs flows of one action kind with bounded concurrency.
///
/// Pushing never blocks: flows wait in an unbounded queue until one of
/// `max_concurrent` slots frees up.
#[derive(Clone, Debug)]
pub struct FlowQueue {
    action: Action,
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    queued: Gauge,
}

impl FlowQueue {
    /// Spawns the scheduler task onto the current runtime.
    pub fn spawn(action: Action, max_concurrent: usize, metrics: &Metrics) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queued = metrics.queued(action);
        let active = metrics.active(action);
        tokio::spawn(
            Self::run(rx, Arc::new(Semaphore::new(max_concurrent)), queued.clone(), active)
                .instrument(info_span!("flows", %action)),
        );
        Self { action, tx, queued }
    }

    pub fn push(&self, flow: impl Future<Output = ()> + Send + 'static) {
        self.queued.inc();
        if self.tx.send(Box::pin(flow)).is_err() {
            self.queued.dec();
            tracing::warn!(action = %self.action, "Flow scheduler stopped; dropping flow");
        }
    }

    /// The number of flows waiting for a slot.
    pub fn depth(&self) -> i64 {
        self.queued.get()
    }

    async fn run(
        mut rx: mpsc::UnboundedReceiver<BoxFuture<'static, ()>>,
        slots: Arc<Semaphore>,
        queued: Gauge,
        active: Gauge,
    ) {
        while let Some(flow) = rx.recv().await {
            let Ok(permit) = slots.clone().acquire_owned().await else {
                break;
            };
            queued.dec();
            active.inc();
            let active = active.clone();
            tokio::spawn(async move {
                flow.await;
                active.dec();
                drop(permit);
            });
        }
        tracing::debug!("Flow queue closed");
    }
}
