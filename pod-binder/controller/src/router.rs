use crate::{
    dedup::Deduplicator,
    flow::Pipeline,
    metrics::{EventOutcome, Metrics},
    queue::FlowQueue,
    validate::EventValidator,
};
use pod_binder_core::{Action, ClusterApi, LifecycleEvent, Upstream};
use tokio::time::Duration;
use tracing::{info_span, Instrument};

/// Which events the router acts on.
#[derive(Clone, Debug)]
pub struct Config {
    pub namespace: String,
    pub kind: String,
    pub start_reason: String,
    pub kill_reason: String,
    pub dedup_window: Duration,
    pub max_bind_flows: usize,
    pub max_unbind_flows: usize,
}

/// Routes each delivered lifecycle event to a bind or unbind flow.
///
/// [`Router::handle`] only filters and enqueues; every API call happens in
/// a queued flow.
#[derive(Debug)]
pub struct Router<C, U> {
    config: Config,
    validator: EventValidator,
    dedup: Deduplicator,
    pipeline: Pipeline<C, U>,
    binds: FlowQueue,
    unbinds: FlowQueue,
    metrics: Metrics,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Filtered,
    Ignored,
    Invalid,
    Duplicate,
    Accept(Action),
}

// === impl Config ===

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "prod".to_string(),
            kind: "Pod".to_string(),
            start_reason: "Started".to_string(),
            kill_reason: "Killing".to_string(),
            dedup_window: crate::dedup::DEFAULT_WINDOW,
            max_bind_flows: 64,
            max_unbind_flows: 64,
        }
    }
}

// === impl Router ===

impl<C: ClusterApi, U: Upstream> Router<C, U> {
    /// Must be called from within a Tokio runtime, which runs the flow queues.
    pub fn new(
        config: Config,
        validator: EventValidator,
        pipeline: Pipeline<C, U>,
        metrics: Metrics,
    ) -> Self {
        let binds = FlowQueue::spawn(Action::Bind, config.max_bind_flows, &metrics);
        let unbinds = FlowQueue::spawn(Action::Unbind, config.max_unbind_flows, &metrics);
        Self {
            dedup: Deduplicator::new(config.dedup_window),
            config,
            validator,
            pipeline,
            binds,
            unbinds,
            metrics,
        }
    }

    pub fn handle(&mut self, event: &LifecycleEvent) {
        let decision = self.decide(event);
        match decision {
            Decision::Filtered => {
                self.metrics.event(EventOutcome::Filtered);
            }
            Decision::Ignored => {
                self.metrics.event(EventOutcome::Ignored);
            }
            Decision::Invalid => {
                tracing::debug!(pod = %event.name, reason = %event.reason, count = event.count, timestamp = ?event.last_timestamp, "Ignoring stale or repeated event");
                self.metrics.event(EventOutcome::Invalid);
            }
            Decision::Duplicate => {
                tracing::debug!(pod = %event.name, reason = %event.reason, "Ignoring redelivered event");
                self.metrics.event(EventOutcome::Duplicate);
            }
            Decision::Accept(action) => {
                tracing::info!(pod = %event.name, event_type = %event.type_, reason = %event.reason, %action, uid = ?event.uid, "pod status changed");
                self.metrics.event(EventOutcome::Accepted);
                self.spawn(action, event);
            }
        }
    }

    /// The number of flows waiting for a concurrency slot, per action.
    pub fn queue_depth(&self, action: Action) -> i64 {
        match action {
            Action::Bind => self.binds.depth(),
            Action::Unbind => self.unbinds.depth(),
        }
    }

    pub(crate) fn decide(&mut self, event: &LifecycleEvent) -> Decision {
        if event.kind != self.config.kind || event.namespace != self.config.namespace {
            tracing::trace!(kind = %event.kind, namespace = %event.namespace, "Filtered");
            return Decision::Filtered;
        }

        if event.type_ != LifecycleEvent::NORMAL {
            return Decision::Ignored;
        }
        let action = if event.reason == self.config.start_reason {
            Action::Bind
        } else if event.reason == self.config.kill_reason {
            Action::Unbind
        } else {
            return Decision::Ignored;
        };

        if !self.validator.is_valid(event) {
            return Decision::Invalid;
        }
        if !self.dedup.observe(event) {
            return Decision::Duplicate;
        }
        Decision::Accept(action)
    }

    fn spawn(&self, action: Action, event: &LifecycleEvent) {
        let span = match action {
            Action::Bind => info_span!("bind", pod = %event.name, uid = ?event.uid),
            Action::Unbind => info_span!("unbind", pod = %event.name, uid = ?event.uid),
        };
        let flow = self
            .pipeline
            .clone()
            .run(action, event.namespace.clone(), event.name.clone())
            .instrument(span);
        match action {
            Action::Bind => self.binds.push(flow),
            Action::Unbind => self.unbinds.push(flow),
        }
    }
}
