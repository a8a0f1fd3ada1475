use pod_binder_core::Action;
use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct Metrics {
    events: Family<EventLabels, Counter>,
    flows_queued: Family<ActionLabels, Gauge>,
    flows_active: Family<ActionLabels, Gauge>,
    flows: Family<FlowLabels, Counter>,
    actions: Family<ActionResultLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct EventLabels {
    outcome: EventOutcome,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum EventOutcome {
    Filtered,
    Ignored,
    Invalid,
    Duplicate,
    Accepted,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ActionLabels {
    action: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct FlowLabels {
    action: String,
    result: FlowResult,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum FlowResult {
    Dispatched,
    NotReady,
    FetchFailed,
    Unresolved,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ActionResultLabels {
    action: String,
    result: ActionResult,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum ActionResult {
    Ok,
    Failed,
}

// === impl Metrics ===

impl Metrics {
    pub fn register(prom: &mut Registry) -> Self {
        let events = Family::default();
        prom.register(
            "events",
            "Count of delivered lifecycle events by routing outcome",
            events.clone(),
        );

        let flows_queued = Family::default();
        prom.register(
            "flows_queued",
            "Gauge of accepted flows waiting for a concurrency slot",
            flows_queued.clone(),
        );

        let flows_active = Family::default();
        prom.register(
            "flows_active",
            "Gauge of flows currently running",
            flows_active.clone(),
        );

        let flows = Family::default();
        prom.register("flows", "Count of completed flows by result", flows.clone());

        let actions = Family::default();
        prom.register(
            "actions",
            "Count of bind and unbind action invocations by result",
            actions.clone(),
        );

        Self {
            events,
            flows_queued,
            flows_active,
            flows,
            actions,
        }
    }

    pub(crate) fn event(&self, outcome: EventOutcome) {
        self.events.get_or_create(&EventLabels { outcome }).inc();
    }

    pub(crate) fn queued(&self, action: Action) -> Gauge {
        self.flows_queued
            .get_or_create(&ActionLabels::from(action))
            .clone()
    }

    pub(crate) fn active(&self, action: Action) -> Gauge {
        self.flows_active
            .get_or_create(&ActionLabels::from(action))
            .clone()
    }

    pub(crate) fn flow(&self, action: Action, result: FlowResult) {
        self.flows
            .get_or_create(&FlowLabels {
                action: action.to_string(),
                result,
            })
            .inc();
    }

    pub(crate) fn action(&self, action: Action, result: ActionResult) {
        self.actions
            .get_or_create(&ActionResultLabels {
                action: action.to_string(),
                result,
            })
            .inc();
    }

    #[cfg(test)]
    pub(crate) fn event_count(&self, outcome: EventOutcome) -> u64 {
        self.events.get_or_create(&EventLabels { outcome }).get()
    }

    #[cfg(test)]
    pub(crate) fn flow_count(&self, action: Action, result: FlowResult) -> u64 {
        self.flows
            .get_or_create(&FlowLabels {
                action: action.to_string(),
                result,
            })
            .get()
    }

    #[cfg(test)]
    pub(crate) fn action_count(&self, action: Action, result: ActionResult) -> u64 {
        self.actions
            .get_or_create(&ActionResultLabels {
                action: action.to_string(),
                result,
            })
            .get()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::register(&mut Registry::default())
    }
}

impl From<Action> for ActionLabels {
    fn from(action: Action) -> Self {
        Self {
            action: action.to_string(),
        }
    }
}
