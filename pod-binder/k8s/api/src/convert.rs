use crate::{Event, Pod, Service};
use pod_binder_core as core;

/// Reads the fields of a core/v1 `Event` that the router decides on.
///
/// A missing count reads as zero. The most recent occurrence falls back from
/// `lastTimestamp` to `eventTime` and then `firstTimestamp`.
pub fn lifecycle_event(event: &Event) -> core::LifecycleEvent {
    let obj = &event.involved_object;
    let last_timestamp = event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
        .or_else(|| event.first_timestamp.as_ref().map(|t| t.0));

    core::LifecycleEvent {
        event_name: event.metadata.name.clone().unwrap_or_default(),
        event_uid: event.metadata.uid.clone(),
        kind: obj.kind.clone().unwrap_or_default(),
        namespace: obj.namespace.clone().unwrap_or_default(),
        name: obj.name.clone().unwrap_or_default(),
        uid: obj.uid.clone(),
        reason: event.reason.clone().unwrap_or_default(),
        type_: event.type_.clone().unwrap_or_default(),
        count: event.count.unwrap_or(0),
        last_timestamp,
    }
}

pub fn workload_instance(pod: &Pod) -> core::WorkloadInstance {
    core::WorkloadInstance {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        labels: pod.metadata.labels.clone().into(),
        address: pod
            .status
            .as_ref()
            .and_then(|s| s.pod_ip.clone())
            .filter(|ip| !ip.is_empty()),
        ready: is_pod_ready(pod),
    }
}

pub fn service(svc: &Service) -> core::Service {
    core::Service {
        name: svc.metadata.name.clone().unwrap_or_default(),
        namespace: svc.metadata.namespace.clone().unwrap_or_default(),
        labels: svc.metadata.labels.clone().into(),
    }
}

/// A pod is ready when its `Ready` condition has status `True`.
pub fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .into_iter()
        .flatten()
        .any(|c| c.type_ == "Ready" && c.status == "True")
}
