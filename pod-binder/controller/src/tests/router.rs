use super::*;
use crate::{
    metrics::{ActionResult, EventOutcome, FlowResult},
    router::Decision,
};
use pretty_assertions::assert_eq;
use tokio::time::{self, Duration, Instant};

fn harness() -> Harness {
    let h = Harness::new(Config::default());
    h.api.add_pod("api-7", Some("10.0.0.7"), Some(0));
    h.api.add_service("api-svc", &selector_labels());
    h
}

#[tokio::test(start_paused = true)]
async fn started_event_binds_once() {
    let mut h = harness();
    let ev = h.event("api-7", "Started");
    h.router.handle(&ev);

    let (action, task) = h.next_action().await;
    assert_eq!(action, Action::Bind);
    assert_eq!(
        task,
        BindingTask {
            address: "10.0.0.7".to_string(),
            service_name: "api-svc".to_string(),
        }
    );
    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.event_count(EventOutcome::Accepted), 1);
    assert_eq!(h.metrics.flow_count(Action::Bind, FlowResult::Dispatched), 1);
    assert_eq!(h.metrics.action_count(Action::Bind, ActionResult::Ok), 1);
}

#[tokio::test(start_paused = true)]
async fn killing_event_unbinds_without_waiting() {
    let mut h = harness();
    let ev = h.event("api-7", "Killing");

    let start = Instant::now();
    h.router.handle(&ev);
    let (action, task) = h.next_action().await;
    assert!(start.elapsed() < DEFAULT_POLL_INTERVAL);
    assert_eq!(action, Action::Unbind);
    assert_eq!(
        task,
        BindingTask {
            address: "10.0.0.7".to_string(),
            service_name: "api-svc".to_string(),
        }
    );

    // A single snapshot fetch: no readiness polling.
    assert_eq!(h.api.pod_fetches(), 1);
    h.assert_no_more_actions().await;
}

#[tokio::test(start_paused = true)]
async fn repeated_event_is_not_dispatched() {
    let mut h = harness();
    let mut ev = h.event("api-7", "Started");
    ev.count = 2;
    h.router.handle(&ev);

    h.assert_no_more_actions().await;
    assert_eq!(h.api.pod_fetches(), 0);
    assert_eq!(h.metrics.event_count(EventOutcome::Invalid), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_event_is_not_dispatched() {
    let mut h = harness();
    let mut ev = h.event("api-7", "Killing");
    ev.last_timestamp = Some(h.started_at - ChronoDuration::seconds(30));
    h.router.handle(&ev);

    h.assert_no_more_actions().await;
    assert_eq!(h.api.pod_fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn other_kinds_and_namespaces_are_filtered() {
    let mut h = harness();

    let mut ev = h.event("api-7", "Started");
    ev.kind = "Deployment".to_string();
    assert_eq!(h.router.decide(&ev), Decision::Filtered);
    h.router.handle(&ev);

    let mut ev = h.event("api-7", "Killing");
    ev.namespace = "staging".to_string();
    h.router.handle(&ev);

    h.assert_no_more_actions().await;
    assert_eq!(h.api.pod_fetches(), 0);
    assert_eq!(h.api.service_lists(), 0);
    assert_eq!(h.metrics.event_count(EventOutcome::Filtered), 2);
}

#[tokio::test(start_paused = true)]
async fn other_types_and_reasons_are_ignored() {
    let mut h = harness();

    let mut ev = h.event("api-7", "Started");
    ev.type_ = LifecycleEvent::WARNING.to_string();
    assert_eq!(h.router.decide(&ev), Decision::Ignored);

    for reason in ["Unhealthy", "Pulled", "Scheduled", "BackOff"] {
        let ev = h.event("api-7", reason);
        h.router.handle(&ev);
    }

    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.event_count(EventOutcome::Ignored), 4);
}

#[tokio::test(start_paused = true)]
async fn redelivered_event_is_dispatched_once() {
    let mut h = harness();
    let ev = h.event("api-7", "Killing");
    h.router.handle(&ev);
    h.router.handle(&ev);

    let (action, _) = h.next_action().await;
    assert_eq!(action, Action::Unbind);
    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.event_count(EventOutcome::Duplicate), 1);
}

#[tokio::test(start_paused = true)]
async fn redelivery_without_dedup_dispatches_twice() {
    let mut h = Harness::new(Config {
        dedup_window: Duration::ZERO,
        ..Config::default()
    });
    h.api.add_pod("api-7", Some("10.0.0.7"), Some(0));
    h.api.add_service("api-svc", &selector_labels());

    let ev = h.event("api-7", "Killing");
    h.router.handle(&ev);
    h.router.handle(&ev);

    h.next_action().await;
    h.next_action().await;
    h.assert_no_more_actions().await;
}

#[tokio::test(start_paused = true)]
async fn never_ready_pod_is_not_bound() {
    let mut h = harness();
    h.api.add_pod("api-8", Some("10.0.0.8"), None);
    let ev = h.event("api-8", "Started");
    h.router.handle(&ev);

    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.flow_count(Action::Bind, FlowResult::NotReady), 1);
}

#[tokio::test(start_paused = true)]
async fn unmatched_pod_is_not_dispatched() {
    let mut h = harness();
    h.api.add_pod_with_labels(
        "batch-1",
        &[("env", "p"), ("logic_group", "g"), ("appcode", "batch")],
    );
    let ev = h.event("batch-1", "Killing");
    h.router.handle(&ev);

    h.assert_no_more_actions().await;
    assert_eq!(h.api.service_lists(), 1);
    assert_eq!(h.metrics.flow_count(Action::Unbind, FlowResult::Unresolved), 1);
}

#[tokio::test(start_paused = true)]
async fn action_failures_are_recorded_not_retried() {
    let mut h = Harness::with_upstream(Config::default(), true);
    h.api.add_pod("api-7", Some("10.0.0.7"), Some(0));
    h.api.add_service("api-svc", &selector_labels());
    let ev = h.event("api-7", "Killing");
    h.router.handle(&ev);

    h.next_action().await;
    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.action_count(Action::Unbind, ActionResult::Failed), 1);
    assert_eq!(h.metrics.flow_count(Action::Unbind, FlowResult::Dispatched), 1);
}

#[tokio::test(start_paused = true)]
async fn bind_flows_are_bounded() {
    let mut h = Harness::new(Config {
        max_bind_flows: 2,
        ..Config::default()
    });
    h.api.add_service("api-svc", &selector_labels());
    for name in ["api-1", "api-2", "api-3"] {
        h.api.add_pod(name, Some("10.0.0.1"), None);
        let ev = h.event(name, "Started");
        h.router.handle(&ev);
    }

    // Two flows poll for readiness while the third waits for a slot.
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.router.queue_depth(Action::Bind), 1);
    assert_eq!(h.router.queue_depth(Action::Unbind), 0);

    // Unbind flows have their own slots.
    h.api.add_pod("api-7", Some("10.0.0.7"), Some(0));
    let ev = h.event("api-7", "Killing");
    h.router.handle(&ev);
    let (action, _) = h.next_action().await;
    assert_eq!(action, Action::Unbind);

    // Once the first two time out, the third runs.
    time::sleep(DEFAULT_TIMEOUT).await;
    assert_eq!(h.router.queue_depth(Action::Bind), 0);
    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.flow_count(Action::Bind, FlowResult::NotReady), 3);
}

#[tokio::test(start_paused = true)]
async fn each_container_start_is_dispatched() {
    let mut h = harness();
    let first = h.event("api-7", "Started");
    let second = LifecycleEvent {
        event_name: "api-7.sidecar".to_string(),
        event_uid: Some("ev-api-7-sidecar".to_string()),
        ..first.clone()
    };
    h.router.handle(&first);
    h.router.handle(&second);

    for _ in 0..2 {
        let (action, task) = h.next_action().await;
        assert_eq!(action, Action::Bind);
        assert_eq!(task.service_name, "api-svc");
    }
    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.event_count(EventOutcome::Accepted), 2);
    assert_eq!(h.metrics.event_count(EventOutcome::Duplicate), 0);
}

#[tokio::test(start_paused = true)]
async fn relisted_event_is_not_dispatched_again() {
    let mut h = harness();
    let ev = h.event("api-7", "Killing");
    h.router.handle(&ev);
    let (action, _) = h.next_action().await;
    assert_eq!(action, Action::Unbind);

    // A watch relist redelivers every Event object still stored, up to the
    // API server's event TTL.
    for _ in 0..6 {
        time::sleep(Duration::from_secs(11 * 60)).await;
        h.router.handle(&ev);
    }

    h.assert_no_more_actions().await;
    assert_eq!(h.metrics.event_count(EventOutcome::Duplicate), 6);
}
