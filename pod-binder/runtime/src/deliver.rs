use crate::{
    controller::Router,
    core::{ClusterApi, LifecycleEvent, Upstream},
    k8s::{self, watcher},
};
use futures::prelude::*;

/// Feeds watched events to the router until the stream ends or shutdown is
/// signaled. Flows already started keep running.
pub(crate) async fn run<C, U>(
    mut router: Router<C, U>,
    events: impl Stream<Item = watcher::Event<k8s::Event>>,
    drain: drain::Watch,
) where
    C: ClusterApi,
    U: Upstream,
{
    tokio::pin!(events);
    let shutdown = drain.signaled();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            ev = events.next() => match ev {
                Some(ev) => {
                    for ev in lifecycle_events(ev) {
                        router.handle(&ev);
                    }
                }
                None => {
                    tracing::warn!("Event stream ended");
                    return;
                }
            },
            _release = &mut shutdown => {
                tracing::info!("Stopping event delivery");
                return;
            }
        }
    }
}

/// Applied events and relisted events are delivered; a deleted Event object
/// is not a lifecycle transition.
fn lifecycle_events(ev: watcher::Event<k8s::Event>) -> Vec<LifecycleEvent> {
    match ev {
        watcher::Event::Applied(ev) => vec![k8s::lifecycle_event(&ev)],
        watcher::Event::Restarted(evs) => {
            tracing::debug!(events = evs.len(), "Relisted events");
            evs.iter().map(k8s::lifecycle_event).collect()
        }
        watcher::Event::Deleted(ev) => {
            tracing::trace!(name = ?ev.metadata.name, "Event deleted");
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::{
            Config, Dispatcher, EventValidator, LogUpstream, Metrics, Pipeline, ReadinessWaiter,
            ServiceResolver, TieBreak, DEFAULT_LIST_LIMIT, DEFAULT_POLL_INTERVAL,
            DEFAULT_READY_GRACE, DEFAULT_SELECTOR_KEYS, DEFAULT_TIMEOUT,
        },
        core::{Error, Result, Selector, Service, WorkloadInstance},
        k8s::{ObjectMeta, ObjectReference, Time},
    };
    use async_trait::async_trait;
    use chrono::{offset::Utc, DateTime, Duration as ChronoDuration};
    use std::sync::Arc;
    use tokio::{
        sync::mpsc,
        time::{self, Duration},
    };

    /// Reports every pod fetch and finds no pods.
    #[derive(Clone)]
    struct Fetches(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl ClusterApi for Fetches {
        async fn get_instance(&self, namespace: &str, name: &str) -> Result<WorkloadInstance> {
            let _ = self.0.send(name.to_string());
            Err(Error::NotFound {
                kind: "Pod",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        }

        async fn list_services(
            &self,
            _namespace: &str,
            _selector: &Selector,
            _limit: u32,
        ) -> Result<Vec<Service>> {
            Ok(vec![])
        }
    }

    fn mk_router(
        started_at: DateTime<Utc>,
    ) -> (Router<Fetches, LogUpstream>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = Fetches(tx);
        let metrics = Metrics::default();
        let pipeline = Pipeline::new(
            api.clone(),
            ReadinessWaiter::new(api.clone(), DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT),
            ServiceResolver::new(
                api,
                DEFAULT_SELECTOR_KEYS,
                DEFAULT_LIST_LIMIT,
                TieBreak::default(),
            ),
            Dispatcher::new(Arc::new(LogUpstream::default()), metrics.clone()),
            DEFAULT_READY_GRACE,
            metrics.clone(),
        );
        let router = Router::new(
            Config::default(),
            EventValidator::new(started_at),
            pipeline,
            metrics,
        );
        (router, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_drain_is_signaled() {
        let (router, _fetches) = mk_router(Utc::now());
        let (signal, watch) = drain::channel();
        let delivery = tokio::spawn(run(
            router,
            futures::stream::pending::<watcher::Event<k8s::Event>>(),
            watch,
        ));

        time::timeout(Duration::from_secs(1), signal.drain())
            .await
            .expect("delivery must release the drain watch");
        time::timeout(Duration::from_secs(1), delivery)
            .await
            .expect("delivery must stop")
            .expect("delivery must not panic");
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_until_stream_ends() {
        let started_at = Utc::now();
        let (router, mut fetches) = mk_router(started_at);
        let (_signal, watch) = drain::channel();

        let mut ev = mk_event("api-7", "Killing");
        ev.last_timestamp = Some(Time(started_at + ChronoDuration::seconds(1)));
        let events = futures::stream::iter([watcher::Event::Applied(ev)]);

        time::timeout(Duration::from_secs(1), run(router, events, watch))
            .await
            .expect("delivery must return when the stream ends");

        let fetched = time::timeout(Duration::from_secs(1), fetches.recv())
            .await
            .expect("unbind flow must fetch the pod");
        assert_eq!(fetched.as_deref(), Some("api-7"));
    }

    fn mk_event(pod: &str, reason: &str) -> k8s::Event {
        k8s::Event {
            metadata: ObjectMeta {
                namespace: Some("prod".to_string()),
                name: Some(format!("{pod}.{reason}")),
                ..Default::default()
            },
            involved_object: ObjectReference {
                kind: Some("Pod".to_string()),
                namespace: Some("prod".to_string()),
                name: Some(pod.to_string()),
                ..Default::default()
            },
            reason: Some(reason.to_string()),
            type_: Some("Normal".to_string()),
            count: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn applied_events_are_delivered() {
        let evs = lifecycle_events(watcher::Event::Applied(mk_event("api-7", "Started")));
        assert_eq!(evs.len(), 1);
        assert_eq!(evs[0].name, "api-7");
        assert_eq!(evs[0].reason, "Started");
    }

    #[test]
    fn relisted_events_are_delivered() {
        let evs = lifecycle_events(watcher::Event::Restarted(vec![
            mk_event("api-7", "Started"),
            mk_event("api-8", "Killing"),
        ]));
        let names = evs.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["api-7", "api-8"]);
    }

    #[test]
    fn deleted_events_are_dropped() {
        let evs = lifecycle_events(watcher::Event::Deleted(mk_event("api-7", "Killing")));
        assert!(evs.is_empty());
    }
}
