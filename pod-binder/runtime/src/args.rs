use crate::{
    controller::{
        self, Dispatcher, EventValidator, LogUpstream, Metrics, Pipeline, ReadinessWaiter, Router,
        ServiceResolver, TieBreak,
    },
    deliver,
    k8s::{self, watcher, KubeClusterApi},
};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::{num::NonZeroUsize, sync::Arc};
use tokio::time::Duration;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "pod-binder",
    about = "Binds pods to the services that front them as they start and stop"
)]
pub struct Args {
    #[clap(long, default_value = "pod_binder=info,warn", env = "POD_BINDER_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain", env = "POD_BINDER_LOG_FORMAT")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Namespace whose pod events are watched.
    #[clap(long, default_value = "prod", env = "POD_BINDER_NAMESPACE")]
    namespace: String,

    /// Kind of the involved object of watched events.
    #[clap(long, default_value = "Pod", env = "POD_BINDER_RESOURCE_KIND")]
    resource_kind: String,

    /// Event reason that triggers a bind.
    #[clap(long, default_value = "Started", env = "POD_BINDER_START_REASON")]
    start_reason: String,

    /// Event reason that triggers an unbind.
    #[clap(long, default_value = "Killing", env = "POD_BINDER_KILL_REASON")]
    kill_reason: String,

    /// Pod label keys used to select the pod's service.
    #[clap(
        long,
        default_value = "env,logic_group,appcode",
        env = "POD_BINDER_SELECTOR_KEYS"
    )]
    selector_keys: SelectorKeys,

    #[clap(long, default_value = "10000", env = "POD_BINDER_SERVICE_LIST_LIMIT")]
    service_list_limit: u32,

    /// How to pick a service when several match a pod: first, name, or unique.
    #[clap(long, default_value = "name", env = "POD_BINDER_SERVICE_TIE_BREAK")]
    service_tie_break: TieBreak,

    #[clap(long, default_value = "5", env = "POD_BINDER_READY_POLL_INTERVAL_SECS")]
    ready_poll_interval_secs: u64,

    #[clap(long, default_value = "3600", env = "POD_BINDER_READY_TIMEOUT_SECS")]
    ready_timeout_secs: u64,

    /// Time to wait after a pod becomes ready before binding it.
    #[clap(long, default_value = "10", env = "POD_BINDER_READY_GRACE_SECS")]
    ready_grace_secs: u64,

    #[clap(long, default_value = "64", env = "POD_BINDER_MAX_BIND_FLOWS")]
    max_bind_flows: NonZeroUsize,

    #[clap(long, default_value = "64", env = "POD_BINDER_MAX_UNBIND_FLOWS")]
    max_unbind_flows: NonZeroUsize,

    /// Window in which a redelivered event is ignored. Zero disables it.
    #[clap(long, default_value = "7200", env = "POD_BINDER_DEDUP_WINDOW_SECS")]
    dedup_window_secs: u64,
}

#[derive(Clone, Debug)]
struct SelectorKeys(Vec<String>);

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            namespace,
            resource_kind,
            start_reason,
            kill_reason,
            selector_keys: SelectorKeys(selector_keys),
            service_list_limit,
            service_tie_break,
            ready_poll_interval_secs,
            ready_timeout_secs,
            ready_grace_secs,
            max_bind_flows,
            max_unbind_flows,
            dedup_window_secs,
        } = self;

        if ready_poll_interval_secs == 0 {
            bail!("--ready-poll-interval-secs must be positive");
        }

        // Events emitted before this point are replays.
        let validator = EventValidator::started_now();

        let mut prom = <Registry>::default();
        let metrics = Metrics::register(prom.sub_registry_with_prefix("pod_binder"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let api = KubeClusterApi::new(runtime.client());
        let pipeline = Pipeline::new(
            api.clone(),
            ReadinessWaiter::new(
                api.clone(),
                Duration::from_secs(ready_poll_interval_secs),
                Duration::from_secs(ready_timeout_secs),
            ),
            ServiceResolver::new(
                api.clone(),
                selector_keys,
                service_list_limit,
                service_tie_break,
            ),
            Dispatcher::new(Arc::new(LogUpstream::default()), metrics.clone()),
            Duration::from_secs(ready_grace_secs),
            metrics.clone(),
        );
        let router = Router::new(
            controller::Config {
                namespace: namespace.clone(),
                kind: resource_kind.clone(),
                start_reason,
                kill_reason,
                dedup_window: Duration::from_secs(dedup_window_secs),
                max_bind_flows: max_bind_flows.get(),
                max_unbind_flows: max_unbind_flows.get(),
            },
            validator,
            pipeline,
            metrics,
        );

        let events = runtime.watch_namespaced::<k8s::Event>(
            namespace.clone(),
            watcher::Config::default().fields(&format!("involvedObject.kind={resource_kind}")),
        );
        tokio::spawn(
            deliver::run(router, events, runtime.shutdown_handle())
                .instrument(info_span!("events", ns = %namespace)),
        );
        info!(%namespace, kind = %resource_kind, started_at = %validator.started_at(), "Watching lifecycle events");

        // Block the main thread on the shutdown signal. Once it fires, stop
        // delivering events; in-flight flows are not awaited.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

impl std::str::FromStr for SelectorKeys {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let keys = s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        if keys.is_empty() {
            bail!("at least one selector key is required");
        }
        Ok(Self(keys))
    }
}
