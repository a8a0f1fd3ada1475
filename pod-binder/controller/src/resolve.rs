use pod_binder_core::{ClusterApi, Error, Result, Selector, Service, WorkloadInstance};
use std::sync::Arc;

/// The label keys copied from a pod into its service query.
pub const DEFAULT_SELECTOR_KEYS: [&str; 3] = ["env", "logic_group", "appcode"];

/// The maximum number of services fetched per query.
pub const DEFAULT_LIST_LIMIT: u32 = 10_000;

/// Chooses a service when more than one matches a pod.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// The first service in API order.
    First,
    /// The lexicographically smallest service name.
    #[default]
    Name,
    /// Fail unless exactly one service matches.
    Unique,
}

/// Finds the service fronting a pod by matching a fixed set of the pod's
/// labels against service labels.
#[derive(Clone, Debug)]
pub struct ServiceResolver<C> {
    client: C,
    keys: Arc<[String]>,
    limit: u32,
    tie_break: TieBreak,
}

// === impl ServiceResolver ===

impl<C: ClusterApi> ServiceResolver<C> {
    pub fn new(
        client: C,
        keys: impl IntoIterator<Item = impl ToString>,
        limit: u32,
        tie_break: TieBreak,
    ) -> Self {
        Self {
            client,
            keys: keys.into_iter().map(|k| k.to_string()).collect(),
            limit,
            tie_break,
        }
    }

    /// Builds the query selector from the pod's values for the configured keys.
    ///
    /// A pod that lacks any of the keys fails with [`Error::MissingLabel`]
    /// instead of querying with an empty value (`key=`), which would match
    /// services that select on the label's absence.
    pub fn selector(&self, instance: &WorkloadInstance) -> Result<Selector> {
        self.keys
            .iter()
            .map(|key| match instance.labels.get(key) {
                Some(v) => Ok((key.clone(), v.to_string())),
                None => Err(Error::MissingLabel {
                    pod: instance.name.clone(),
                    key: key.clone(),
                }),
            })
            .collect()
    }

    pub async fn resolve(&self, instance: &WorkloadInstance, namespace: &str) -> Result<Service> {
        let selector = self.selector(instance)?;
        let services = self
            .client
            .list_services(namespace, &selector, self.limit)
            .await?;
        tracing::debug!(pod = %instance.name, %selector, matches = services.len(), "Queried services");

        let no_service = || Error::NoService {
            pod: instance.name.clone(),
        };
        if services.len() <= 1 {
            return services.into_iter().next().ok_or_else(no_service);
        }

        let names = || services.iter().map(|s| s.name.clone()).collect::<Vec<_>>();
        match self.tie_break {
            TieBreak::First => {
                tracing::warn!(pod = %instance.name, services = ?names(), "Multiple services match pod; using the first");
                services.into_iter().next().ok_or_else(no_service)
            }
            TieBreak::Name => {
                tracing::warn!(pod = %instance.name, services = ?names(), "Multiple services match pod; using the first by name");
                services
                    .into_iter()
                    .min_by(|a, b| a.name.cmp(&b.name))
                    .ok_or_else(no_service)
            }
            TieBreak::Unique => Err(Error::AmbiguousService {
                pod: instance.name.clone(),
                services: names(),
            }),
        }
    }
}

// === impl TieBreak ===

impl std::str::FromStr for TieBreak {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "first" => Ok(Self::First),
            "name" => Ok(Self::Name),
            "unique" => Ok(Self::Unique),
            s => anyhow::bail!("invalid tie-break {s:?}; expected one of: first, name, unique"),
        }
    }
}
