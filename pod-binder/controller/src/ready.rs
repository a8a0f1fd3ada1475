use pod_binder_core::ClusterApi;
use thiserror::Error;
use tokio::time::{self, Duration};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("pod {namespace}/{name} did not become ready within {timeout:?}")]
pub struct TimedOut {
    pub namespace: String,
    pub name: String,
    pub timeout: Duration,
}

/// Polls a pod until it reports ready.
///
/// The first poll happens immediately. Fetch failures count as not ready.
#[derive(Clone, Debug)]
pub struct ReadinessWaiter<C> {
    client: C,
    interval: Duration,
    timeout: Duration,
}

impl<C: ClusterApi> ReadinessWaiter<C> {
    pub fn new(client: C, interval: Duration, timeout: Duration) -> Self {
        Self {
            client,
            interval,
            timeout,
        }
    }

    pub async fn wait_ready(&self, namespace: &str, name: &str) -> Result<(), TimedOut> {
        let poll = async {
            loop {
                match self.client.get_instance(namespace, name).await {
                    Ok(instance) if instance.ready => return,
                    Ok(_) => tracing::trace!(%namespace, pod = %name, "Not ready"),
                    Err(error) => tracing::debug!(%namespace, pod = %name, %error, "Failed to fetch pod"),
                }
                time::sleep(self.interval).await;
            }
        };

        time::timeout(self.timeout, poll).await.map_err(|_| TimedOut {
            namespace: namespace.to_string(),
            name: name.to_string(),
            timeout: self.timeout,
        })
    }
}
