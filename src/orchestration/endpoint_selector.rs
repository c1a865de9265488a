//! Choice between the private and the public repository endpoint

use crate::core::traits::{EndpointChoice, NOT_PROBED, RepositoryClient};
use std::time::Duration;

pub struct EndpointSelector<'a> {
    client: &'a dyn RepositoryClient,
    timeout: Duration,
}

impl<'a> EndpointSelector<'a> {
    pub fn new(client: &'a dyn RepositoryClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Probe `primary` once; any HTTP response selects it, otherwise `fallback`
    ///
    /// The fallback is not probed.
    pub async fn select_endpoint(&self, primary: &str, fallback: &str) -> EndpointChoice {
        match self.client.probe(primary, self.timeout).await {
            Ok(status) => {
                tracing::info!(domain = primary, status = status.as_u16(), "primary endpoint reachable");
                EndpointChoice {
                    domain: primary.to_string(),
                    reachable: true,
                    probe_status_code: status.as_u16(),
                }
            }
            Err(err) => {
                tracing::info!(
                    primary,
                    fallback,
                    error = %err,
                    "primary endpoint unreachable, using fallback"
                );
                EndpointChoice {
                    domain: fallback.to_string(),
                    reachable: false,
                    probe_status_code: NOT_PROBED,
                }
            }
        }
    }
}
