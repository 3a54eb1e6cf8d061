//! Link supervision: connect, attach, wait for loss, reconnect

use bridge_config::LinkEndpoint;
use bridge_units::LogThrottle;
use link_router::{Link, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Log the first failed connect attempt, then every Nth
const CONNECT_WARN_EVERY: u64 = 30;

pub struct LinkSupervisor {
    router: Arc<Router>,
    endpoint: LinkEndpoint,
    reconnect_interval: Duration,
}

impl LinkSupervisor {
    pub fn new(router: Arc<Router>, endpoint: LinkEndpoint, reconnect_interval: Duration) -> Self {
        Self {
            router,
            endpoint,
            reconnect_interval,
        }
    }

    /// Keep the link attached until `shutdown` flips to `true` or its sender drops
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut connect_failures = LogThrottle::new(CONNECT_WARN_EVERY);
        info!(endpoint = %self.endpoint, "Link supervisor started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match Link::connect(&self.endpoint).await {
                Ok(link) => {
                    let attempts = connect_failures.reset();
                    if attempts > 0 {
                        info!(endpoint = %self.endpoint, attempts, "Link established after retries");
                    }

                    let reader = self.router.attach(link).await;
                    tokio::select! {
                        _ = reader => {
                            warn!(
                                endpoint = %self.endpoint,
                                retry_in_ms = self.reconnect_interval.as_millis() as u64,
                                "Link lost"
                            );
                        }
                        _ = shutdown.changed() => {
                            self.router.detach().await;
                            break;
                        }
                    }
                }
                Err(e) => {
                    if connect_failures.hit() {
                        warn!(
                            error = %e,
                            attempts = connect_failures.count(),
                            "Link connect failed, retrying"
                        );
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(endpoint = %self.endpoint, "Link supervisor stopped");
    }
}
