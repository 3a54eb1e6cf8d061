use crate::supervisor::LinkSupervisor;
use anyhow::{bail, Result};
use bridge_bus::LocalBus;
use bridge_config::BridgeConfig;
use bridge_units::{ActiveUnits, UnitCatalog, UnitContext, UnitLoader};
use link_router::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// The assembled bridge process
pub struct Bridge {
    config: BridgeConfig,
    bus: LocalBus,
    router: Arc<Router>,
    catalog: UnitCatalog,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_catalog(config, UnitCatalog::builtin())
    }

    pub fn with_catalog(config: BridgeConfig, catalog: UnitCatalog) -> Self {
        Self {
            bus: LocalBus::with_queue_depth(config.bus.queue_depth),
            router: Arc::new(
                Router::with_max_frame_size(config.link.max_frame_size)
                    .with_write_timeout(config.link.write_timeout()),
            ),
            catalog,
            config,
        }
    }

    /// Handle for in-process publishers and subscribers
    pub fn bus(&self) -> &LocalBus {
        &self.bus
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Load the configured units; fails only if none became active
    pub fn load_units(&self) -> Result<ActiveUnits> {
        let ctx = UnitContext::new(Arc::clone(&self.router), self.bus.clone())
            .with_queue_depth(self.config.bus.queue_depth);

        let active = UnitLoader::new(self.catalog.clone())
            .with_settings(self.config.units.settings.clone())
            .load(&self.config.units.enabled, &ctx);

        for (name, state) in active.report() {
            info!(unit = %name, state = %state, "Unit status");
        }

        if active.is_empty() {
            bail!(
                "none of the configured units became active: {:?}",
                self.config.units.enabled
            );
        }
        Ok(active)
    }

    /// Run until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let units = self.load_units()?;
        info!(active = ?units.names(), "Units loaded");

        let (stop_tx, stop_rx) = watch::channel(false);

        let supervisor = LinkSupervisor::new(
            Arc::clone(&self.router),
            self.config.link.endpoint.clone(),
            self.config.link.reconnect_interval(),
        );
        let supervisor_task = tokio::spawn(supervisor.run(stop_rx.clone()));

        let stats_task = match self.config.service.stats_interval_ms {
            0 => None,
            ms => Some(tokio::spawn(log_stats(
                Arc::clone(&self.router),
                Duration::from_millis(ms),
                stop_rx,
            ))),
        };

        shutdown.await;
        info!("Shutting down");

        // Receivers see the change even if they were not polling yet
        let _ = stop_tx.send(true);
        units.shutdown();

        if let Err(e) = supervisor_task.await {
            warn!(error = %e, "Link supervisor task failed");
        }
        if let Some(task) = stats_task {
            let _ = task.await;
        }

        info!(stats = %self.router.stats(), "Bridge stopped");
        Ok(())
    }
}

async fn log_stats(router: Arc<Router>, every: Duration, mut stop: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                info!(attached = router.is_attached(), stats = %router.stats(), "Router statistics");
            }
            _ = stop.changed() => break,
        }
    }
}
