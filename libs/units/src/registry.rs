//! # Unit Registry and Loader
//!
//! [`UnitCatalog`] maps unit names to factory functions. Registration is
//! explicit; [`UnitCatalog::builtin`] lists every unit compiled into this
//! crate.
//!
//! [`UnitLoader::load`] walks the configured names in order and moves each
//! unit through `Unregistered -> Instantiated -> Initialized -> Active`:
//!
//! - unknown names stay `Unregistered` and are logged once
//! - a unit whose `initialize` fails is logged once and excluded; it is
//!   never registered with the router and never sees a frame
//! - a repeated name is loaded only the first time
//!
//! Subscriptions of active units are registered with the router in load
//! order, which is the order handlers run for a shared message type.

use crate::unit::{Unit, UnitContext, UnitHandler};
use crate::{highres_imu, hil_sensor};
use bridge_config::UnitSettings;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Builds a fresh, uninitialised unit
pub type UnitFactory = fn() -> Box<dyn Unit>;

/// Name -> factory lookup
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    factories: BTreeMap<String, UnitFactory>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the units shipped with the bridge
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(hil_sensor::UNIT_NAME, || -> Box<dyn Unit> {
            Box::new(hil_sensor::HilSensorUnit::new())
        });
        catalog.register(highres_imu::UNIT_NAME, || -> Box<dyn Unit> {
            Box::new(highres_imu::HighresImuUnit::new())
        });
        catalog
    }

    /// Add a factory; replaces and returns `false` if the name was taken
    pub fn register(&mut self, name: &str, factory: UnitFactory) -> bool {
        let fresh = self.factories.insert(name.to_string(), factory).is_none();
        if !fresh {
            warn!(unit = name, "Unit factory replaced");
        }
        fresh
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    fn instantiate(&self, name: &str) -> Option<Box<dyn Unit>> {
        self.factories.get(name).map(|factory| factory())
    }
}

/// Where a configured unit ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    /// Name not in the catalog
    Unregistered,
    Instantiated,
    Initialized,
    /// Receiving events for process lifetime
    Active,
    /// `initialize` returned an error
    Failed { reason: String },
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Unregistered => write!(f, "unregistered"),
            UnitState::Instantiated => write!(f, "instantiated"),
            UnitState::Initialized => write!(f, "initialized"),
            UnitState::Active => write!(f, "active"),
            UnitState::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}

/// Loads configured units against a shared context
#[derive(Debug, Clone, Default)]
pub struct UnitLoader {
    catalog: UnitCatalog,
    settings: BTreeMap<String, UnitSettings>,
}

impl UnitLoader {
    pub fn new(catalog: UnitCatalog) -> Self {
        Self {
            catalog,
            settings: BTreeMap::new(),
        }
    }

    /// Per-unit settings tables, keyed by unit name
    pub fn with_settings(mut self, settings: BTreeMap<String, UnitSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn load(&self, names: &[String], ctx: &UnitContext) -> ActiveUnits {
        let mut seen = HashSet::new();
        let mut active = ActiveUnits::default();

        for name in names {
            if !seen.insert(name.as_str()) {
                debug!(unit = %name, "Duplicate unit name ignored");
                continue;
            }

            let Some(mut unit) = self.catalog.instantiate(name) else {
                error!(unit = %name, "Unknown unit, skipping");
                active.report.push((name.clone(), UnitState::Unregistered));
                continue;
            };
            debug!(unit = %name, state = %UnitState::Instantiated, "Unit created");

            let unit_ctx = ctx
                .clone()
                .with_settings(self.settings.get(name).cloned().unwrap_or_default());
            if let Err(e) = unit.initialize(&unit_ctx) {
                error!(unit = %name, error = %e, "Unit failed to initialize, excluded");
                active.report.push((
                    name.clone(),
                    UnitState::Failed {
                        reason: e.to_string(),
                    },
                ));
                continue;
            }
            debug!(unit = %name, state = %UnitState::Initialized, "Unit initialized");

            let unit: Arc<dyn Unit> = Arc::from(unit);
            let ids = unit.subscriptions();
            ctx.router
                .register(name, &ids, Arc::new(UnitHandler(Arc::clone(&unit))));

            info!(unit = %name, inbound = ?ids, "Unit active");
            active.report.push((name.clone(), UnitState::Active));
            active.units.push((name.clone(), unit));
        }

        active
    }
}

/// Units that reached `Active`, plus the outcome of every configured name
#[derive(Default)]
pub struct ActiveUnits {
    units: Vec<(String, Arc<dyn Unit>)>,
    report: Vec<(String, UnitState)>,
}

impl ActiveUnits {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Active unit names in load order
    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Unit>> {
        self.units
            .iter()
            .find(|(unit, _)| unit == name)
            .map(|(_, unit)| unit)
    }

    /// Final state of each configured name, in configuration order
    pub fn report(&self) -> &[(String, UnitState)] {
        &self.report
    }

    pub fn state_of(&self, name: &str) -> Option<&UnitState> {
        self.report
            .iter()
            .find(|(unit, _)| unit == name)
            .map(|(_, state)| state)
    }

    /// Stop every unit's background work
    pub fn shutdown(&self) {
        for (name, unit) in &self.units {
            unit.shutdown();
            debug!(unit = %name, "Unit stopped");
        }
    }
}

impl fmt::Debug for ActiveUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveUnits")
            .field("active", &self.names())
            .field("report", &self.report)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{UnitError, UnitResult};
    use bridge_bus::LocalBus;
    use link_router::Router;

    struct Broken;

    impl Unit for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn initialize(&mut self, _ctx: &UnitContext) -> UnitResult<()> {
            Err(UnitError::init_failed("broken", "no calibration data"))
        }
    }

    fn broken() -> Box<dyn Unit> {
        Box::new(Broken)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_builtin_catalog() {
        let catalog = UnitCatalog::builtin();
        assert!(catalog.contains("hil_sensor"));
        assert!(catalog.contains("highres_imu"));
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["highres_imu", "hil_sensor"]);
    }

    #[tokio::test]
    async fn test_unknown_failed_and_duplicate_names() {
        let mut catalog = UnitCatalog::builtin();
        catalog.register("broken", broken);

        let router = Arc::new(Router::new());
        let ctx = UnitContext::new(Arc::clone(&router), LocalBus::new());
        let active = UnitLoader::new(catalog).load(
            &names(&["broken", "highres_imu", "mystery", "highres_imu"]),
            &ctx,
        );

        assert_eq!(active.names(), vec!["highres_imu"]);
        assert_eq!(active.report().len(), 3);
        assert!(matches!(active.state_of("broken"), Some(UnitState::Failed { reason }) if reason.contains("calibration")));
        assert_eq!(active.state_of("mystery"), Some(&UnitState::Unregistered));
        assert_eq!(active.state_of("highres_imu"), Some(&UnitState::Active));

        assert_eq!(
            router.handlers_for(bridge_types::MessageId::HIGHRES_IMU),
            vec!["highres_imu"]
        );
    }

    #[test]
    fn test_register_reports_replacement() {
        let mut catalog = UnitCatalog::new();
        assert!(catalog.register("broken", broken));
        assert!(!catalog.register("broken", broken));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(UnitState::Active.to_string(), "active");
        assert_eq!(
            UnitState::Failed { reason: "x".into() }.to_string(),
            "failed (x)"
        );
    }
}
