//! Lifecycle of the starter kit component.
//!
//! [`StarterKits`] owns the kit definition and the grant ledger for one
//! data directory. It is built by [`StarterKits::init`], rebuilt from disk
//! by [`StarterKits::on_reload_command`] and released by
//! [`StarterKits::shutdown`]. Nothing is kept in statics.
//!
//! Grants follow a persist-then-deliver policy: the ledger is rewritten
//! before the caller is told to deliver, so a crash between the two leaves
//! a player recorded but without items. Operators repair that with
//! [`StarterKits::regrant`].

use crate::catalog::ItemCatalog;
use crate::config::{ensure_default_config, KitDefinition, KitItem};
use crate::error::KitError;
use crate::ledger::GrantLedger;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the kit configuration file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Name of the ledger file inside the data directory.
pub const LEDGER_FILE_NAME: &str = "players.lst";

/// Observable availability of kits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KitState {
    /// Config loaded with `kits_enabled = false`; the ledger is not loaded
    Disabled,
    /// Config and ledger loaded, arrivals are checked
    Enabled,
    /// Released by `shutdown` or a failed reload
    ShutDown,
}

/// What the host should do in response to an arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hand these items to the player; the grant is already recorded
    Deliver(Vec<KitItem>),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    KitsDisabled,
    AlreadyGranted,
    MissingCapability,
}

#[derive(Debug)]
struct Loaded {
    kit: KitDefinition,
    /// Present only while kits are enabled
    ledger: Option<GrantLedger>,
}

/// Kit definition plus grant ledger for a single data directory.
#[derive(Debug)]
pub struct StarterKits {
    data_dir: PathBuf,
    catalog: ItemCatalog,
    loaded: Option<Loaded>,
}

impl StarterKits {
    /// Bootstraps `data_dir` and loads the component.
    ///
    /// Creates the directory, the default configuration and an empty
    /// ledger as needed, then parses the configuration. The ledger is read
    /// only when kits are enabled.
    ///
    /// # Errors
    ///
    /// Any configuration or ledger failure is fatal: the caller gets the
    /// error and no component.
    pub fn init(data_dir: impl Into<PathBuf>, catalog: ItemCatalog) -> Result<Self, KitError> {
        let mut kits = Self {
            data_dir: data_dir.into(),
            catalog,
            loaded: None,
        };
        kits.start()?;
        Ok(kits)
    }

    fn start(&mut self) -> Result<(), KitError> {
        if !self.data_dir.is_dir() {
            if let Err(e) = std::fs::create_dir_all(&self.data_dir) {
                warn!(
                    "Unable to create data directory {}: {}",
                    self.data_dir.display(),
                    e
                );
            }
        }

        let config_path = self.config_path();
        ensure_default_config(&config_path)?;
        GrantLedger::create_if_missing(self.ledger_path())?;

        let kit = KitDefinition::load(&config_path, &self.catalog)?;
        let ledger = if kit.is_enabled() {
            Some(GrantLedger::load(self.ledger_path())?)
        } else {
            info!("Kits disabled; not loading players.");
            None
        };

        self.loaded = Some(Loaded { kit, ledger });
        info!("Starter kits ready ({:?})", self.state());
        Ok(())
    }

    pub fn state(&self) -> KitState {
        match &self.loaded {
            None => KitState::ShutDown,
            Some(Loaded { ledger: None, .. }) => KitState::Disabled,
            Some(Loaded { ledger: Some(_), .. }) => KitState::Enabled,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE_NAME)
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Current kit definition, `None` once shut down.
    pub fn kit(&self) -> Option<&KitDefinition> {
        self.loaded.as_ref().map(|loaded| &loaded.kit)
    }

    /// Current ledger, `None` unless kits are enabled.
    pub fn ledger(&self) -> Option<&GrantLedger> {
        self.loaded.as_ref().and_then(|loaded| loaded.ledger.as_ref())
    }

    /// Handles a player arrival.
    ///
    /// Returns [`Action::Deliver`] only for a player with the capability who
    /// is not yet in the ledger, after the ledger has been rewritten.
    ///
    /// # Errors
    ///
    /// A failed ledger rewrite is returned as [`KitError::Ledger`]. The
    /// player stays recorded in memory and nothing should be delivered.
    pub fn on_arrival(&mut self, player_id: &str, has_capability: bool) -> Result<Action, KitError> {
        let Some(Loaded {
            kit,
            ledger: Some(ledger),
        }) = self.loaded.as_mut()
        else {
            return Ok(Action::Skip(SkipReason::KitsDisabled));
        };

        if ledger.contains(player_id) {
            return Ok(Action::Skip(SkipReason::AlreadyGranted));
        }
        if !has_capability {
            debug!("Player {} lacks the receive capability", player_id);
            return Ok(Action::Skip(SkipReason::MissingCapability));
        }

        ledger.grant(player_id)?;
        info!("Granting starter kit to {}", player_id);
        Ok(Action::Deliver(kit.items().to_vec()))
    }

    /// Delivers the kit again regardless of the ledger, recording the player
    /// if they were not recorded yet.
    pub fn regrant(&mut self, player_id: &str) -> Result<Action, KitError> {
        let Some(Loaded {
            kit,
            ledger: Some(ledger),
        }) = self.loaded.as_mut()
        else {
            return Ok(Action::Skip(SkipReason::KitsDisabled));
        };

        ledger.grant(player_id)?;
        info!("Re-granting starter kit to {}", player_id);
        Ok(Action::Deliver(kit.items().to_vec()))
    }

    /// Tears the component down and rebuilds it from disk.
    ///
    /// Anything not yet persisted is lost. If rebuilding fails the
    /// component stays shut down and the error is returned.
    pub fn on_reload_command(&mut self) -> Result<KitState, KitError> {
        self.shutdown();
        self.start()?;
        info!("Reloaded.");
        Ok(self.state())
    }

    /// Releases the kit and ledger. Later arrivals are skipped.
    pub fn shutdown(&mut self) {
        if self.loaded.take().is_some() {
            debug!("Starter kits shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use tempfile::TempDir;

    const ENABLED: &str = r#"
kits_enabled = true

[[kit]]
name = "STONE"
count = 5

[[kit]]
name = "BREAD"
count = 2
"#;

    fn enabled_kits(dir: &TempDir) -> StarterKits {
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), ENABLED).unwrap();
        StarterKits::init(dir.path(), ItemCatalog::builtin()).unwrap()
    }

    #[test]
    fn test_bootstrap_empty_directory() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("starterkits");

        let kits = StarterKits::init(&data_dir, ItemCatalog::builtin()).unwrap();

        assert!(data_dir.is_dir());
        assert_eq!(kits.data_dir(), data_dir.as_path());
        assert!(kits.catalog().contains("STONE"));
        assert!(data_dir.join(CONFIG_FILE_NAME).is_file());
        assert_eq!(std::fs::read_to_string(data_dir.join(LEDGER_FILE_NAME)).unwrap(), "");
        // The bundled default ships with kits switched off.
        assert_eq!(kits.state(), KitState::Disabled);
        assert!(kits.ledger().is_none());
    }

    #[test]
    fn test_first_arrival_delivers_once() {
        let dir = TempDir::new().unwrap();
        let mut kits = enabled_kits(&dir);

        let action = kits.on_arrival("player-1", true).unwrap();
        assert_eq!(
            action,
            Action::Deliver(vec![KitItem::new("STONE", 5), KitItem::new("BREAD", 2)])
        );

        let persisted = std::fs::read_to_string(kits.ledger_path()).unwrap();
        assert_eq!(persisted, "player-1\n");

        let again = kits.on_arrival("player-1", true).unwrap();
        assert_eq!(again, Action::Skip(SkipReason::AlreadyGranted));
    }

    #[test]
    fn test_missing_capability_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let mut kits = enabled_kits(&dir);

        let action = kits.on_arrival("guest", false).unwrap();
        assert_eq!(action, Action::Skip(SkipReason::MissingCapability));
        assert!(!kits.ledger().unwrap().contains("guest"));

        // Once the capability is granted the kit is delivered.
        assert!(matches!(kits.on_arrival("guest", true).unwrap(), Action::Deliver(_)));
    }

    #[test]
    fn test_disabled_never_touches_ledger() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "kits_enabled = false\n").unwrap();
        let mut kits = StarterKits::init(dir.path(), ItemCatalog::builtin()).unwrap();

        let action = kits.on_arrival("player-1", true).unwrap();
        assert_eq!(action, Action::Skip(SkipReason::KitsDisabled));
        assert_eq!(std::fs::read_to_string(kits.ledger_path()).unwrap(), "");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let mut kits = enabled_kits(&dir);
        kits.on_arrival("player-1", true).unwrap();

        std::fs::write(kits.config_path(), "kits_enabled = false\n").unwrap();
        assert_eq!(kits.on_reload_command().unwrap(), KitState::Disabled);

        std::fs::write(kits.config_path(), ENABLED).unwrap();
        assert_eq!(kits.on_reload_command().unwrap(), KitState::Enabled);
        assert!(kits.ledger().unwrap().contains("player-1"));
    }

    #[test]
    fn test_failed_reload_leaves_component_shut_down() {
        let dir = TempDir::new().unwrap();
        let mut kits = enabled_kits(&dir);

        std::fs::write(kits.config_path(), "kits_enabled = [").unwrap();
        assert!(matches!(kits.on_reload_command(), Err(KitError::Config(_))));
        assert_eq!(kits.state(), KitState::ShutDown);
        assert_eq!(
            kits.on_arrival("player-1", true).unwrap(),
            Action::Skip(SkipReason::KitsDisabled)
        );
    }

    #[test]
    fn test_unreadable_ledger_is_fatal_at_startup() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), ENABLED).unwrap();
        std::fs::write(dir.path().join(LEDGER_FILE_NAME), [0xff, 0xfe, b'\n']).unwrap();

        let result = StarterKits::init(dir.path(), ItemCatalog::builtin());
        assert!(matches!(
            result,
            Err(KitError::Ledger(LedgerError::Io { .. }))
        ));
    }

    #[test]
    fn test_unreadable_ledger_ignored_while_disabled() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "kits_enabled = false\n").unwrap();
        std::fs::write(dir.path().join(LEDGER_FILE_NAME), [0xff, 0xfe, b'\n']).unwrap();

        let kits = StarterKits::init(dir.path(), ItemCatalog::builtin()).unwrap();
        assert_eq!(kits.state(), KitState::Disabled);
    }

    #[test]
    fn test_regrant_delivers_to_recorded_player() {
        let dir = TempDir::new().unwrap();
        let mut kits = enabled_kits(&dir);
        kits.on_arrival("player-1", true).unwrap();

        assert!(matches!(kits.regrant("player-1").unwrap(), Action::Deliver(_)));
        assert!(matches!(kits.regrant("player-2").unwrap(), Action::Deliver(_)));
        assert!(kits.ledger().unwrap().contains("player-2"));
    }

    #[test]
    fn test_shutdown_releases_state() {
        let dir = TempDir::new().unwrap();
        let mut kits = enabled_kits(&dir);
        kits.shutdown();

        assert_eq!(kits.state(), KitState::ShutDown);
        assert!(kits.kit().is_none());
        assert!(kits.ledger().is_none());
    }
}
