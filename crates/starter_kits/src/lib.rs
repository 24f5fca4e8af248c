//! # Starter Kits
//!
//! Gives every player a one-time kit of items the first time they join.
//!
//! The crate owns only the bookkeeping: the kit configuration, an item
//! catalog to validate it against, and a ledger of players who already
//! received their kit. Delivering items, checking permissions and
//! subscribing to join events stay with the host, reached through the
//! [`KitHost`] trait.
//!
//! ```no_run
//! use starter_kits::{Action, ItemCatalog, StarterKits};
//!
//! let mut kits = StarterKits::init("plugins/starterkits", ItemCatalog::builtin())?;
//! if let Action::Deliver(items) = kits.on_arrival("069a79f4-44e9-4726-a5be-fca90e38aaf5", true)? {
//!     println!("deliver {} item stacks", items.len());
//! }
//! # Ok::<(), starter_kits::KitError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod ledger;
pub mod lifecycle;

pub use catalog::ItemCatalog;
pub use config::{ensure_default_config, KitDefinition, KitItem, DEFAULT_CONFIG};
pub use error::{ConfigError, DeliveryError, KitError, LedgerError};
pub use host::{
    handle_arrival, handle_command, ArrivalOutcome, CommandReply, KitCommand, KitHost,
    RECEIVE_CAPABILITY, REGRANT_CAPABILITY, RELOAD_CAPABILITY,
};
pub use ledger::GrantLedger;
pub use lifecycle::{Action, KitState, SkipReason, StarterKits, CONFIG_FILE_NAME, LEDGER_FILE_NAME};
