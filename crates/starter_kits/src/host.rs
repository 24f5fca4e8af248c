//! Host-facing ports.
//!
//! The host (a game server, or the console adapter in `kitd`) implements
//! [`KitHost`] and forwards its native arrival events and commands to
//! [`handle_arrival`] and [`handle_command`].

use crate::config::KitItem;
use crate::error::DeliveryError;
use crate::lifecycle::{Action, StarterKits};
use tracing::{error, info, warn};

/// Capability a player needs to receive a kit.
pub const RECEIVE_CAPABILITY: &str = "starterkits.receive";
/// Capability needed to run the reload command.
pub const RELOAD_CAPABILITY: &str = "starterkits.reload";
/// Capability needed to re-grant a kit by hand.
pub const REGRANT_CAPABILITY: &str = "starterkits.regrant";

// A failed grant stays recorded in memory, so reconnecting does not retry;
// operators repair it with `regrant`.
const GRANT_FAILED_MESSAGE: &str =
    "An error occurred giving you a starter kit! Please report this to an operator.";

/// Services the component consumes from its host.
pub trait KitHost {
    /// Permission check for `player`.
    fn has_capability(&self, player: &str, capability: &str) -> bool;

    /// Adds `items` to the player's inventory.
    fn deliver(&mut self, player: &str, items: &[KitItem]) -> Result<(), DeliveryError>;

    /// Sends a chat/console message to `player`.
    fn notify(&mut self, player: &str, message: &str);
}

/// Result of an arrival after the host has been driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrivalOutcome {
    Delivered(usize),
    Skipped,
    Failed,
}

/// Grant trigger: runs one arrival event to completion.
///
/// Failures are logged and reported to the player; they are never
/// propagated back into the host's event loop.
pub fn handle_arrival<H: KitHost>(
    kits: &mut StarterKits,
    host: &mut H,
    player: &str,
) -> ArrivalOutcome {
    let has_capability = host.has_capability(player, RECEIVE_CAPABILITY);

    match kits.on_arrival(player, has_capability) {
        Ok(Action::Deliver(items)) => deliver(host, player, &items),
        Ok(Action::Skip(_)) => ArrivalOutcome::Skipped,
        Err(e) => {
            warn!("Exception giving kit to player: {}: {}", player, e);
            host.notify(player, GRANT_FAILED_MESSAGE);
            ArrivalOutcome::Failed
        }
    }
}

fn deliver<H: KitHost>(host: &mut H, player: &str, items: &[KitItem]) -> ArrivalOutcome {
    match host.deliver(player, items) {
        Ok(()) => ArrivalOutcome::Delivered(items.len()),
        Err(e) => {
            // Already recorded in the ledger; only a regrant can repair this.
            error!("Kit recorded for {} but delivery failed: {}", player, e);
            host.notify(player, GRANT_FAILED_MESSAGE);
            ArrivalOutcome::Failed
        }
    }
}

/// Operator commands understood by the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KitCommand {
    ReloadKits,
    Regrant,
}

impl KitCommand {
    /// Matches a command name case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "reloadkits" => Some(Self::ReloadKits),
            "regrant" => Some(Self::Regrant),
            _ => None,
        }
    }

    fn capability(self) -> &'static str {
        match self {
            Self::ReloadKits => RELOAD_CAPABILITY,
            Self::Regrant => REGRANT_CAPABILITY,
        }
    }
}

/// Reply sent back to whoever issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Reloaded,
    Regranted(String),
    PermissionDenied,
    Unknown,
    Usage(&'static str),
    Failed(String),
}

impl CommandReply {
    pub fn message(&self) -> String {
        match self {
            Self::Reloaded => "Reload complete.".to_string(),
            Self::Regranted(player) => format!("Starter kit re-granted to {player}."),
            Self::PermissionDenied => "You do not have permission.".to_string(),
            Self::Unknown => "Unknown command!".to_string(),
            Self::Usage(usage) => format!("Usage: {usage}"),
            Self::Failed(reason) => format!("Command failed: {reason}"),
        }
    }
}

/// Dispatches an operator command issued by `sender`.
pub fn handle_command<H: KitHost>(
    kits: &mut StarterKits,
    host: &mut H,
    sender: &str,
    name: &str,
    args: &[&str],
) -> CommandReply {
    let Some(command) = KitCommand::parse(name) else {
        return CommandReply::Unknown;
    };
    if !host.has_capability(sender, command.capability()) {
        info!("{} was denied the {:?} command", sender, command);
        return CommandReply::PermissionDenied;
    }

    match command {
        KitCommand::ReloadKits => match kits.on_reload_command() {
            Ok(_) => CommandReply::Reloaded,
            Err(e) => {
                error!("Reload failed, starter kits are now shut down: {}", e);
                CommandReply::Failed(e.to_string())
            }
        },
        KitCommand::Regrant => {
            let [player] = args else {
                return CommandReply::Usage("regrant <player>");
            };
            match kits.regrant(player) {
                Ok(Action::Deliver(items)) => match deliver(host, player, &items) {
                    ArrivalOutcome::Delivered(_) => CommandReply::Regranted(player.to_string()),
                    _ => CommandReply::Failed(format!("delivery to {player} failed")),
                },
                Ok(Action::Skip(_)) => CommandReply::Failed("starter kits are disabled".to_string()),
                Err(e) => {
                    warn!("Regrant for {} failed: {}", player, e);
                    CommandReply::Failed(e.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse_ignores_case() {
        assert_eq!(KitCommand::parse("reloadkits"), Some(KitCommand::ReloadKits));
        assert_eq!(KitCommand::parse("ReloadKits"), Some(KitCommand::ReloadKits));
        assert_eq!(KitCommand::parse("REGRANT"), Some(KitCommand::Regrant));
        assert_eq!(KitCommand::parse("reload"), None);
    }

    #[test]
    fn test_reply_messages() {
        assert_eq!(CommandReply::Reloaded.message(), "Reload complete.");
        assert_eq!(CommandReply::PermissionDenied.message(), "You do not have permission.");
        assert_eq!(CommandReply::Unknown.message(), "Unknown command!");
    }
}
