//! Console host adapter.
//!
//! Stands in for a game server: each stdin line is an arrival or a command,
//! handled to completion before the next line is read.
//!
//! ```text
//! join <player>                 player arrival
//! /<command> [args...]          command issued by the console
//! as <sender> <command> [args]  command issued by another sender
//! status                        print kit state
//! quit                          stop the loop
//! ```

use crate::config::PermissionSettings;
use starter_kits::{
    handle_arrival, handle_command, DeliveryError, KitHost, KitItem, StarterKits,
    RECEIVE_CAPABILITY,
};
use std::collections::HashSet;
use std::future::Future;
use std::ops::ControlFlow;
use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sender name used for `/command` lines.
pub const CONSOLE_SENDER: &str = "console";

const LINE_BUFFER: usize = 64;

/// [`KitHost`] backed by the daemon's permission settings.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    operators: HashSet<String>,
    denied: HashSet<String>,
    delivered_stacks: usize,
}

impl ConsoleHost {
    pub fn new(permissions: &PermissionSettings) -> Self {
        Self {
            operators: permissions.operators.iter().cloned().collect(),
            denied: permissions.denied.iter().cloned().collect(),
            delivered_stacks: 0,
        }
    }

    /// Number of item stacks handed out so far.
    pub fn delivered_stacks(&self) -> usize {
        self.delivered_stacks
    }
}

impl KitHost for ConsoleHost {
    fn has_capability(&self, player: &str, capability: &str) -> bool {
        if self.operators.contains(player) {
            return true;
        }
        capability == RECEIVE_CAPABILITY && !self.denied.contains(player)
    }

    fn deliver(&mut self, player: &str, items: &[KitItem]) -> Result<(), DeliveryError> {
        for item in items {
            info!(player, item = %item.name, count = item.count, "🎁 Delivered item stack");
        }
        self.delivered_stacks += items.len();
        Ok(())
    }

    fn notify(&mut self, player: &str, message: &str) {
        println!("[{player}] {message}");
    }
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Join(String),
    Command {
        sender: String,
        name: String,
        args: Vec<String>,
    },
    Status,
    Quit,
    Empty,
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(Self::Empty);
        };

        if let Some(name) = first.strip_prefix('/') {
            if name.is_empty() {
                return Err("missing command name after '/'".to_string());
            }
            return Ok(Self::Command {
                sender: CONSOLE_SENDER.to_string(),
                name: name.to_string(),
                args: words.map(str::to_string).collect(),
            });
        }

        match first.to_ascii_lowercase().as_str() {
            "join" => match (words.next(), words.next()) {
                (Some(player), None) => Ok(Self::Join(player.to_string())),
                _ => Err("usage: join <player>".to_string()),
            },
            "as" => match (words.next(), words.next()) {
                (Some(sender), Some(name)) => Ok(Self::Command {
                    sender: sender.to_string(),
                    name: name.trim_start_matches('/').to_string(),
                    args: words.map(str::to_string).collect(),
                }),
                _ => Err("usage: as <sender> <command> [args...]".to_string()),
            },
            "status" => Ok(Self::Status),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unrecognised input: {other}")),
        }
    }
}

/// Handles one console line.
pub fn dispatch(kits: &mut StarterKits, host: &mut ConsoleHost, line: &str) -> ControlFlow<()> {
    let input = match ConsoleInput::parse(line) {
        Ok(input) => input,
        Err(e) => {
            warn!("{}", e);
            return ControlFlow::Continue(());
        }
    };

    match input {
        ConsoleInput::Join(player) => {
            let outcome = handle_arrival(kits, host, &player);
            debug!("Arrival of {}: {:?}", player, outcome);
        }
        ConsoleInput::Command { sender, name, args } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let reply = handle_command(kits, host, &sender, &name, &args);
            host.notify(&sender, &reply.message());
        }
        ConsoleInput::Status => print_status(kits),
        ConsoleInput::Quit => return ControlFlow::Break(()),
        ConsoleInput::Empty => {}
    }
    ControlFlow::Continue(())
}

fn print_status(kits: &StarterKits) {
    println!("state: {:?}", kits.state());
    println!("data directory: {}", kits.data_dir().display());
    if let Some(kit) = kits.kit() {
        for item in kit.items() {
            println!("  {} x{}", item.name, item.count);
        }
    }
    if let Some(ledger) = kits.ledger() {
        println!("granted players: {}", ledger.len());
    }
}

/// Reads `reader` line by line on a dedicated OS thread.
///
/// Blocking reads on stdin cannot be cancelled, so they stay off the tokio
/// runtime; the thread is detached and never delays process exit.
pub fn spawn_line_reader<R>(reader: R) -> std::io::Result<mpsc::Receiver<std::io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::Builder::new()
        .name("kitd-console".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Handles lines until input closes, `quit`, or `shutdown` resolves.
pub async fn run<F>(
    kits: &mut StarterKits,
    host: &mut ConsoleHost,
    mut lines: mpsc::Receiver<std::io::Result<String>>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, leaving console loop");
                break;
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Console input closed");
                    break;
                };
                if dispatch(kits, host, &line?).is_break() {
                    break;
                }
            }
        }
    }
    Ok(())
}
