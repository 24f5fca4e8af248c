//! Persisted set of players who already received their kit.
//!
//! The on-disk format is plain text, one identifier per line, rewritten in
//! full on every change. The set only grows while the process runs.

use crate::error::LedgerError;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Player identifiers that have been granted a kit, bound to a ledger file.
#[derive(Debug, Clone)]
pub struct GrantLedger {
    path: PathBuf,
    granted: BTreeSet<String>,
}

impl GrantLedger {
    /// Empty ledger bound to `path`; nothing is written until the first grant.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            granted: BTreeSet::new(),
        }
    }

    /// Reads the ledger at `path`.
    ///
    /// A file that does not exist yet yields an empty ledger. Blank lines
    /// and surrounding whitespace are ignored.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(path);
        if !ledger.path.exists() {
            debug!("Ledger {} not found, starting empty", ledger.path.display());
            return Ok(ledger);
        }

        let content = std::fs::read_to_string(&ledger.path).map_err(|source| LedgerError::Io {
            path: ledger.path.clone(),
            source,
        })?;

        ledger.granted = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        info!(
            "Loaded {} granted player(s) from {}",
            ledger.granted.len(),
            ledger.path.display()
        );
        Ok(ledger)
    }

    /// Writes an empty ledger file at `path` if none exists.
    pub fn create_if_missing(path: impl AsRef<Path>) -> Result<bool, LedgerError> {
        let path = path.as_ref();
        if path.is_file() {
            return Ok(false);
        }
        Self::new(path).save()?;
        info!("Created empty ledger: {}", path.display());
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.granted.contains(id)
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.granted.iter().map(String::as_str)
    }

    /// Records `id` and rewrites the ledger file.
    ///
    /// Returns `Ok(false)` without touching the disk when `id` is already
    /// recorded. If the rewrite fails the identifier stays in memory, so a
    /// later successful save will still persist it.
    pub fn grant(&mut self, id: &str) -> Result<bool, LedgerError> {
        validate_id(id)?;
        if !self.granted.insert(id.to_string()) {
            debug!("Player {} already granted, skipping", id);
            return Ok(false);
        }
        self.save()?;
        debug!("Recorded grant for {}", id);
        Ok(true)
    }

    /// Rewrites the whole ledger file from the in-memory set.
    ///
    /// Content goes to a sibling temporary file that then replaces the
    /// ledger, so readers never see a half-written file.
    pub fn save(&self) -> Result<(), LedgerError> {
        let io_err = |source: std::io::Error| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        for id in &self.granted {
            writeln!(tmp, "{id}").map_err(io_err)?;
        }
        let fresh = tmp.as_file().metadata().map_err(io_err)?.permissions();
        tmp.as_file()
            .set_permissions(ledger_permissions(&self.path, fresh))
            .map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// Permissions for the rewritten file: those of the current ledger, or
/// owner read-write plus world read for a fresh one.
fn ledger_permissions(path: &Path, fresh: std::fs::Permissions) -> std::fs::Permissions {
    if let Ok(metadata) = std::fs::metadata(path) {
        return metadata.permissions();
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fresh;
        std::fs::Permissions::from_mode(0o644)
    }

    #[cfg(not(unix))]
    {
        fresh
    }
}

fn validate_id(id: &str) -> Result<(), LedgerError> {
    if id.trim().is_empty() || id.trim() != id || id.contains(['\n', '\r']) {
        return Err(LedgerError::InvalidId(id.to_string()));
    }
    Ok(())
}
