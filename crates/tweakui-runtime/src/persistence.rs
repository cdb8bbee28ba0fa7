#![forbid(unsafe_code)]

//! Saving and restoring control values across sessions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     PersistenceBridge                         │
//! │   - ValueSnapshot <-> bytes (JsonCodec)                       │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      StorageBackend                           │
//! │   - named save files: list / read / write / remove            │
//! │   - MemoryStorage: in-memory (tests, ephemeral hosts)         │
//! │   - FileStorage: one `<name>.json` per save in a directory    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only values are stored. Structure is rebuilt by the host's declarations
//! on the next run, so a snapshot may name paths that do not exist yet.
//!
//! # Design Invariants
//!
//! 1. **Graceful degradation**: storage failures never panic; operations
//!    return `Result`.
//! 2. **Atomic writes**: file storage writes a temp file and renames it.
//! 3. **Partial load tolerance**: an entry that fails to decode is skipped
//!    and logged; the rest of the snapshot still loads.
//! 4. **Deterministic output**: snapshots are ordered by path.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Returned |
//! | `StorageError::Serialization` | JSON encode failure | Returned |
//! | `StorageError::Corruption` | Blob is not a save file | Returned, nothing applied |
//! | `StorageError::NotFound` | Unknown save name | Returned |
//! | Bad entry | Unknown value shape | Entry skipped, logged |
//! | Version mismatch | File from another format | Empty snapshot, logged |

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tweakui_tree::{NodeTree, NodeValue};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during save and load.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Encoding a snapshot failed.
    Serialization(String),
    /// The stored blob is not a readable save file.
    Corruption(String),
    /// No save with this name exists.
    NotFound(String),
    /// The save name cannot be used as a file name.
    InvalidName(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            StorageError::NotFound(name) => write!(f, "no save named {name:?}"),
            StorageError::InvalidName(name) => write!(f, "invalid save name {name:?}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(_)
            | StorageError::Corruption(_)
            | StorageError::NotFound(_)
            | StorageError::InvalidName(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots and codec
// ─────────────────────────────────────────────────────────────────────────────

/// Flat mapping from canonical path text to value.
pub type ValueSnapshot = BTreeMap<String, NodeValue>;

/// Collect every persisted value in the tree.
///
/// Folders, buttons, transient entries and all layout and interaction
/// state are left out.
#[must_use]
pub fn snapshot_values(tree: &NodeTree) -> ValueSnapshot {
    tree.persisted_values()
        .map(|(path, value)| (path.to_string(), value))
        .collect()
}

/// Converts snapshots to and from bytes.
pub trait PersistenceBridge: Send + Sync {
    fn serialize(&self, snapshot: &ValueSnapshot) -> StorageResult<Vec<u8>>;

    /// Decode a blob. Undecodable entries are skipped, not fatal.
    fn deserialize(&self, bytes: &[u8]) -> StorageResult<ValueSnapshot>;
}

/// Current save file format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SaveFileOut<'a> {
    format_version: u32,
    values: &'a ValueSnapshot,
}

#[derive(Deserialize)]
struct SaveFileIn {
    format_version: u32,
    #[serde(default)]
    values: BTreeMap<String, serde_json::Value>,
}

/// JSON save format.
///
/// ```json
/// {
///   "format_version": 1,
///   "values": {
///     "/fx/speed": { "type": "float", "value": 7.0 },
///     "/fx/enabled": { "type": "bool", "value": true }
///   }
/// }
/// ```
///
/// Hand-edited files may write bare numbers and booleans
/// (`"/fx/speed": 7`); they decode as `float` and `bool`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent output for readable files.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

fn decode_entry(raw: serde_json::Value) -> Result<NodeValue, serde_json::Error> {
    match raw {
        serde_json::Value::Bool(b) => Ok(NodeValue::Bool(b)),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(|v| NodeValue::Float(v as f32))
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        other => serde_json::from_value(other),
    }
}

impl PersistenceBridge for JsonCodec {
    fn serialize(&self, snapshot: &ValueSnapshot) -> StorageResult<Vec<u8>> {
        let file = SaveFileOut {
            format_version: FORMAT_VERSION,
            values: snapshot,
        };
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(&file)
        } else {
            serde_json::to_vec(&file)
        };
        encoded.map_err(|e| StorageError::Serialization(format!("failed to encode save: {e}")))
    }

    fn deserialize(&self, bytes: &[u8]) -> StorageResult<ValueSnapshot> {
        let file: SaveFileIn = serde_json::from_slice(bytes)
            .map_err(|e| StorageError::Corruption(format!("failed to parse save file: {e}")))?;

        if file.format_version != FORMAT_VERSION {
            tracing::warn!(
                stored = file.format_version,
                expected = FORMAT_VERSION,
                "save file format version mismatch, ignoring stored values"
            );
            return Ok(ValueSnapshot::new());
        }

        let mut snapshot = ValueSnapshot::new();
        for (path, raw) in file.values {
            match decode_entry(raw) {
                Ok(value) => {
                    snapshot.insert(path, value);
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "failed to decode saved value, skipping");
                }
            }
        }
        Ok(snapshot)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Listing entry for one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveInfo {
    pub name: String,
    pub modified: SystemTime,
}

/// Pluggable store of named save blobs.
///
/// Implementations must be `Send + Sync`.
///
/// # Implementation Notes
///
/// - `list` returns oldest first; the last entry is the most recent save.
/// - `write` replaces an existing save of the same name atomically.
pub trait StorageBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn list(&self) -> StorageResult<Vec<SaveInfo>>;

    /// Fails with `NotFound` for unknown names.
    fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    fn write(&self, name: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Returns whether a save was removed.
    fn remove(&self, name: &str) -> StorageResult<bool>;

    /// Most recent save, if any.
    fn latest(&self) -> StorageResult<Option<SaveInfo>> {
        Ok(self.list()?.pop())
    }
}

/// Save names become file names; keep them to a single plain component.
fn validate_name(name: &str) -> StorageResult<()> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::InvalidName(name.to_owned()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryEntry {
    name: String,
    bytes: Vec<u8>,
    modified: SystemTime,
}

/// In-memory storage for tests and hosts without a writable disk.
///
/// Saves are ordered by last write.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<Vec<MemoryEntry>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StorageError {
        StorageError::Corruption("lock poisoned".into())
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn list(&self) -> StorageResult<Vec<SaveInfo>> {
        let guard = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(guard
            .iter()
            .map(|e| SaveInfo {
                name: e.name.clone(),
                modified: e.modified,
            })
            .collect())
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let guard = self.entries.read().map_err(|_| Self::poisoned())?;
        guard
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(name.to_owned()))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_name(name)?;
        let mut guard = self.entries.write().map_err(|_| Self::poisoned())?;
        guard.retain(|e| e.name != name);
        guard.push(MemoryEntry {
            name: name.to_owned(),
            bytes: bytes.to_vec(),
            modified: SystemTime::now(),
        });
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<bool> {
        let mut guard = self.entries.write().map_err(|_| Self::poisoned())?;
        let before = guard.len();
        guard.retain(|e| e.name != name);
        Ok(guard.len() != before)
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.entries.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("saves", &count)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Storage
// ─────────────────────────────────────────────────────────────────────────────

const SAVE_EXTENSION: &str = "json";

/// Directory of save files, one `<name>.json` each.
///
/// # Atomic Writes
///
/// 1. Write to `.{name}.json.tmp`
/// 2. Flush and sync
/// 3. Rename over `{name}.json`
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Storage at `$XDG_STATE_HOME/tweakui/{app_name}/saves`, falling back
    /// to `~/.local/state` and then the current directory.
    #[must_use]
    pub fn default_for_app(app_name: &str) -> Self {
        let dir = state_dir_or_fallback()
            .join("tweakui")
            .join(app_name)
            .join("saves");
        Self { dir }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SAVE_EXTENSION}"))
    }

    fn temp_path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{name}.{SAVE_EXTENSION}.tmp"))
    }
}

fn state_dir_or_fallback() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("state");
    }
    PathBuf::from(".")
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &str {
        "FileStorage"
    }

    fn list(&self) -> StorageResult<Vec<SaveInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut saves = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot stat save file, skipping");
                    continue;
                }
            };
            saves.push(SaveInfo {
                name: name.to_owned(),
                modified,
            });
        }
        saves.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(saves)
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        validate_name(name)?;
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        validate_name(name)?;
        fs::create_dir_all(&self.dir)?;

        let tmp_path = self.temp_path_for(name);
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        let path = self.path_for(name);
        fs::rename(&tmp_path, &path)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote save file");
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<bool> {
        validate_name(name)?;
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStorage")
            .field("dir", &self.dir)
            .finish()
    }
}
