//! File-backed store.
//!
//! Layout under the data directory:
//! ```text
//! <data_dir>/
//! ├── items/<itemId>.json    # One file per item
//! ├── clock.jsonl            # Append-only dwell clock log
//! └── configs/<configId>.yaml
//! ```
//!
//! Writes go through a process-wide lock, so the version check in `set` and
//! the rewrite of `clock.jsonl` are atomic with respect to this store. Whole
//! files are replaced by writing a sibling temp file and renaming it, so
//! readers never see a partial item or configuration. Two processes sharing
//! a data directory are not coordinated.
//!
//! Item ids are case-sensitive, as in [`MemoryStore`](crate::MemoryStore).
//! Upper-case letters are escaped in file names so `X` and `x` stay distinct
//! on case-insensitive filesystems.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use prodline_core::{
    ClockEntry, ClockStore, ConfigStore, ItemStore, LineConfiguration, LineError, LineItem,
    LineResult,
};

const ITEMS_DIR: &str = "items";
const CONFIGS_DIR: &str = "configs";
const CLOCK_FILE: &str = "clock.jsonl";
const TEMP_SUFFIX: &str = "tmp";

/// Store that keeps everything as files under one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Open a store rooted at `root`, creating its directories if needed.
    pub fn open(root: impl AsRef<Path>) -> LineResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ITEMS_DIR))?;
        fs::create_dir_all(root.join(CONFIGS_DIR))?;
        debug!("Opened file store at {:?}", root);

        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, item_id: &str) -> PathBuf {
        self.root
            .join(ITEMS_DIR)
            .join(format!("{}.json", file_stem(item_id)))
    }

    fn config_path(&self, config_id: &str) -> PathBuf {
        self.root
            .join(CONFIGS_DIR)
            .join(format!("{}.yaml", file_stem(config_id)))
    }

    fn clock_path(&self) -> PathBuf {
        self.root.join(CLOCK_FILE)
    }

    fn read_item(&self, item_id: &str) -> LineResult<Option<LineItem>> {
        let path = self.item_path(item_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write_item(&self, item: &LineItem) -> LineResult<()> {
        let content = serde_json::to_string_pretty(item)?;
        replace_file(&self.item_path(&item.id), content.as_bytes())
    }

    /// Read the clock log. Callers hold the write lock so an in-flight
    /// append is never seen half-written.
    fn read_clock(&self) -> LineResult<Vec<ClockEntry>> {
        let path = self.clock_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }
}

/// Write `content` to a temp file next to `path`, then rename it over `path`.
fn replace_file(path: &Path, content: &[u8]) -> LineResult<()> {
    let temp = path.with_extension(TEMP_SUFFIX);
    {
        let mut file = File::create(&temp)?;
        file.write_all(content)?;
        file.sync_all()?;
    }
    fs::rename(&temp, path)?;
    Ok(())
}

/// Map an id onto a safe file name. Characters outside `[a-z0-9_.-]` are
/// hex-escaped so ids cannot escape the store directory and ids differing
/// only in case never share a file.
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for c in id.chars() {
        let plain = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';
        if plain || (c == '.' && !stem.is_empty()) {
            stem.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    stem
}

#[async_trait]
impl ItemStore for FileStore {
    async fn get(&self, item_id: &str) -> LineResult<Option<LineItem>> {
        self.read_item(item_id)
    }

    async fn insert(&self, item: &LineItem) -> LineResult<()> {
        let _guard = self.write_lock.lock();
        if self.item_path(&item.id).exists() {
            return Err(LineError::ItemExists(item.id.clone()));
        }
        self.write_item(item)
    }

    async fn set(&self, item: &LineItem, expected_version: u64) -> LineResult<()> {
        let _guard = self.write_lock.lock();
        let stored = self
            .read_item(&item.id)?
            .ok_or_else(|| LineError::ItemNotFound(item.id.clone()))?;

        if stored.version != expected_version {
            return Err(LineError::VersionConflict {
                item: item.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }

        self.write_item(item)?;
        debug!("Wrote {} at version {}", item.id, item.version);
        Ok(())
    }

    async fn delete(&self, item_id: &str) -> LineResult<bool> {
        let _guard = self.write_lock.lock();
        let path = self.item_path(item_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    async fn list(&self) -> LineResult<Vec<LineItem>> {
        let mut items = Vec::new();

        for entry in WalkDir::new(self.root.join(ITEMS_DIR))
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
        {
            let content = fs::read_to_string(entry.path())?;
            match serde_json::from_str::<LineItem>(&content) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping unreadable item file {:?}: {}", entry.path(), e),
            }
        }

        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }
}

#[async_trait]
impl ClockStore for FileStore {
    async fn append(&self, entry: &ClockEntry) -> LineResult<()> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.clock_path())?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    async fn entries_for(&self, item_id: &str) -> LineResult<Vec<ClockEntry>> {
        let _guard = self.write_lock.lock();
        Ok(self
            .read_clock()?
            .into_iter()
            .filter(|e| e.item_id == item_id)
            .collect())
    }

    async fn delete_all(&self, item_id: &str) -> LineResult<usize> {
        let _guard = self.write_lock.lock();
        let entries = self.read_clock()?;
        let before = entries.len();
        let kept: Vec<ClockEntry> = entries.into_iter().filter(|e| e.item_id != item_id).collect();
        let removed = before - kept.len();

        if removed > 0 {
            let mut content = String::new();
            for entry in &kept {
                content.push_str(&serde_json::to_string(entry)?);
                content.push('\n');
            }
            replace_file(&self.clock_path(), content.as_bytes())?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn load_configuration(&self, config_id: &str) -> LineResult<Option<LineConfiguration>> {
        let path = self.config_path(config_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(LineConfiguration::from_yaml(&content)?))
    }

    async fn write_configuration(&self, config_id: &str, configuration: &LineConfiguration) -> LineResult<()> {
        let _guard = self.write_lock.lock();
        replace_file(&self.config_path(config_id), configuration.to_yaml()?.as_bytes())?;
        debug!("Wrote configuration {}", config_id);
        Ok(())
    }
}
