//! Persistent input history.
//!
//! History lives in a small JSON document next to the working directory. The
//! document is a flat object; submitted lines are kept under the `history` key
//! as an array of strings, oldest first. Other keys are carried through
//! untouched.
//!
//! Changes are written back on a debounce timer so that a burst of updates
//! turns into a single write, and [`HistoryStore::save`] flushes immediately.
//! Every write goes through a temporary sibling file that is renamed into
//! place, so the document on disk is always either the old or the new version.

use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::task::JoinHandle;

/// Key under which submitted lines are stored.
pub const HISTORY_KEY: &str = "history";

/// Default number of lines retained.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Default delay between a change and the write it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode history document: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
struct State {
    document: Map<String, Value>,
    saves: usize,
}

/// Loads and saves the history document.
pub struct HistoryStore {
    path: PathBuf,
    debounce: Duration,
    state: Arc<Mutex<State>>,
    timer: Option<JoinHandle<()>>,
}

impl HistoryStore {
    /// Open the store at `path` and load whatever it currently holds.
    pub fn open(path: impl Into<PathBuf>, debounce: Duration) -> Self {
        let mut store = Self {
            path: path.into(),
            debounce,
            state: Arc::default(),
            timer: None,
        };

        store.load();
        store
    }

    /// Number of times the document has been written by this store.
    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Replace the in-memory document with the file contents.
    ///
    /// A missing or unreadable file leaves an empty document.
    pub fn load(&mut self) {
        let document = match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(document)) => document,
                Ok(_) => {
                    log::warn!("{} does not hold an object, ignoring it", self.path.display());
                    Map::new()
                }
                Err(e) => {
                    log::warn!("{} is corrupt, ignoring it: {}", self.path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no history at {}", self.path.display());
                Map::new()
            }
            Err(e) => {
                log::warn!("failed to read {}: {}", self.path.display(), e);
                Map::new()
            }
        };

        self.lock().document = document;
    }

    /// Get the list of lines stored under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        match self.lock().document.get(key)? {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(String::from))
                .collect(),
            _ => None,
        }
    }

    /// Store `lines` under `key` and schedule a write.
    pub fn set(&mut self, key: &str, lines: Vec<String>) {
        let value = Value::Array(lines.into_iter().map(Value::String).collect());
        self.lock().document.insert(key.to_owned(), value);
        self.schedule_save();
    }

    /// Append `line` to the list under `key`, keeping only the `limit` most
    /// recent entries.
    ///
    /// Blank lines and a repeat of the last entry are not recorded.
    pub fn push(&mut self, key: &str, line: &str, limit: usize) {
        if line.trim().is_empty() {
            return;
        }

        let mut lines = self.get(key).unwrap_or_default();

        if lines.last().map(String::as_str) == Some(line) {
            return;
        }

        lines.push(line.to_owned());

        if lines.len() > limit {
            lines.drain(..lines.len() - limit);
        }

        self.set(key, lines);
    }

    /// Write the document now, cancelling any pending debounced write.
    pub fn save(&mut self) -> Result<(), HistoryError> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        write_document(&self.path, &mut self.lock())
    }

    /// Arrange for the document to be written once no change has been made for
    /// the debounce delay.
    ///
    /// Each request restarts the delay, so a burst of changes is written once.
    fn schedule_save(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                if let Err(e) = self.save() {
                    log::warn!("{}", e);
                }
                return;
            }
        };

        let path = self.path.clone();
        let state = self.state.clone();
        let debounce = self.debounce;

        self.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(debounce).await;

            if let Err(e) = write_document(&path, &mut lock(&state)) {
                log::warn!("{}", e);
            }
        }));
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_document(path: &Path, state: &mut State) -> Result<(), HistoryError> {
    let contents = serde_json::to_string_pretty(&state.document)?;

    let write_error = |source| HistoryError::Write {
        path: path.to_owned(),
        source,
    };

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, contents).map_err(write_error)?;
    fs::rename(&temp, path).map_err(write_error)?;

    state.saves += 1;
    log::debug!("saved history to {}", path.display());

    Ok(())
}
