#![deny(warnings)]

//! Persistence layer: single-document JSON storage and lock-scoped
//! transactions.
//!
//! Every transaction takes one exclusive lock, loads the document, runs a
//! synchronous closure against it and writes it back before the lock is
//! released. The closure decides what gets persisted through its return
//! value:
//! - `Ok(v)` saves and yields [`Outcome::Committed`]
//! - `Err(TxError::Rejected(r))` discards the mutation ([`Outcome::Rejected`])
//! - `Err(TxError::Internal(e))` saves whatever was mutated, then yields
//!   [`Outcome::Failed`]

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Default location of the save document.
pub fn default_data_path() -> &'static str {
    "./data/db.json"
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store poisoned")]
    Poisoned,
}

/// Backing storage for one document.
pub trait Store<T>: Send + Sync {
    fn load(&self) -> Result<T, StoreError>;
    fn save(&self, doc: &T) -> Result<(), StoreError>;
}

/// Pretty-printed JSON file. Missing or empty files load as the default
/// document; saves go through a temporary sibling and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> Store<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "no save document yet, starting empty");
                return Ok(T::default());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, doc: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let text = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

/// In-memory store holding the serialized document, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: StdMutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing document.
    pub fn with_document<T: Serialize>(doc: &T) -> Result<Self, StoreError> {
        let text = serde_json::to_string(doc).map_err(|source| StoreError::Json {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        Ok(Self {
            text: StdMutex::new(Some(text)),
            saves: AtomicUsize::new(0),
        })
    }

    /// Number of completed saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<T> Store<T> for MemoryStore
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T, StoreError> {
        let guard = self.text.lock().map_err(|_| StoreError::Poisoned)?;
        match guard.as_deref() {
            Some(text) => serde_json::from_str(text).map_err(|source| StoreError::Json {
                path: PathBuf::from("<memory>"),
                source,
            }),
            None => Ok(T::default()),
        }
    }

    fn save(&self, doc: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string(doc).map_err(|source| StoreError::Json {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        *self.text.lock().map_err(|_| StoreError::Poisoned)? = Some(text);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Error returned from a transaction closure.
#[derive(Debug)]
pub enum TxError<R> {
    /// Abort and discard every mutation made in the transaction.
    Rejected(R),
    /// Unexpected failure; the partial mutation is still persisted.
    Internal(anyhow::Error),
}

/// Result of a transaction.
#[derive(Debug)]
pub enum Outcome<T, R> {
    Committed(T),
    Rejected(R),
    Failed(anyhow::Error),
}

impl<T, R> Outcome<T, R> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed(_))
    }

    /// Split into a rejection-aware result, surfacing failures as errors.
    pub fn into_result(self) -> anyhow::Result<Result<T, R>> {
        match self {
            Outcome::Committed(v) => Ok(Ok(v)),
            Outcome::Rejected(r) => Ok(Err(r)),
            Outcome::Failed(e) => Err(e),
        }
    }
}

/// Run blocking store I/O. On a multi-threaded runtime the worker hands its
/// other tasks off first so timers keep firing during a slow disk.
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(h) if h.runtime_flavor() == RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => f(),
    }
}

/// Lock-guarded document database.
///
/// Lock acquisition has no timeout: a stuck holder stalls every caller.
pub struct Database<T, S> {
    store: S,
    lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T, S> Database<T, S>
where
    S: Store<T>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` under the exclusive lock with load-on-enter, save-on-exit.
    pub async fn transact<F, V, R>(&self, f: F) -> Outcome<V, R>
    where
        F: FnOnce(&mut T) -> Result<V, TxError<R>>,
    {
        let _guard = self.lock.lock().await;
        let mut doc = match blocking(|| self.store.load()) {
            Ok(doc) => doc,
            Err(e) => return Outcome::Failed(anyhow::Error::new(e).context("loading document")),
        };
        match f(&mut doc) {
            Ok(value) => match blocking(|| self.store.save(&doc)) {
                Ok(()) => {
                    debug!("transaction committed");
                    Outcome::Committed(value)
                }
                Err(e) => Outcome::Failed(anyhow::Error::new(e).context("saving document")),
            },
            Err(TxError::Rejected(r)) => {
                debug!("transaction rejected, mutation discarded");
                Outcome::Rejected(r)
            }
            Err(TxError::Internal(e)) => {
                if let Err(save_err) = blocking(|| self.store.save(&doc)) {
                    error!(error = %save_err, "saving partial mutation failed");
                }
                error!(error = %e, "transaction failed, partial mutation persisted");
                Outcome::Failed(e)
            }
        }
    }

    /// Read a snapshot under the same lock without writing back.
    pub async fn read<F, V>(&self, f: F) -> Result<V, StoreError>
    where
        F: FnOnce(&T) -> V,
    {
        let _guard = self.lock.lock().await;
        let doc = blocking(|| self.store.load())?;
        Ok(f(&doc))
    }
}
