//! Backend selection and process-wide DAO registration.
//!
//! # Responsibility
//! - Turn a `DaoConfig` into exactly one concrete `ContactDao`.
//! - Offer an optional process-wide factory for callers without injection.
//!
//! # Invariants
//! - Backend names are matched case-insensitively; unknown names are rejected.
//! - The global factory is created at most once per process.
//! - Re-registration with a different config is rejected, never ignored.

use crate::dao::mem_dao::MemContactDao;
use crate::dao::sqlite_dao::SqliteContactDao;
use crate::dao::{ContactDao, StoreError, StoreResult};
use crate::service::contact_service::seed_samples;
use log::{error, info};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

static GLOBAL_FACTORY: OnceCell<DaoFactory> = OnceCell::new();

/// Storage backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-local map, lost at shutdown.
    Mem,
    /// SQLite database, file-backed or in-memory.
    Sqlite,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mem => "mem",
            Self::Sqlite => "sqlite",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = FactoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mem" | "memory" => Ok(Self::Mem),
            "jpa" | "sqlite" => Ok(Self::Sqlite),
            other => Err(FactoryError::UnknownBackend(other.to_string())),
        }
    }
}

/// Startup configuration that selects and parameterizes the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoConfig {
    pub backend: BackendKind,
    /// Database file for `BackendKind::Sqlite`. `None` keeps it in memory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Inserts the sample contacts after the backend opens.
    #[serde(default)]
    pub seed_samples: bool,
}

impl DaoConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            db_path: None,
            seed_samples: false,
        }
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_seed_samples(mut self, seed: bool) -> Self {
        self.seed_samples = seed;
        self
    }
}

/// Factory construction and registration errors.
#[derive(Debug)]
pub enum FactoryError {
    UnknownBackend(String),
    /// `init_global` was called again with a different config.
    AlreadyInitialized {
        active: BackendKind,
        requested: BackendKind,
    },
    Store(StoreError),
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(name) => {
                write!(f, "unknown backend `{name}`; expected mem|jpa|sqlite")
            }
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "dao factory already initialized with `{active}` config; refusing to switch to `{requested}`"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::UnknownBackend(_) | Self::AlreadyInitialized { .. } => None,
        }
    }
}

impl From<StoreError> for FactoryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Owns the single backend chosen for this process.
pub struct DaoFactory {
    config: DaoConfig,
    dao: Arc<dyn ContactDao>,
}

impl DaoFactory {
    /// Creates the backend described by `config`.
    ///
    /// # Errors
    /// - `FactoryError::Store` when the SQLite database cannot be opened or
    ///   sample seeding fails.
    pub fn open(config: DaoConfig) -> Result<Self, FactoryError> {
        let dao: Arc<dyn ContactDao> = match (config.backend, config.db_path.as_ref()) {
            (BackendKind::Mem, _) => Arc::new(MemContactDao::new()),
            (BackendKind::Sqlite, Some(path)) => Arc::new(SqliteContactDao::open(path)?),
            (BackendKind::Sqlite, None) => Arc::new(SqliteContactDao::open_in_memory()?),
        };

        if config.seed_samples {
            let inserted = seed_samples(dao.as_ref())?;
            info!("event=dao_seed module=factory status=ok inserted={inserted}");
        }

        info!(
            "event=dao_factory_open module=factory status=ok backend={} persistent_file={}",
            config.backend,
            config.db_path.is_some()
        );
        Ok(Self { config, dao })
    }

    /// Resolves a backend by name and opens it with default settings.
    pub fn open_named(backend: &str) -> Result<Self, FactoryError> {
        Self::open(DaoConfig::new(backend.parse()?))
    }

    pub fn backend(&self) -> BackendKind {
        self.config.backend
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    /// Returns the shared contact DAO.
    pub fn contact_dao(&self) -> Arc<dyn ContactDao> {
        Arc::clone(&self.dao)
    }

    /// Releases backend resources. Safe to call more than once.
    pub fn shutdown(&self) -> StoreResult<()> {
        match self.dao.shutdown() {
            Ok(()) => {
                info!(
                    "event=dao_factory_shutdown module=factory status=ok backend={}",
                    self.config.backend
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=dao_factory_shutdown module=factory status=error backend={} error={}",
                    self.config.backend, err
                );
                Err(err)
            }
        }
    }
}

/// Installs the process-wide factory, or returns the installed one.
///
/// Concurrent first calls race on a single cell, so exactly one backend is
/// created.
///
/// # Errors
/// - `FactoryError::AlreadyInitialized` when a factory with a different
///   config is already installed.
/// - Any error from `DaoFactory::open` on first installation.
pub fn init_global(config: DaoConfig) -> Result<&'static DaoFactory, FactoryError> {
    let factory = GLOBAL_FACTORY.get_or_try_init(|| DaoFactory::open(config.clone()))?;
    if factory.config != config {
        return Err(FactoryError::AlreadyInitialized {
            active: factory.config.backend,
            requested: config.backend,
        });
    }
    Ok(factory)
}

/// Returns the process-wide factory when `init_global` has succeeded.
pub fn global() -> Option<&'static DaoFactory> {
    GLOBAL_FACTORY.get()
}
