//! Persistence gateway contract for whole-tree load/save.
//!
//! # Responsibility
//! - Define the load/save boundary consumed by `TreeStore`.
//! - Degrade every storage failure into a logged, non-panicking result.
//!
//! # Invariants
//! - `load` returns an empty tree when nothing is stored or on failure.
//! - `save` never panics and never mutates the tree it is handed.

use crate::db::DbError;
use crate::model::tree::Tree;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result type used by persistence gateways.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors from gateway storage backends.
#[derive(Debug)]
pub enum GatewayError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// File-system failure.
    Io(std::io::Error),
    /// JSON encode/decode failure.
    Json(serde_json::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid tree.
    InvalidData(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "roadmap gateway requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "roadmap gateway requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid roadmap data: {message}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Durable storage for the roadmap tree.
///
/// Implementors provide the fallible `try_*` pair; callers use the
/// best-effort `load`/`save` wrappers.
pub trait PersistenceGateway: Send {
    /// Short backend label used in log events.
    fn backend(&self) -> &'static str;
    /// Reads the stored tree (empty when nothing is stored).
    fn try_load(&self) -> GatewayResult<Tree>;
    /// Replaces the stored tree.
    fn try_save(&self, tree: &Tree) -> GatewayResult<()>;

    /// Loads the stored tree, falling back to an empty tree on failure.
    fn load(&self) -> Tree {
        let started_at = Instant::now();
        match self.try_load() {
            Ok(tree) => {
                info!(
                    "event=roadmap_load module=repo status=ok backend={} nodes={} duration_ms={}",
                    self.backend(),
                    tree.node_count(),
                    started_at.elapsed().as_millis()
                );
                tree
            }
            Err(err) => {
                error!(
                    "event=roadmap_load module=repo status=error backend={} duration_ms={} error={}",
                    self.backend(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Tree::default()
            }
        }
    }

    /// Saves the tree; returns `false` on failure (logged).
    fn save(&self, tree: &Tree) -> bool {
        let started_at = Instant::now();
        match self.try_save(tree) {
            Ok(()) => {
                info!(
                    "event=roadmap_save module=repo status=ok backend={} nodes={} duration_ms={}",
                    self.backend(),
                    tree.node_count(),
                    started_at.elapsed().as_millis()
                );
                true
            }
            Err(err) => {
                error!(
                    "event=roadmap_save module=repo status=error backend={} duration_ms={} error={}",
                    self.backend(),
                    started_at.elapsed().as_millis(),
                    err
                );
                false
            }
        }
    }
}
