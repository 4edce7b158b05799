//! Shared application state.
//!
//! Handlers open one SQLite connection per request through
//! [`CoreState::open_db`]; the only long-lived shared pieces are the hospital
//! change feed and the database path.

use std::path::{Path, PathBuf};

use crate::db;
use crate::realtime::HospitalFeed;

pub struct CoreState {
    db_path: PathBuf,
    hospital_feed: HospitalFeed,
}

impl CoreState {
    /// Create the data directory if needed and run migrations once up front,
    /// so per-request opens never race on schema creation.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::DataDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        db::open_database(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database ready");
        Ok(Self {
            db_path,
            hospital_feed: HospitalFeed::default(),
        })
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn hospital_feed(&self) -> &HospitalFeed {
        &self.hospital_feed
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
