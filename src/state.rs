//! Application state shared by every request handler.

use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::config::ServerConfig;
use crate::db::{self, DatabaseError};
use crate::notify::Notifier;

pub struct AppState {
    pub config: ServerConfig,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: ServerConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Open a connection for one unit of work. Migrations are applied at
    /// startup, not here.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_connection(&self.config.db_path)
    }

    /// Wall-clock time used for "today", timestamps and session expiry.
    pub fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
