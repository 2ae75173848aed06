/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! SQLite connection management.
//!
//! This module provides an async connection pool implementation using
//! `deadpool-diesel` for managing database connections. Connection strings
//! are file paths, `sqlite://` URLs, or `:memory:` for in-memory databases.

use deadpool_diesel::sqlite::{Manager, Pool, Runtime};
use tracing::info;

/// Represents a pool of SQLite database connections.
///
/// The `Database` struct is `Clone` and can be safely shared between tasks.
/// Each clone references the same underlying connection pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database(sqlite)")
    }
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - A file path, `sqlite://` URL, or `:memory:`
    ///
    /// # Panics
    ///
    /// Panics if the connection pool cannot be created.
    pub fn new(connection_string: &str) -> Self {
        let connection_url = Self::build_sqlite_url(connection_string);
        let manager = Manager::new(connection_url, Runtime::Tokio1);
        // SQLite has limited concurrent write support even with WAL mode.
        // Using a single connection avoids "database is locked" errors.
        let pool_size = 1;
        let pool = Pool::builder(manager)
            .max_size(pool_size)
            .build()
            .expect("Failed to create SQLite connection pool");

        info!("SQLite connection pool initialized (size: {})", pool_size);

        Self { pool }
    }

    /// Gets a connection from the pool.
    pub async fn get_connection(
        &self,
    ) -> Result<
        deadpool::managed::Object<Manager>,
        deadpool::managed::PoolError<deadpool_diesel::Error>,
    > {
        self.pool.get().await
    }

    /// Builds a SQLite connection URL.
    fn build_sqlite_url(connection_string: &str) -> String {
        // Strip sqlite:// prefix if present
        if let Some(path) = connection_string.strip_prefix("sqlite://") {
            path.to_string()
        } else {
            connection_string.to_string()
        }
    }

    /// Runs pending database migrations.
    ///
    /// Also sets the WAL and busy_timeout pragmas so readers are not blocked
    /// during writes and lock contention waits instead of failing.
    pub async fn run_migrations(&self) -> Result<(), String> {
        let conn = self.pool.get().await.map_err(|e| e.to_string())?;
        conn.interact(|conn| {
            use diesel::prelude::*;
            use diesel_migrations::MigrationHarness;

            diesel::sql_query("PRAGMA journal_mode=WAL;")
                .execute(conn)
                .map_err(|e| format!("Failed to set WAL mode: {}", e))?;
            diesel::sql_query("PRAGMA busy_timeout=30000;")
                .execute(conn)
                .map_err(|e| format!("Failed to set busy_timeout: {}", e))?;
            diesel::sql_query("PRAGMA foreign_keys=ON;")
                .execute(conn)
                .map_err(|e| format!("Failed to enable foreign keys: {}", e))?;

            conn.run_pending_migrations(crate::database::MIGRATIONS)
                .map(|_| ())
                .map_err(|e| format!("Failed to run migrations: {}", e))
        })
        .await
        .map_err(|e| format!("Failed to run migrations: {}", e))?
    }
}
