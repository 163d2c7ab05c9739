//! Workspace-scoped key/value state on top of the `workspace_state` table.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DatabaseError};

/// Minimal key/value persistence consumed by the series store.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Removes `key`. Returns whether something was removed.
    fn delete(&self, key: &str) -> Result<bool, DatabaseError>;

    /// Lists all keys, sorted.
    fn list_keys(&self) -> Result<Vec<String>, DatabaseError>;
}

/// Key/value state of one workspace (one repository root).
#[derive(Debug, Clone)]
pub struct WorkspaceState {
    db: Database,
    workspace: String,
}

impl WorkspaceState {
    pub fn new(db: Database, workspace: impl Into<String>) -> Self {
        Self {
            db,
            workspace: workspace.into(),
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    fn query<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, DatabaseError> {
        let conn = self.db.lock()?;
        f(&conn).map_err(|source| DatabaseError::Query {
            workspace: self.workspace.clone(),
            source,
        })
    }
}

impl KeyValueStore for WorkspaceState {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.query(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM workspace_state WHERE workspace = ?1 AND key = ?2",
                    params![self.workspace, key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.query(|conn| {
            conn.execute(
                "INSERT INTO workspace_state (workspace, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (workspace, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![self.workspace, key, value, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        self.query(|conn| {
            let deleted = conn.execute(
                "DELETE FROM workspace_state WHERE workspace = ?1 AND key = ?2",
                params![self.workspace, key],
            )?;
            Ok(deleted > 0)
        })
    }

    fn list_keys(&self) -> Result<Vec<String>, DatabaseError> {
        self.query(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM workspace_state WHERE workspace = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map(params![self.workspace], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })
    }
}
