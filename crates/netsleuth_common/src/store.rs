//! Read-only failure catalog lookups.
//!
//! The `failures` table (`id, code, cause, resolution`) is populated
//! out-of-band from the vendor's failure catalog API by the builder utility.
//! The engine opens it read-only once per invocation and serves lookups from
//! memory, so detail-wave tasks can read concurrently without any locking.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::error::StoreError;
use crate::model::FailureDetail;

#[derive(Debug)]
pub struct FailureStore {
    entries: HashMap<i64, FailureDetail>,
}

impl FailureStore {
    /// Load the full catalog from the sqlite file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut stmt = conn.prepare("SELECT id, code, cause, resolution FROM failures")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                FailureDetail {
                    code: row.get(1)?,
                    cause: row.get(2)?,
                    resolution: row.get(3)?,
                },
            ))
        })?;

        let mut entries = HashMap::new();
        for row in rows {
            let (id, detail) = row?;
            entries.insert(id, detail);
        }

        info!(entries = entries.len(), "failure catalog loaded");

        Ok(Self { entries })
    }

    /// Build a store directly from entries. Used by tests and tools that
    /// bypass the sqlite file.
    pub fn from_entries(entries: impl IntoIterator<Item = (i64, FailureDetail)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Exact-id lookup. A miss means "no known cause", not an error.
    pub fn lookup(&self, id: i64) -> Option<&FailureDetail> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
