use rusqlite::params;

use crate::db::DbPool;

use super::Store;

/// SQLite-backed implementation of the Store trait.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new_at(path: &str) -> Result<Self, String> {
        let pool = crate::db::init_pool_at(path)?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn memory() -> Result<Self, String> {
        let pool = crate::db::init_memory_pool()?;
        Ok(Self { pool })
    }
}

impl Store for SqliteStore {
    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool)
    }

    fn backend_name(&self) -> &str {
        "sqlite"
    }

    fn kv_get(&self, key: &str) -> Option<String> {
        let conn = self.pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .ok()
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<(), String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn kv_keys(&self) -> Vec<String> {
        let conn = match self.pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT key FROM kv ORDER BY key") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], |row| row.get::<_, String>(0))
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }
}
