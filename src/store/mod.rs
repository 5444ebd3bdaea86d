pub mod mongo;
pub mod sqlite;

use std::sync::Arc;

use crate::config::SiteConfig;

/// Key/value persistence for the site. Every write goes through here.
/// Implementations: `SqliteStore` (rusqlite/r2d2) and `MongoStore` (mongodb).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn backend_name(&self) -> &str;

    // ── Key/value ───────────────────────────────────────────────────
    fn kv_get(&self, key: &str) -> Option<String>;
    fn kv_set(&self, key: &str, value: &str) -> Result<(), String>;
    fn kv_delete(&self, key: &str) -> Result<(), String>;
    fn kv_keys(&self) -> Vec<String>;
}

/// Open the store selected by `site.store` and apply migrations.
pub fn open(cfg: &SiteConfig) -> Result<Arc<dyn Store>, String> {
    let store: Arc<dyn Store> = match cfg.store.as_str() {
        "mongo" | "mongodb" => Arc::new(mongo::MongoStore::new(&cfg.mongo_uri, &cfg.mongo_db)?),
        "sqlite" => Arc::new(sqlite::SqliteStore::new_at(&cfg.sqlite_path)?),
        other => return Err(format!("Unknown store backend: {}", other)),
    };
    store.run_migrations()?;
    log::info!("[store] Using {} backend", store.backend_name());
    Ok(store)
}
