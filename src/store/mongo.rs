use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::ClientOptions;
use mongodb::sync::{Client, Database};

use super::Store;

/// MongoDB-backed implementation of the Store trait.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Create a new MongoStore by connecting to the given URI and database name.
    pub fn new(uri: &str, db_name: &str) -> Result<Self, String> {
        let client_options = ClientOptions::parse(uri).map_err(|e| e.to_string())?;
        let client = Client::with_options(client_options).map_err(|e| e.to_string())?;
        let db = client.database(db_name);
        Ok(Self { db })
    }

    /// Test connectivity by pinging the server.
    pub fn test_connection(&self) -> Result<(), String> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .map_err(|e| format!("MongoDB connection test failed: {}", e))?;
        Ok(())
    }
}

impl Store for MongoStore {
    fn run_migrations(&self) -> Result<(), String> {
        use mongodb::IndexModel;

        self.test_connection()?;
        let kv = self.db.collection::<Document>("kv");
        kv.create_index(
            IndexModel::builder()
                .keys(doc! { "key": 1 })
                .options(
                    mongodb::options::IndexOptions::builder()
                        .unique(true)
                        .build(),
                )
                .build(),
            None,
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "mongodb"
    }

    fn kv_get(&self, key: &str) -> Option<String> {
        let coll = self.db.collection::<Document>("kv");
        let d = coll.find_one(doc! { "key": key }, None).ok()??;
        d.get_str("value").ok().map(|s| s.to_string())
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), String> {
        let coll = self.db.collection::<Document>("kv");
        let opts = mongodb::options::UpdateOptions::builder()
            .upsert(true)
            .build();
        coll.update_one(
            doc! { "key": key },
            doc! { "$set": { "key": key, "value": value, "updated_at": DateTime::now() } },
            opts,
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<(), String> {
        let coll = self.db.collection::<Document>("kv");
        coll.delete_one(doc! { "key": key }, None)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn kv_keys(&self) -> Vec<String> {
        let coll = self.db.collection::<Document>("kv");
        let opts = mongodb::options::FindOptions::builder()
            .sort(doc! { "key": 1 })
            .projection(doc! { "key": 1 })
            .build();
        match coll.find(doc! {}, opts) {
            Ok(cursor) => cursor
                .filter_map(|r| r.ok())
                .filter_map(|d| d.get_str("key").ok().map(|s| s.to_string()))
                .collect(),
            Err(e) => {
                log::error!("[store] mongo kv_keys failed: {}", e);
                vec![]
            }
        }
    }
}
