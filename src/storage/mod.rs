//! Object-storage buckets for uploaded images.
//!
//! Backends implement [`MediaStorage`]; the upload/delete helpers below hold the
//! shared behaviour (validation, object naming, the one-shot "create the bucket
//! and retry" fallback) so every backend acts the same.

pub mod local;
pub mod supabase;

use std::sync::Arc;

use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("invalid object name: {0}")]
    InvalidName(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("storage rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

pub trait MediaStorage: Send + Sync {
    fn backend_name(&self) -> &str;
    /// Write an object, overwriting any existing object with the same key.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;
    fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;
    fn list_buckets(&self) -> Result<Vec<String>, StorageError>;
    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
    fn public_url(&self, bucket: &str, key: &str) -> String;
    /// Whether a URL points into this storage (only those are deleted on item removal).
    fn owns_url(&self, url: &str) -> bool;
}

/// An uploaded file as received from a form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Build the backend selected by `storage.backend`.
pub fn open(cfg: &StorageConfig) -> Result<Arc<dyn MediaStorage>, String> {
    match cfg.backend.as_str() {
        "local" => Ok(Arc::new(local::LocalBucket::new(
            &cfg.local_root,
            &cfg.public_base,
        ))),
        "supabase" => {
            if cfg.supabase_url.is_empty() || cfg.supabase_key.is_empty() {
                return Err("Supabase storage selected but supabase_url/supabase_key not set".into());
            }
            Ok(Arc::new(supabase::SupabaseBucket::new(
                &cfg.supabase_url,
                &cfg.supabase_key,
            )))
        }
        other => Err(format!("Unknown storage backend: {}", other)),
    }
}

/// Bucket and object names must be a single, plain path segment.
pub(crate) fn is_safe_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn extension_for(upload: &Upload) -> String {
    let from_name = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    from_name
        .or_else(|| {
            image::guess_format(&upload.bytes)
                .ok()
                .and_then(|f| f.extensions_str().first().map(|e| e.to_string()))
        })
        .unwrap_or_else(|| "jpg".to_string())
}

/// Short random object key: 8 hex chars of a v4 UUID plus the extension.
pub fn object_key(upload: &Upload) -> String {
    let uid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}.{}", &uid[..8], extension_for(upload))
}

/// Reject anything that is not an image. Raster images must also look like one.
fn check_upload(upload: &Upload, max_bytes: u64) -> Result<(), String> {
    if upload.bytes.is_empty() {
        return Err("No file provided".into());
    }
    if upload.bytes.len() as u64 > max_bytes {
        return Err(format!(
            "File too large ({} bytes), max size is {} MB",
            upload.bytes.len(),
            max_bytes / (1024 * 1024)
        ));
    }
    let ct = upload.content_type.to_lowercase();
    if !ct.starts_with("image/") {
        return Err(format!("File is not an image ({})", upload.content_type));
    }
    if ct != "image/svg+xml" && image::guess_format(&upload.bytes).is_err() {
        return Err(format!("{} does not contain image data", upload.file_name));
    }
    Ok(())
}

/// Upload an image and return its public URL, or None on any failure.
/// A missing bucket is created once and the upload retried once.
pub fn upload_file(
    storage: &dyn MediaStorage,
    upload: &Upload,
    bucket: &str,
    max_bytes: u64,
) -> Option<String> {
    if let Err(e) = check_upload(upload, max_bytes) {
        log::error!("[storage] Upload rejected: {}", e);
        return None;
    }

    let key = object_key(upload);
    log::info!(
        "[storage] Uploading {} ({} bytes) to bucket {} as {}",
        upload.file_name,
        upload.bytes.len(),
        bucket,
        key
    );

    match storage.put_object(bucket, &key, &upload.bytes, &upload.content_type) {
        Ok(()) => {}
        Err(StorageError::BucketNotFound(_)) => {
            log::warn!("[storage] Bucket {} missing, creating it", bucket);
            if let Err(e) = storage.create_bucket(bucket) {
                log::error!("[storage] Could not create bucket {}: {}", bucket, e);
                return None;
            }
            if let Err(e) = storage.put_object(bucket, &key, &upload.bytes, &upload.content_type) {
                log::error!("[storage] Upload still failing after creating bucket: {}", e);
                return None;
            }
        }
        Err(e) => {
            log::error!("[storage] Upload to {} failed: {}", bucket, e);
            return None;
        }
    }

    let url = storage.public_url(bucket, &key);
    log::info!("[storage] Public URL: {}", url);
    Some(url)
}

/// The object key of a public URL: its trailing path segment, query stripped.
pub fn object_key_from_url(url: &str) -> Option<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative URLs such as /uploads/ano/ab12cd34.jpg
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .next()
        .filter(|seg| !seg.is_empty())
        .map(|seg| seg.to_string())
}

/// Best-effort delete of the object behind `url`. Failures are logged, never raised.
pub fn delete_file(storage: &dyn MediaStorage, url: &str, bucket: &str) -> bool {
    if url.is_empty() {
        log::error!("[storage] No URL given for delete");
        return false;
    }
    let key = match object_key_from_url(url) {
        Some(k) => k,
        None => {
            log::error!("[storage] Could not extract object key from {}", url);
            return false;
        }
    };
    match storage.remove_object(bucket, &key) {
        Ok(()) => {
            log::info!("[storage] Deleted {}/{}", bucket, key);
            true
        }
        Err(e) => {
            log::error!("[storage] Delete of {}/{} failed: {}", bucket, key, e);
            false
        }
    }
}

/// Delete the file behind `url` only if it lives in our storage.
pub fn delete_if_owned(storage: &dyn MediaStorage, url: &str, bucket: &str) -> bool {
    if url.is_empty() || !storage.owns_url(url) {
        return false;
    }
    delete_file(storage, url, bucket)
}

/// Create every required bucket that does not exist yet. Returns how many were created.
pub fn ensure_buckets(storage: &dyn MediaStorage, required: &[String]) -> usize {
    let existing = match storage.list_buckets() {
        Ok(b) => b,
        Err(e) => {
            log::error!("[storage] Could not list buckets on {}: {}", storage.backend_name(), e);
            return 0;
        }
    };
    if existing.is_empty() {
        log::warn!("[storage] No buckets found, creating required buckets");
    } else {
        log::info!("[storage] Available buckets: {}", existing.join(", "));
    }

    let mut created = 0;
    for bucket in required.iter().filter(|b| !existing.contains(b)) {
        match storage.create_bucket(bucket) {
            Ok(()) => {
                log::info!("[storage] Created bucket {}", bucket);
                created += 1;
            }
            Err(e) => log::error!("[storage] Failed to create bucket {}: {}", bucket, e),
        }
    }
    created
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Minimal valid PNG header; enough for format sniffing.
    pub(crate) const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    pub(crate) fn png(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: PNG.to_vec(),
        }
    }

    /// In-memory storage that records calls.
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub buckets: Mutex<HashSet<String>>,
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
        pub puts: Mutex<u32>,
        pub fail_create: bool,
        pub fail_remove: bool,
    }

    impl MemoryStorage {
        pub(crate) fn with_buckets(names: &[&str]) -> Self {
            let s = MemoryStorage::default();
            s.buckets
                .lock()
                .unwrap()
                .extend(names.iter().map(|n| n.to_string()));
            s
        }
    }

    impl MediaStorage for MemoryStorage {
        fn backend_name(&self) -> &str {
            "memory"
        }
        fn put_object(&self, bucket: &str, key: &str, bytes: &[u8], _ct: &str) -> Result<(), StorageError> {
            *self.puts.lock().unwrap() += 1;
            if !self.buckets.lock().unwrap().contains(bucket) {
                return Err(StorageError::BucketNotFound(bucket.to_string()));
            }
            self.objects
                .lock()
                .unwrap()
                .insert(format!("{}/{}", bucket, key), bytes.to_vec());
            Ok(())
        }
        fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
            if self.fail_create {
                return Err(StorageError::Request("denied".into()));
            }
            self.buckets.lock().unwrap().insert(bucket.to_string());
            Ok(())
        }
        fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
            let mut v: Vec<String> = self.buckets.lock().unwrap().iter().cloned().collect();
            v.sort();
            Ok(v)
        }
        fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
            if self.fail_remove {
                return Err(StorageError::Request("offline".into()));
            }
            self.objects
                .lock()
                .unwrap()
                .remove(&format!("{}/{}", bucket, key))
                .map(|_| ())
                .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))
        }
        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("https://mem.test/{}/{}", bucket, key)
        }
        fn owns_url(&self, url: &str) -> bool {
            url.starts_with("https://mem.test/")
        }
    }

    const MAX: u64 = 50 * 1024 * 1024;

    #[test]
    fn upload_returns_public_url() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        let url = upload_file(&s, &png("Bild.PNG"), "ano", MAX).unwrap();
        assert!(url.starts_with("https://mem.test/ano/"));
        let key = object_key_from_url(&url).unwrap();
        assert_eq!(key.len(), 8 + ".png".len());
        assert!(key.ends_with(".png"));
        assert_eq!(*s.puts.lock().unwrap(), 1);
    }

    #[test]
    fn upload_creates_missing_bucket_and_retries_once() {
        let s = MemoryStorage::default();
        let url = upload_file(&s, &png("a.png"), "hero", MAX).unwrap();
        assert!(url.contains("/hero/"));
        assert_eq!(*s.puts.lock().unwrap(), 2);
        assert!(s.buckets.lock().unwrap().contains("hero"));
    }

    #[test]
    fn upload_gives_up_when_bucket_cannot_be_created() {
        let s = MemoryStorage {
            fail_create: true,
            ..Default::default()
        };
        assert!(upload_file(&s, &png("a.png"), "ano", MAX).is_none());
        assert_eq!(*s.puts.lock().unwrap(), 1);
    }

    #[test]
    fn upload_rejects_non_images() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        let text = Upload {
            file_name: "notes.txt".into(),
            content_type: "text/plain".into(),
            bytes: b"hello".to_vec(),
        };
        assert!(upload_file(&s, &text, "ano", MAX).is_none());

        let disguised = Upload {
            file_name: "x.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: b"definitely not a jpeg".to_vec(),
        };
        assert!(upload_file(&s, &disguised, "ano", MAX).is_none());
        assert_eq!(*s.puts.lock().unwrap(), 0);
    }

    #[test]
    fn upload_rejects_oversized_and_empty() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        assert!(upload_file(&s, &png("a.png"), "ano", 4).is_none());
        let empty = Upload {
            file_name: "a.png".into(),
            content_type: "image/png".into(),
            bytes: Vec::new(),
        };
        assert!(upload_file(&s, &empty, "ano", MAX).is_none());
    }

    #[test]
    fn svg_is_accepted_without_sniffing() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        let svg = Upload {
            file_name: "logo.svg".into(),
            content_type: "image/svg+xml".into(),
            bytes: b"<svg xmlns='http://www.w3.org/2000/svg'/>".to_vec(),
        };
        assert!(upload_file(&s, &svg, "ano", MAX).unwrap().ends_with(".svg"));
    }

    #[test]
    fn extension_falls_back_to_sniffed_format() {
        let key = object_key(&png("camera-upload"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn key_from_url_variants() {
        assert_eq!(
            object_key_from_url("https://x.supabase.co/storage/v1/object/public/ano/ab12cd34.jpg"),
            Some("ab12cd34.jpg".into())
        );
        assert_eq!(
            object_key_from_url("/uploads/ano/ab12cd34.jpg?v=2"),
            Some("ab12cd34.jpg".into())
        );
        assert_eq!(object_key_from_url("https://x.test/ano/"), None);
    }

    #[test]
    fn delete_file_reports_failures() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        let url = upload_file(&s, &png("a.png"), "ano", MAX).unwrap();
        assert!(delete_file(&s, &url, "ano"));
        assert!(!delete_file(&s, &url, "ano"));
        assert!(!delete_file(&s, "", "ano"));
    }

    #[test]
    fn delete_if_owned_skips_foreign_urls() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        assert!(!delete_if_owned(&s, "https://images.unsplash.com/photo-1", "ano"));
        let url = upload_file(&s, &png("a.png"), "ano", MAX).unwrap();
        assert!(delete_if_owned(&s, &url, "ano"));
    }

    #[test]
    fn delete_if_owned_reports_remote_failure() {
        let mut s = MemoryStorage::with_buckets(&["ano"]);
        let url = upload_file(&s, &png("a.png"), "ano", MAX).unwrap();
        s.fail_remove = true;
        assert!(!delete_if_owned(&s, &url, "ano"));
        assert_eq!(s.objects.lock().unwrap().len(), 1);
    }

    #[test]
    fn ensure_buckets_creates_only_missing() {
        let s = MemoryStorage::with_buckets(&["ano"]);
        let required: Vec<String> = ["ano", "hero", "about"].iter().map(|b| b.to_string()).collect();
        assert_eq!(ensure_buckets(&s, &required), 2);
        assert_eq!(ensure_buckets(&s, &required), 0);
    }

    #[test]
    fn safe_segments() {
        assert!(is_safe_segment("ab12cd34.jpg"));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment(""));
    }
}
