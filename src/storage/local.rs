use std::fs;
use std::path::{Path, PathBuf};

use super::{is_safe_segment, MediaStorage, StorageError};

/// Buckets as directories under a root, served by Rocket's FileServer at `public_base`.
pub struct LocalBucket {
    root: PathBuf,
    public_base: String,
}

impl LocalBucket {
    pub fn new(root: impl AsRef<Path>, public_base: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_segment(bucket) {
            return Err(StorageError::InvalidName(bucket.to_string()));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_segment(key) {
            return Err(StorageError::InvalidName(key.to_string()));
        }
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

impl MediaStorage for LocalBucket {
    fn backend_name(&self) -> &str {
        "local"
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.is_dir() {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }
        fs::write(self.object_path(bucket, key)?, bytes)?;
        Ok(())
    }

    fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        fs::create_dir_all(self.bucket_dir(bucket)?)?;
        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .collect();
        names.sort();
        Ok(names)
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::ObjectNotFound(format!("{}/{}", bucket, key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base, bucket, key)
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/", self.public_base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::png;
    use crate::storage::{delete_file, ensure_buckets, upload_file};

    const MAX: u64 = 1024 * 1024;

    #[test]
    fn upload_writes_file_under_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let s = LocalBucket::new(dir.path(), "/uploads/");
        let url = upload_file(&s, &png("a.png"), "portfolio", MAX).unwrap();
        assert!(url.starts_with("/uploads/portfolio/"));
        let key = url.rsplit('/').next().unwrap();
        assert!(dir.path().join("portfolio").join(key).is_file());
        assert!(s.owns_url(&url));
        assert!(!s.owns_url("https://images.unsplash.com/x.jpg"));
    }

    #[test]
    fn missing_bucket_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let s = LocalBucket::new(dir.path(), "/uploads");
        let err = s.put_object("hero", "a.png", b"x", "image/png").unwrap_err();
        assert!(matches!(err, StorageError::BucketNotFound(_)));
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let s = LocalBucket::new(dir.path(), "/uploads");
        s.create_bucket("ano").unwrap();
        assert!(matches!(
            s.put_object("ano", "../escape.png", b"x", "image/png"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(s.create_bucket("..").is_err());
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let s = LocalBucket::new(dir.path(), "/uploads");
        let url = upload_file(&s, &png("a.png"), "ano", MAX).unwrap();
        assert!(delete_file(&s, &url, "ano"));
        assert!(!delete_file(&s, &url, "ano"));
    }

    #[test]
    fn ensure_buckets_on_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let s = LocalBucket::new(dir.path().join("uploads"), "/uploads");
        let required = vec!["ano".to_string(), "hero".to_string()];
        assert_eq!(ensure_buckets(&s, &required), 2);
        assert_eq!(s.list_buckets().unwrap(), required);
    }
}
