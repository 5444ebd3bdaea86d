use serde_json::json;

use super::{is_safe_segment, MediaStorage, StorageError};

/// Supabase Storage over its REST API (https://supabase.com/docs/reference/api/storage).
/// Buckets are created public so uploaded images can be linked directly.
pub struct SupabaseBucket {
    base_url: String,
    api_key: String,
}

impl SupabaseBucket {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    // Blocking clients must not be created on an async worker; callers run
    // storage calls through spawn_blocking and each call gets its own client.
    fn client(&self) -> Result<reqwest::blocking::Client, StorageError> {
        reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::Request(format!("HTTP client error: {}", e)))
    }

    fn authorized(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.api_key))
            .header("apikey", &self.api_key)
    }

    fn check(
        resp: reqwest::blocking::Response,
        bucket: &str,
    ) -> Result<reqwest::blocking::Response, StorageError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let text = resp.text().unwrap_or_default();
        if is_bucket_not_found(status, &text) {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }
        Err(StorageError::Rejected {
            status,
            message: text,
        })
    }
}

/// Supabase reports a missing bucket as 404, or as 400 with a "Bucket not found" body.
fn is_bucket_not_found(status: u16, body: &str) -> bool {
    let lower = body.to_lowercase();
    (status == 404 || status == 400) && lower.contains("bucket") && lower.contains("not found")
}

impl MediaStorage for SupabaseBucket {
    fn backend_name(&self) -> &str {
        "supabase"
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        if !is_safe_segment(bucket) || !is_safe_segment(key) {
            return Err(StorageError::InvalidName(format!("{}/{}", bucket, key)));
        }
        let client = self.client()?;
        let resp = self
            .authorized(client.post(self.endpoint(&format!("object/{}/{}", bucket, key))))
            .header("Content-Type", content_type)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "true")
            .body(bytes.to_vec())
            .send()
            .map_err(|e| StorageError::Request(format!("Supabase upload failed: {}", e)))?;
        Self::check(resp, bucket)?;
        Ok(())
    }

    fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if !is_safe_segment(bucket) {
            return Err(StorageError::InvalidName(bucket.to_string()));
        }
        let client = self.client()?;
        let resp = self
            .authorized(client.post(self.endpoint("bucket")))
            .json(&json!({ "id": bucket, "name": bucket, "public": true }))
            .send()
            .map_err(|e| StorageError::Request(format!("Supabase create bucket failed: {}", e)))?;
        Self::check(resp, bucket)?;
        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        let client = self.client()?;
        let resp = self
            .authorized(client.get(self.endpoint("bucket")))
            .send()
            .map_err(|e| StorageError::Request(format!("Supabase list buckets failed: {}", e)))?;
        let body: serde_json::Value = Self::check(resp, "")?
            .json()
            .map_err(|e| StorageError::Request(format!("Invalid bucket list: {}", e)))?;
        Ok(body
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|b| b.get("name").and_then(|n| n.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        if !is_safe_segment(bucket) || !is_safe_segment(key) {
            return Err(StorageError::InvalidName(format!("{}/{}", bucket, key)));
        }
        let client = self.client()?;
        let resp = self
            .authorized(client.delete(self.endpoint(&format!("object/{}", bucket))))
            .json(&json!({ "prefixes": [key] }))
            .send()
            .map_err(|e| StorageError::Request(format!("Supabase delete failed: {}", e)))?;
        Self::check(resp, bucket)?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.endpoint(&format!("object/public/{}/{}", bucket, key))
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&self.endpoint("object/public/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_layout() {
        let s = SupabaseBucket::new("https://abc.supabase.co/", "key");
        assert_eq!(
            s.public_url("ano", "ab12cd34.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/ano/ab12cd34.jpg"
        );
        assert!(s.owns_url("https://abc.supabase.co/storage/v1/object/public/hero/x.png"));
        assert!(!s.owns_url("https://images.unsplash.com/photo-1"));
    }

    #[test]
    fn bucket_not_found_detection() {
        assert!(is_bucket_not_found(
            400,
            r#"{"statusCode":"404","error":"Bucket not found","message":"Bucket not found"}"#
        ));
        assert!(is_bucket_not_found(404, "bucket not found"));
        assert!(!is_bucket_not_found(403, "Bucket not found"));
        assert!(!is_bucket_not_found(400, "invalid mime type"));
    }

    #[test]
    fn rejects_unsafe_names_before_any_request() {
        let s = SupabaseBucket::new("http://127.0.0.1:9", "key");
        assert!(matches!(
            s.put_object("ano", "../x", b"x", "image/png"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            s.remove_object("a/b", "x.png"),
            Err(StorageError::InvalidName(_))
        ));
    }
}
