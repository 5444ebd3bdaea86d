use serde::Deserialize;

/// Site configuration, extracted from the `site` table of Rocket's figment
/// (`Rocket.toml` or `ROCKET_SITE={...}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub admin_slug: String,
    pub admin_password: String,
    pub store: String,
    pub sqlite_path: String,
    pub mongo_uri: String,
    pub mongo_db: String,
    pub flash_dismiss_ms: u64,
    pub login_rate_limit: u64,
    pub contact_rate_limit: u64,
    pub storage: StorageConfig,
    pub email: EmailConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            admin_slug: "admin".to_string(),
            admin_password: "ano123".to_string(),
            store: "sqlite".to_string(),
            sqlite_path: "website/db/site.db".to_string(),
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_db: "ano_site".to_string(),
            flash_dismiss_ms: 3000,
            login_rate_limit: 5,
            contact_rate_limit: 3,
            storage: StorageConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: String,
    pub default_bucket: String,
    pub required_buckets: Vec<String>,
    pub max_upload_mb: u64,
    pub local_root: String,
    pub public_base: String,
    pub supabase_url: String,
    pub supabase_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: "local".to_string(),
            default_bucket: "ano".to_string(),
            required_buckets: ["ano", "hero", "about", "portfolio", "services", "testimonials"]
                .iter()
                .map(|b| b.to_string())
                .collect(),
            max_upload_mb: 50,
            local_root: "website/uploads".to_string(),
            public_base: "/uploads".to_string(),
            supabase_url: String::new(),
            supabase_key: String::new(),
        }
    }
}

impl StorageConfig {
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.max(1) * 1024 * 1024
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub from_address: String,
    pub failover: bool,
    pub chain: String,
    pub resend_api_key: String,
    pub postmark_server_token: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            from_address: String::new(),
            failover: true,
            chain: "resend,postmark,smtp".to_string(),
            resend_api_key: String::new(),
            postmark_server_token: String::new(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
        }
    }
}

impl EmailConfig {
    /// Providers named in the chain that have credentials filled in, in chain order.
    pub fn enabled_providers(&self) -> Vec<&str> {
        self.chain
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|p| match *p {
                "resend" => !self.resend_api_key.is_empty(),
                "postmark" => !self.postmark_server_token.is_empty(),
                "smtp" => !self.smtp_host.is_empty() && !self.smtp_username.is_empty(),
                _ => true,
            })
            .collect()
    }
}

/// Admin mount point, shared via managed state so routes and fairings agree on it.
pub struct AdminSlug(pub String);

impl AdminSlug {
    pub fn base(&self) -> String {
        format!("/{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_site() {
        let cfg = SiteConfig::default();
        assert_eq!(cfg.admin_slug, "admin");
        assert_eq!(cfg.storage.default_bucket, "ano");
        assert_eq!(cfg.storage.max_upload_bytes(), 50 * 1024 * 1024);
        assert_eq!(cfg.flash_dismiss_ms, 3000);
        assert_eq!(cfg.storage.required_buckets.len(), 6);
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let cfg: SiteConfig =
            serde_json::from_str(r#"{"admin_slug":"panel","storage":{"backend":"supabase"}}"#)
                .unwrap();
        assert_eq!(cfg.admin_slug, "panel");
        assert_eq!(cfg.storage.backend, "supabase");
        assert_eq!(cfg.storage.public_base, "/uploads");
        assert_eq!(cfg.admin_password, "ano123");
    }

    #[test]
    fn email_chain_skips_unconfigured_providers() {
        let mut cfg = EmailConfig::default();
        assert!(cfg.enabled_providers().is_empty());
        cfg.postmark_server_token = "tok".to_string();
        cfg.smtp_host = "smtp.example.com".to_string();
        cfg.smtp_username = "me".to_string();
        assert_eq!(cfg.enabled_providers(), vec!["postmark", "smtp"]);
    }
}
