use std::sync::Arc;

use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::tokio;
use rocket::tokio::io::AsyncReadExt;
use serde_json::{json, Value};

use crate::config::{AdminSlug, SiteConfig};
use crate::storage::{self, MediaStorage, Upload};

pub mod about;
pub mod backup;
pub mod contact;
pub mod hero;
pub mod portfolio;
pub mod services;
pub mod settings;
pub mod testimonials;

/// Editor tabs, in panel order: (path, label).
pub(crate) const TABS: &[(&str, &str)] = &[
    ("hero", "Hero"),
    ("about", "About"),
    ("portfolio", "Portfolio"),
    ("services", "Services"),
    ("testimonials", "Testimonials"),
    ("contact", "Contact"),
    ("settings", "Settings"),
    ("backup", "Backup"),
];

pub(crate) const UPLOAD_FAILED: &str = "Kunde inte ladda upp bilden. Försök igen.";

/// Helper: get the admin base path from managed state
pub(crate) fn admin_base(slug: &AdminSlug) -> String {
    slug.base()
}

/// Redirect back to an editor tab.
pub(crate) fn to_tab(slug: &AdminSlug, tab: &str) -> Redirect {
    Redirect::to(format!("{}/{}", admin_base(slug), tab))
}

pub(crate) fn success(slug: &AdminSlug, tab: &str, msg: &str) -> Flash<Redirect> {
    Flash::success(to_tab(slug, tab), msg)
}

pub(crate) fn failure(slug: &AdminSlug, tab: &str, msg: impl std::fmt::Display) -> Flash<Redirect> {
    Flash::error(to_tab(slug, tab), msg.to_string())
}

/// Context shared by every editor page.
pub(crate) fn page_context(
    tab: &str,
    title: &str,
    slug: &AdminSlug,
    cfg: &SiteConfig,
    flash: Option<FlashMessage<'_>>,
) -> Value {
    let tabs: Vec<Value> = TABS
        .iter()
        .map(|(path, label)| json!({ "path": path, "label": label }))
        .collect();
    let mut context = json!({
        "page_title": title,
        "active_tab": tab,
        "tabs": tabs,
        "admin_slug": slug.0,
        "flash_dismiss_ms": cfg.flash_dismiss_ms,
    });
    if let Some(ref f) = flash {
        context["flash_kind"] = json!(f.kind());
        context["flash_msg"] = json!(f.message());
    }
    context
}

/// Read a submitted file into memory. An empty or absent file field is "no file".
pub(crate) async fn read_upload(file: Option<&TempFile<'_>>) -> Option<Upload> {
    let file = file?;
    if file.len() == 0 {
        return None;
    }

    let file_name = file
        .raw_name()
        .map(|rn| rn.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .or_else(|| file.name().map(|n| n.to_string()))
        .unwrap_or_default();
    let content_type = file
        .content_type()
        .map(|ct| format!("{}/{}", ct.top(), ct.sub()))
        .unwrap_or_default();

    let reader = match file.open().await {
        Ok(r) => r,
        Err(e) => {
            log::error!("[storage] Could not open uploaded file {}: {}", file_name, e);
            return None;
        }
    };
    tokio::pin!(reader);
    let mut bytes = Vec::with_capacity(file.len() as usize);
    if let Err(e) = reader.read_to_end(&mut bytes).await {
        log::error!("[storage] Could not read uploaded file {}: {}", file_name, e);
        return None;
    }

    Some(Upload {
        file_name,
        content_type,
        bytes,
    })
}

/// Upload the submitted image, if any, to the default bucket.
/// `Ok(None)`: nothing was selected. `Err`: a file was selected but could not be stored.
pub(crate) async fn upload_image(
    media: &Arc<dyn MediaStorage>,
    cfg: &SiteConfig,
    file: Option<&TempFile<'_>>,
) -> Result<Option<String>, &'static str> {
    let upload = match read_upload(file).await {
        Some(u) => u,
        None => return Ok(None),
    };
    let media = Arc::clone(media);
    let bucket = cfg.storage.default_bucket.clone();
    let max = cfg.storage.max_upload_bytes();

    match tokio::task::spawn_blocking(move || storage::upload_file(&*media, &upload, &bucket, max)).await {
        Ok(Some(url)) => Ok(Some(url)),
        Ok(None) => Err(UPLOAD_FAILED),
        Err(e) => {
            log::error!("[storage] Upload task failed: {}", e);
            Err(UPLOAD_FAILED)
        }
    }
}

/// Best-effort removal of a stored image that is no longer referenced.
pub(crate) async fn discard_image(media: &Arc<dyn MediaStorage>, cfg: &SiteConfig, url: &str) {
    if url.is_empty() {
        return;
    }
    let media = Arc::clone(media);
    let bucket = cfg.storage.default_bucket.clone();
    let url = url.to_string();
    if let Err(e) =
        tokio::task::spawn_blocking(move || storage::delete_if_owned(&*media, &url, &bucket)).await
    {
        log::error!("[storage] Delete task failed: {}", e);
    }
}

/// Typed URL unless a file was uploaded.
pub(crate) fn resolve_image(uploaded: Option<String>, typed: &str) -> String {
    uploaded.unwrap_or_else(|| typed.trim().to_string())
}

#[get("/")]
pub fn dashboard(_admin: crate::auth::AdminSession, slug: &rocket::State<AdminSlug>) -> Redirect {
    to_tab(slug, "hero")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        dashboard,
        hero::hero_page,
        hero::hero_save,
        about::about_page,
        about::about_save,
        portfolio::portfolio_list,
        portfolio::portfolio_add,
        portfolio::portfolio_delete,
        services::services_list,
        services::service_add,
        services::service_delete,
        testimonials::testimonials_list,
        testimonials::testimonial_add,
        testimonials::testimonial_delete,
        contact::contact_page,
        contact::contact_save,
        settings::settings_page,
        settings::settings_save,
        settings::menu_add,
        settings::menu_delete,
        backup::backup_page,
        backup::backup_export,
        backup::backup_import,
        backup::backup_reset,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_url_wins_over_typed() {
        assert_eq!(
            resolve_image(Some("/uploads/ano/ab12cd34.jpg".into()), "https://x.test/a.jpg"),
            "/uploads/ano/ab12cd34.jpg"
        );
        assert_eq!(resolve_image(None, "  https://x.test/a.jpg "), "https://x.test/a.jpg");
    }

    #[test]
    fn context_carries_flash_settings() {
        let cfg = SiteConfig::default();
        let ctx = page_context("hero", "Hero", &AdminSlug("admin".into()), &cfg, None);
        assert_eq!(ctx["admin_slug"], "admin");
        assert_eq!(ctx["flash_dismiss_ms"], 3000);
        assert_eq!(ctx["tabs"].as_array().map(|t| t.len()), Some(TABS.len()));
        assert!(ctx.get("flash_msg").is_none());
    }
}
