use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Header;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect, Responder};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{failure, page_context, read_upload, success};
use crate::auth::AdminSession;
use crate::config::{AdminSlug, SiteConfig};
use crate::models::content::SiteData;
use crate::site::SiteStore;

// ── Backup ─────────────────────────────────────────────

#[get("/backup")]
pub fn backup_page(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let doc = site.snapshot();
    let mut context = page_context("backup", "Säkerhetskopia", slug, cfg, flash);
    context["counts"] = json!({
        "portfolio": doc.portfolio.len(),
        "services": doc.services.len(),
        "testimonials": doc.testimonials.len(),
        "menu": doc.menu_items.len(),
    });
    Template::render("admin/backup", &context)
}

/// The content document as a downloadable JSON file.
#[derive(Responder)]
#[response(content_type = "json")]
pub struct JsonDownload {
    body: String,
    disposition: Header<'static>,
}

#[get("/backup/export")]
pub fn backup_export(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
) -> Result<JsonDownload, Flash<Redirect>> {
    let body = site.to_json_pretty().map_err(|e| {
        log::error!("[content] Export failed: {}", e);
        failure(slug, "backup", "Kunde inte exportera innehållet.")
    })?;
    let file_name = format!("site-data-{}.json", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
    Ok(JsonDownload {
        body,
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name),
        ),
    })
}

#[derive(FromForm)]
pub struct ImportForm<'f> {
    pub file: Option<TempFile<'f>>,
    pub raw: Option<String>,
}

/// Parse an uploaded backup. The whole document must deserialize or nothing changes.
pub(crate) fn parse_backup(raw: &str) -> Result<SiteData, String> {
    serde_json::from_str::<SiteData>(raw).map_err(|e| format!("Ogiltig säkerhetskopia: {}", e))
}

#[post("/backup/import", data = "<form>")]
pub async fn backup_import(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    form: Form<ImportForm<'_>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let raw = match read_upload(form.file.as_ref()).await {
        Some(upload) => String::from_utf8(upload.bytes)
            .map_err(|_| failure(slug, "backup", "Filen är inte giltig UTF-8."))?,
        None => form.raw.clone().unwrap_or_default(),
    };
    if raw.trim().is_empty() {
        return Err(failure(slug, "backup", "Ingen säkerhetskopia angavs."));
    }

    let doc = parse_backup(&raw).map_err(|e| failure(slug, "backup", e))?;
    site.replace_all(doc).map_err(|e| failure(slug, "backup", e))?;
    log::info!("[content] Content document restored from backup");
    Ok(success(slug, "backup", "Säkerhetskopian har återställts."))
}

#[post("/backup/reset")]
pub fn backup_reset(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    site.reset_to_defaults()
        .map_err(|e| failure(slug, "backup", e))?;
    log::warn!("[content] Content document reset to defaults");
    Ok(success(slug, "backup", "Innehållet har återställts till standardvärden."))
}
