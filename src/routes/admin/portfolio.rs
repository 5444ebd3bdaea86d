use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{discard_image, failure, page_context, resolve_image, success, upload_image};
use crate::auth::AdminSession;
use crate::config::{AdminSlug, SiteConfig};
use crate::models::content::PortfolioCategory;
use crate::site::{NewPortfolioItem, SiteStore};
use crate::storage::MediaStorage;

// ── Portfolio ──────────────────────────────────────────

#[get("/portfolio")]
pub fn portfolio_list(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let categories: Vec<_> = PortfolioCategory::ALL
        .iter()
        .map(|c| json!({ "slug": c.slug(), "label": c.label() }))
        .collect();
    let mut context = page_context("portfolio", "Redigera portfolio", slug, cfg, flash);
    context["items"] = json!(site.snapshot().portfolio);
    context["categories"] = json!(categories);
    Template::render("admin/portfolio", &context)
}

#[derive(FromForm)]
pub struct PortfolioFormData<'f> {
    pub title: String,
    pub category: String,
    pub image: String,
    pub file: Option<TempFile<'f>>,
}

#[post("/portfolio", data = "<form>")]
pub async fn portfolio_add(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    form: Form<PortfolioFormData<'_>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let uploaded = upload_image(media, cfg, form.file.as_ref())
        .await
        .map_err(|_| failure(slug, "portfolio", "Kunde inte ladda upp filen. Försök igen."))?;

    let new = NewPortfolioItem {
        title: form.title.clone(),
        category: form.category.clone(),
        image: resolve_image(uploaded.clone(), &form.image),
    };

    match site.add_portfolio_item(new) {
        Ok(item) => {
            log::info!("[content] Added portfolio item {} ({})", item.id, item.title);
            Ok(success(
                slug,
                "portfolio",
                "Nytt projekt har lagts till och kommer visas direkt på webbplatsen!",
            ))
        }
        Err(e) => {
            // A rejected item leaves the fresh upload unreferenced. An unsaved
            // one is still live in the cache and keeps its image.
            if let Some(url) = uploaded.filter(|_| !e.edit_applied()) {
                discard_image(media, cfg, &url).await;
            }
            Err(failure(slug, "portfolio", e))
        }
    }
}

/// The item leaves the list even when its stored image cannot be deleted.
#[post("/portfolio/<id>/delete")]
pub async fn portfolio_delete(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    id: i64,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let removed = site
        .remove_portfolio_item(id)
        .map_err(|e| failure(slug, "portfolio", e))?;
    match removed {
        Some(item) => {
            discard_image(media, cfg, &item.image).await;
            Ok(success(
                slug,
                "portfolio",
                "Projektet har tagits bort och ändringen visas direkt på webbplatsen!",
            ))
        }
        None => Ok(Flash::warning(
            super::to_tab(slug, "portfolio"),
            "Projektet finns inte längre.",
        )),
    }
}
