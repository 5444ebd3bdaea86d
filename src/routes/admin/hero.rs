use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{failure, page_context, resolve_image, success, upload_image};
use crate::auth::AdminSession;
use crate::config::{AdminSlug, SiteConfig};
use crate::models::content::Hero;
use crate::site::SiteStore;
use crate::storage::MediaStorage;

// ── Hero ───────────────────────────────────────────────

#[get("/hero")]
pub fn hero_page(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let hero = site.snapshot().hero;
    let mut context = page_context("hero", "Redigera Hero-sektion", slug, cfg, flash);
    context["slides_text"] = json!(hero.images.clone().unwrap_or_default().join("\n"));
    context["hero"] = json!(hero);
    Template::render("admin/hero", &context)
}

#[derive(FromForm)]
pub struct HeroForm<'f> {
    pub heading: String,
    pub tagline: String,
    pub image: String,
    /// Slider URLs, one per line.
    pub images: String,
    pub file: Option<TempFile<'f>>,
}

/// Non-empty trimmed lines; `None` when there are none so the field stays absent.
pub(crate) fn parse_slides(raw: &str) -> Option<Vec<String>> {
    let list: Vec<String> = raw
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

#[post("/hero", data = "<form>")]
pub async fn hero_save(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    form: Form<HeroForm<'_>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let uploaded = upload_image(media, cfg, form.file.as_ref())
        .await
        .map_err(|e| failure(slug, "hero", e))?;

    let hero = Hero {
        heading: form.heading.trim().to_string(),
        tagline: form.tagline.trim().to_string(),
        image: resolve_image(uploaded, &form.image),
        images: parse_slides(&form.images),
    };

    site.update_hero(hero).map_err(|e| failure(slug, "hero", e))?;
    Ok(success(
        slug,
        "hero",
        "Hero-sektionen har sparats och kommer att visas direkt på webbplatsen!",
    ))
}
