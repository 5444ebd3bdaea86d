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
use crate::models::content::About;
use crate::site::SiteStore;
use crate::storage::MediaStorage;

#[get("/about")]
pub fn about_page(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = page_context("about", "Redigera Om mig-sektion", slug, cfg, flash);
    context["about"] = json!(site.snapshot().about);
    Template::render("admin/about", &context)
}

#[derive(FromForm)]
pub struct AboutForm<'f> {
    pub title: String,
    pub bio: String,
    pub image: String,
    pub file: Option<TempFile<'f>>,
}

#[post("/about", data = "<form>")]
pub async fn about_save(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    form: Form<AboutForm<'_>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let uploaded = upload_image(media, cfg, form.file.as_ref())
        .await
        .map_err(|e| failure(slug, "about", e))?;

    let about = About {
        title: form.title.trim().to_string(),
        bio: form.bio.trim().to_string(),
        image: resolve_image(uploaded, &form.image),
    };

    site.update_about(about).map_err(|e| failure(slug, "about", e))?;
    Ok(success(
        slug,
        "about",
        "Om mig-sektionen har sparats och kommer att visas direkt på webbplatsen!",
    ))
}
