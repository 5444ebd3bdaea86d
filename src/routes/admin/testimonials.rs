use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{discard_image, failure, page_context, success, upload_image};
use crate::auth::AdminSession;
use crate::config::{AdminSlug, SiteConfig};
use crate::models::ContentError;
use crate::site::{NewTestimonial, SiteStore};
use crate::storage::MediaStorage;

#[get("/testimonials")]
pub fn testimonials_list(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = page_context("testimonials", "Redigera omdömen", slug, cfg, flash);
    context["testimonials"] = json!(site.snapshot().testimonials);
    Template::render("admin/testimonials", &context)
}

#[derive(FromForm)]
pub struct TestimonialForm<'f> {
    pub name: String,
    pub role: String,
    pub text: String,
    pub file: Option<TempFile<'f>>,
}

#[post("/testimonials", data = "<form>")]
pub async fn testimonial_add(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    form: Form<TestimonialForm<'_>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    // Required fields are checked before anything is uploaded.
    if [&form.name, &form.role, &form.text]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(failure(slug, "testimonials", ContentError::MissingFields));
    }

    let avatar = upload_image(media, cfg, form.file.as_ref())
        .await
        .map_err(|_| {
            failure(
                slug,
                "testimonials",
                "Kunde inte ladda upp bilden. Kontrollera loggen för detaljer.",
            )
        })?
        .unwrap_or_default();

    let new = NewTestimonial {
        name: form.name.clone(),
        role: form.role.clone(),
        text: form.text.clone(),
        avatar: avatar.clone(),
    };

    match site.add_testimonial(new) {
        Ok(item) => {
            log::info!("[content] Added testimonial {} ({})", item.id, item.name);
            Ok(success(
                slug,
                "testimonials",
                "Nytt omdöme har lagts till och kommer visas direkt på webbplatsen!",
            ))
        }
        Err(e) => {
            if !e.edit_applied() {
                discard_image(media, cfg, &avatar).await;
            }
            Err(failure(slug, "testimonials", format!("Ett fel uppstod: {}", e)))
        }
    }
}

#[post("/testimonials/<id>/delete")]
pub async fn testimonial_delete(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    id: i64,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let removed = site.remove_testimonial(id).map_err(|e| {
        failure(
            slug,
            "testimonials",
            format!("Ett fel uppstod när omdömet skulle tas bort: {}", e),
        )
    })?;
    match removed {
        Some(item) => {
            discard_image(media, cfg, &item.avatar).await;
            Ok(success(
                slug,
                "testimonials",
                "Omdömet har tagits bort och ändringen visas direkt på webbplatsen!",
            ))
        }
        None => Ok(Flash::warning(
            super::to_tab(slug, "testimonials"),
            "Omdömet finns inte längre.",
        )),
    }
}
