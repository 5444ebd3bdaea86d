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
use crate::models::content::SERVICE_ICONS;
use crate::site::{NewService, SiteStore};
use crate::storage::MediaStorage;

#[get("/services")]
pub fn services_list(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let icons: Vec<_> = SERVICE_ICONS
        .iter()
        .map(|(value, label)| json!({ "value": value, "label": label }))
        .collect();
    let services: Vec<_> = site
        .snapshot()
        .services
        .into_iter()
        .map(|s| {
            let is_image = s.icon_is_image();
            let mut v = json!(s);
            v["icon_is_image"] = json!(is_image);
            v
        })
        .collect();
    let mut context = page_context("services", "Redigera tjänster", slug, cfg, flash);
    context["services"] = json!(services);
    context["icons"] = json!(icons);
    Template::render("admin/services", &context)
}

#[derive(FromForm)]
pub struct ServiceForm<'f> {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub price: Option<String>,
    pub file: Option<TempFile<'f>>,
}

/// Uploaded icon wins over the picked symbol; nothing picked falls back to `default`.
pub(crate) fn resolve_icon(uploaded: Option<String>, picked: &str) -> String {
    match uploaded {
        Some(url) => url,
        None if picked.trim() == "custom" => String::new(),
        None => picked.trim().to_string(),
    }
}

#[post("/services", data = "<form>")]
pub async fn service_add(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    form: Form<ServiceForm<'_>>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let uploaded = upload_image(media, cfg, form.file.as_ref())
        .await
        .map_err(|_| failure(slug, "services", "Kunde inte ladda upp ikonen. Försök igen."))?;

    let new = NewService {
        title: form.title.clone(),
        description: form.description.clone(),
        icon: resolve_icon(uploaded.clone(), &form.icon),
        price: form.price.clone(),
    };

    match site.add_service(new) {
        Ok(item) => {
            log::info!("[content] Added service {} ({})", item.id, item.title);
            Ok(success(
                slug,
                "services",
                "Ny tjänst har lagts till och kommer visas direkt på webbplatsen!",
            ))
        }
        Err(e) => {
            if let Some(url) = uploaded.filter(|_| !e.edit_applied()) {
                discard_image(media, cfg, &url).await;
            }
            Err(failure(slug, "services", e))
        }
    }
}

#[post("/services/<id>/delete")]
pub async fn service_delete(
    _admin: AdminSession,
    site: &State<SiteStore>,
    media: &State<Arc<dyn MediaStorage>>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    id: i64,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let removed = site
        .remove_service(id)
        .map_err(|e| failure(slug, "services", e))?;
    match removed {
        Some(service) => {
            if service.icon_is_image() {
                discard_image(media, cfg, &service.icon).await;
            }
            Ok(success(
                slug,
                "services",
                "Tjänsten har tagits bort och ändringen visas direkt på webbplatsen!",
            ))
        }
        None => Ok(Flash::warning(
            super::to_tab(slug, "services"),
            "Tjänsten finns inte längre.",
        )),
    }
}
