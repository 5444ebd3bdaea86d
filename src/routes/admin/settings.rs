use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{failure, page_context, success};
use crate::auth::AdminSession;
use crate::config::{AdminSlug, SiteConfig};
use crate::models::content::MenuItem;
use crate::models::menu;
use crate::site::SiteStore;

// ── Settings ───────────────────────────────────────────

#[get("/settings")]
pub fn settings_page(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let doc = site.snapshot();
    let menu_items: Vec<_> = doc
        .menu_items
        .iter()
        .map(|m| json!({ "id": m.id, "text": m.text, "label": menu::display_label(&m.id) }))
        .collect();

    let mut context = page_context("settings", "Sidinställningar", slug, cfg, flash);
    context["site_name"] = json!(doc.site_name);
    context["site_description"] = json!(doc.site_description);
    context["menu_items"] = json!(menu_items);
    Template::render("admin/settings", &context)
}

#[derive(FromForm)]
pub struct MenuEntry {
    pub id: String,
    pub text: String,
}

#[derive(FromForm)]
pub struct SettingsForm {
    pub site_name: String,
    pub site_description: String,
    pub menu: Vec<MenuEntry>,
}

/// Name, description and menu are saved together; any invalid menu id rejects the lot.
#[post("/settings", data = "<form>")]
pub fn settings_save(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    form: Form<SettingsForm>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let form = form.into_inner();
    let items = form
        .menu
        .into_iter()
        .map(|m| MenuItem {
            id: m.id,
            text: m.text,
        })
        .collect();

    site.update_settings(&form.site_name, &form.site_description, items)
        .map_err(|e| failure(slug, "settings", e))?;
    Ok(success(
        slug,
        "settings",
        "Inställningarna har sparats och ändringarna visas direkt på webbplatsen!",
    ))
}

#[post("/settings/menu/add", data = "<form>")]
pub fn menu_add(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    form: Form<MenuEntry>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let id = form.id.trim().to_lowercase();
    let text = match form.text.trim() {
        "" => menu::display_label(&id),
        t => t.to_string(),
    };
    site.add_menu_item(&id, &text)
        .map_err(|e| failure(slug, "settings", e))?;
    log::info!("[content] Added menu entry #{}", id);
    Ok(success(slug, "settings", "Menyposten har lagts till."))
}

#[post("/settings/menu/<id>/delete")]
pub fn menu_delete(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    id: &str,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    match site.remove_menu_item(id) {
        Ok(Some(_)) => Ok(success(slug, "settings", "Menyposten har tagits bort.")),
        Ok(None) => Err(failure(
            slug,
            "settings",
            crate::models::ContentError::UnknownMenuId(id.to_string()),
        )),
        Err(e) => Err(failure(slug, "settings", e)),
    }
}
