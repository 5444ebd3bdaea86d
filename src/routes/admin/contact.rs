use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use super::{failure, page_context, success};
use crate::auth::AdminSession;
use crate::config::{AdminSlug, SiteConfig};
use crate::models::content::Contact;
use crate::site::SiteStore;

#[get("/contact")]
pub fn contact_page(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = page_context("contact", "Redigera kontaktinformation", slug, cfg, flash);
    context["contact"] = json!(site.snapshot().contact);
    Template::render("admin/contact", &context)
}

#[derive(FromForm)]
pub struct ContactForm {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub hours: String,
}

/// Replaces the whole contact record.
#[post("/contact", data = "<form>")]
pub fn contact_save(
    _admin: AdminSession,
    site: &State<SiteStore>,
    slug: &State<AdminSlug>,
    form: Form<ContactForm>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let form = form.into_inner();
    let contact = Contact {
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        address: form.address.trim().to_string(),
        hours: form.hours.trim().to_string(),
    };
    site.update_contact(contact)
        .map_err(|e| failure(slug, "contact", e))?;
    Ok(success(
        slug,
        "contact",
        "Kontaktinformationen har uppdaterats och ändringen visas direkt på webbplatsen!",
    ))
}
