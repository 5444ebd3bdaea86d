use std::sync::Arc;
use std::time::Duration;

use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket::tokio;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::{json, Value};

use crate::auth::{self, ClientIp};
use crate::config::SiteConfig;
use crate::email::{self, ContactMessage};
use crate::models::content::{PortfolioCategory, SiteData, CONTACT_SUBJECTS};
use crate::rate_limit::{RateLimiter, CONTACT_WINDOW};
use crate::site::SiteStore;

// ── Homepage ───────────────────────────────────────────

/// Everything the single-page template needs, derived from one snapshot.
pub(crate) fn homepage_context(doc: &SiteData, cfg: &SiteConfig) -> Value {
    let services: Vec<Value> = doc
        .services
        .iter()
        .map(|s| {
            let mut v = json!(s);
            v["icon_is_image"] = json!(s.icon_is_image());
            v
        })
        .collect();
    let categories: Vec<Value> = PortfolioCategory::ALL
        .iter()
        .map(|c| json!({ "slug": c.slug(), "label": c.label() }))
        .collect();
    let subjects: Vec<Value> = CONTACT_SUBJECTS
        .iter()
        .map(|(value, label)| json!({ "value": value, "label": label }))
        .collect();

    json!({
        "site": doc,
        "slides": doc.hero.slides(),
        "services": services,
        "categories": categories,
        "subjects": subjects,
        "has_testimonials": !doc.testimonials.is_empty(),
        "flash_dismiss_ms": cfg.flash_dismiss_ms,
    })
}

#[get("/")]
pub fn homepage(
    site: &State<SiteStore>,
    cfg: &State<SiteConfig>,
    flash: Option<FlashMessage<'_>>,
) -> Template {
    let mut context = homepage_context(&site.snapshot(), cfg);
    if let Some(ref f) = flash {
        context["flash_kind"] = json!(f.kind());
        context["flash_msg"] = json!(f.message());
    }
    Template::render("index", &context)
}

/// The content document for other renderers.
#[get("/api/content")]
pub fn content_json(site: &State<SiteStore>) -> Json<SiteData> {
    Json(site.snapshot())
}

// ── Contact form ───────────────────────────────────────

#[derive(Debug, FromForm)]
pub struct ContactSubmit {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[field(name = "_honey")]
    pub honey: Option<String>,
}

/// Field checks, in the order a visitor would fix them.
pub(crate) fn validate_contact(form: &ContactSubmit) -> Result<ContactMessage, &'static str> {
    let name = form.name.trim();
    let email = form.email.trim();
    let message = form.message.trim();
    if name.is_empty() || email.is_empty() || message.is_empty() || form.subject.trim().is_empty() {
        return Err("Vänligen fyll i alla obligatoriska fält");
    }
    if email.parse::<lettre::Address>().is_err() {
        return Err("Vänligen ange en giltig e-postadress");
    }
    let subject = CONTACT_SUBJECTS
        .iter()
        .find(|(value, _)| *value == form.subject.trim())
        .map(|(value, _)| value.to_string())
        .ok_or("Vänligen välj ett ämne")?;
    Ok(ContactMessage {
        name: name.to_string(),
        email: email.to_string(),
        subject,
        message: message.to_string(),
    })
}

const SENT: &str = "Tack för ditt meddelande! Jag återkommer så snart som möjligt.";

#[post("/contact", data = "<form>")]
pub async fn contact_submit(
    site: &State<SiteStore>,
    cfg: &State<SiteConfig>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Form<ContactSubmit>,
) -> Result<Flash<Redirect>, Flash<Redirect>> {
    let back = || Redirect::to("/#contact");

    // Honeypot: bots fill hidden fields. Pretend success.
    if form.honey.as_deref().map(|h| !h.is_empty()).unwrap_or(false) {
        log::info!("[email] Honeypot triggered, dropping contact message");
        return Ok(Flash::success(back(), SENT));
    }

    let msg = validate_contact(&form).map_err(|e| Flash::error(back(), e))?;

    let rate_key = format!("contact:{}", auth::hash_ip(&client_ip.0));
    let max_attempts = cfg.contact_rate_limit.max(1);
    if !limiter.check_and_record(&rate_key, max_attempts, CONTACT_WINDOW) {
        return Err(Flash::error(
            back(),
            "För många meddelanden. Vänta en stund innan du skickar igen.",
        ));
    }

    let doc = site.snapshot();
    let email_cfg = cfg.email.clone();
    let to = doc.contact.email.clone();
    let site_name = doc.site_name.clone();

    // Providers use blocking HTTP/SMTP clients.
    let sent = tokio::time::timeout(
        Duration::from_secs(60),
        tokio::task::spawn_blocking(move || {
            email::send_contact_message(&email_cfg, &site_name, &to, &msg)
        }),
    )
    .await;

    match sent {
        Ok(Ok(Ok(()))) => Ok(Flash::success(back(), SENT)),
        Ok(Ok(Err(_))) => Err(Flash::error(
            back(),
            "Meddelandet kunde inte skickas just nu. Försök igen senare eller mejla direkt.",
        )),
        Ok(Err(e)) => {
            log::error!("[email] Contact send task failed: {}", e);
            Err(Flash::error(back(), "Ett fel uppstod. Försök igen senare."))
        }
        Err(_) => {
            log::error!("[email] Contact send timed out");
            Err(Flash::error(back(), "Ett fel uppstod. Försök igen senare."))
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![homepage, content_json, contact_submit]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, subject: &str, message: &str) -> ContactSubmit {
        ContactSubmit {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
            honey: None,
        }
    }

    #[test]
    fn contact_validation() {
        let ok = validate_contact(&form(" Maja ", "maja@example.com", "Other", "Hej")).unwrap();
        assert_eq!(ok.name, "Maja");
        assert_eq!(ok.subject, "Other");

        assert!(validate_contact(&form("", "maja@example.com", "Other", "Hej")).is_err());
        assert!(validate_contact(&form("Maja", "not-an-email", "Other", "Hej")).is_err());
        assert!(validate_contact(&form("Maja", "maja@example.com", "Spam", "Hej")).is_err());
        assert!(validate_contact(&form("Maja", "maja@example.com", "Other", "   ")).is_err());
    }

    #[test]
    fn context_without_testimonials() {
        let mut doc = SiteData::default();
        doc.testimonials.clear();
        let ctx = homepage_context(&doc, &SiteConfig::default());
        assert_eq!(ctx["has_testimonials"], false);
        assert_eq!(ctx["slides"].as_array().map(|s| s.len()), Some(1));
        assert_eq!(ctx["site"]["siteName"], doc.site_name);
        assert_eq!(ctx["services"][0]["icon_is_image"], false);
    }
}
