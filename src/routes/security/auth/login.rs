use std::sync::Arc;

use rocket::form::Form;
use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::Template;
use serde_json::json;

use crate::auth::{self, AdminPassword, AdminSession, ClientIp};
use crate::config::{AdminSlug, SiteConfig};
use crate::rate_limit::{RateLimiter, LOGIN_WINDOW};
use crate::site::SiteStore;

#[derive(FromForm)]
pub struct LoginForm {
    pub password: String,
}

fn login_template(site: &SiteStore, slug: &AdminSlug, error: Option<&str>) -> Template {
    let context = json!({
        "page_title": "Admin Inloggning",
        "admin_slug": slug.0,
        "site_name": site.snapshot().site_name,
        "error": error,
    });
    Template::render("admin/login", &context)
}

#[get("/login")]
pub fn login_page(
    session: Option<AdminSession>,
    site: &State<SiteStore>,
    admin_slug: &State<AdminSlug>,
) -> Result<Template, Redirect> {
    if session.is_some() {
        return Err(Redirect::to(format!("{}/hero", admin_slug.base())));
    }
    Ok(login_template(site, admin_slug, None))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    site: &State<SiteStore>,
    admin_slug: &State<AdminSlug>,
    cfg: &State<SiteConfig>,
    password: &State<AdminPassword>,
    limiter: &State<Arc<RateLimiter>>,
    cookies: &CookieJar<'_>,
    client_ip: ClientIp,
) -> Result<Redirect, Template> {
    let rate_key = format!("login:{}", auth::hash_ip(&client_ip.0));
    let max_attempts = cfg.login_rate_limit.max(1);

    if !limiter.check_and_record(&rate_key, max_attempts, LOGIN_WINDOW) {
        log::warn!("[auth] Login rate limit hit");
        return Err(login_template(
            site,
            admin_slug,
            Some("För många inloggningsförsök. Försök igen om 15 minuter."),
        ));
    }

    if !password.verify(&form.password) {
        log::warn!(
            "[auth] Failed admin login, {} attempt(s) left",
            limiter.remaining(&rate_key, max_attempts, LOGIN_WINDOW)
        );
        return Err(login_template(site, admin_slug, Some("Fel lösenord. Försök igen.")));
    }

    limiter.reset(&rate_key);
    auth::set_admin_cookie(cookies);
    log::info!("[auth] Admin logged in");
    Ok(Redirect::to(format!("{}/hero", admin_slug.base())))
}
