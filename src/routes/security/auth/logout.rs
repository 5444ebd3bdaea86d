use rocket::http::CookieJar;
use rocket::response::Redirect;
use rocket::State;

use crate::auth;
use crate::config::AdminSlug;

#[get("/logout")]
pub fn logout(admin_slug: &State<AdminSlug>, cookies: &CookieJar<'_>) -> Redirect {
    auth::clear_admin_cookie(cookies);
    Redirect::to(format!("{}/login", admin_slug.base()))
}

/// Catch-all for any /<admin_slug>/* route that failed the AdminSession guard.
#[get("/<_path..>", rank = 99)]
pub fn admin_redirect_to_login(_path: std::path::PathBuf, admin_slug: &State<AdminSlug>) -> Redirect {
    Redirect::to(format!("{}/login", admin_slug.base()))
}

/// Unauthenticated form posts land here instead of a bare 401.
#[post("/<_path..>", rank = 99)]
pub fn admin_post_to_login(_path: std::path::PathBuf, admin_slug: &State<AdminSlug>) -> Redirect {
    Redirect::to(format!("{}/login", admin_slug.base()))
}
