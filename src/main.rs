#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod auth;
mod boot;
mod config;
mod db;
mod email;
mod models;
mod rate_limit;
mod routes;
mod site;
mod storage;
mod store;
mod tasks;


use config::{AdminSlug, SiteConfig};
use rate_limit::RateLimiter;
use site::SiteStore;
use storage::MediaStorage;

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let slug = req.rocket().state::<AdminSlug>()
            .map(|s| s.0.as_str())
            .unwrap_or("admin");
        let prefix = format!("/{}", slug);
        let path = req.uri().path();
        if path == prefix.as_str() || path.starts_with(format!("{}/", prefix).as_str()) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Sidan kunde inte hittas.</p><a href='/'>← Hem</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internt serverfel.</p><a href='/'>← Hem</a></body></html>".to_string())
}

/// The `site` table of the figment, or defaults when the table is absent.
fn site_config(rocket: &Rocket<Build>) -> Result<SiteConfig, String> {
    if !rocket.figment().contains("site") {
        return Ok(SiteConfig::default());
    }
    rocket
        .figment()
        .extract_inner::<SiteConfig>("site")
        .map_err(|e| format!("Invalid [site] configuration: {}", e))
}

/// Attach state, fairings and routes. Shared by `main` and the route tests.
pub fn assemble(
    rocket: Rocket<Build>,
    cfg: SiteConfig,
    site: SiteStore,
    media: Arc<dyn MediaStorage>,
    password: auth::AdminPassword,
) -> Rocket<Build> {
    let admin_mount = format!("/{}", cfg.admin_slug);
    let uploads = (cfg.storage.backend == "local")
        .then(|| (cfg.storage.public_base.clone(), cfg.storage.local_root.clone()));

    log::info!("Admin panel mounted at: {}", admin_mount);

    let mut rocket = rocket
        .manage(site)
        .manage(media)
        .manage(password)
        .manage(Arc::new(RateLimiter::new()))
        .manage(AdminSlug(cfg.admin_slug.clone()))
        .manage(cfg)
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .attach(tasks::BackgroundTasks)
        .mount("/static", FileServer::from("website/static"));

    if let Some((public_base, local_root)) = uploads {
        rocket = rocket.mount(public_base.as_str(), FileServer::from(local_root));
    }

    rocket
        .mount("/", routes::public::routes())
        .mount(&admin_mount, routes::admin::routes())
        .mount(&admin_mount, routes::security::routes())
        .register("/", catchers![not_found, server_error])
}

fn fatal(what: &str, err: String) -> ! {
    log::error!("{}: {}", what, err);
    std::process::exit(1);
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let rocket = rocket::build();
    let cfg = site_config(&rocket).unwrap_or_else(|e| fatal("Configuration error", e));

    // Create missing directories and verify templates before anything else touches disk
    boot::run(&cfg);

    let store = store::open(&cfg).unwrap_or_else(|e| fatal("Failed to open content store", e));
    let media = storage::open(&cfg.storage).unwrap_or_else(|e| fatal("Failed to set up storage", e));
    let password = auth::AdminPassword::from_config(&cfg.admin_password, bcrypt::DEFAULT_COST)
        .unwrap_or_else(|e| fatal("Failed to hash admin password", e));
    let site = SiteStore::load(store);

    assemble(rocket, cfg, site, media, password)
}
