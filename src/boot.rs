use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::SiteConfig;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "website",
    "website/static",
    "website/static/css",
    "website/static/js",
    "website/templates",
    "website/templates/admin",
];

/// Templates the server cannot render pages without
pub(crate) const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/index.html.tera",
    "website/templates/admin/base.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/admin/hero.html.tera",
    "website/templates/admin/about.html.tera",
    "website/templates/admin/portfolio.html.tera",
    "website/templates/admin/services.html.tera",
    "website/templates/admin/testimonials.html.tera",
    "website/templates/admin/contact.html.tera",
    "website/templates/admin/settings.html.tera",
    "website/templates/admin/backup.html.tera",
];

/// Static assets the pages reference
const CRITICAL_STATIC: &[&str] = &[
    "website/static/css/site.css",
    "website/static/css/admin.css",
    "website/static/js/site.js",
    "website/static/js/admin.js",
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootReport {
    pub warnings: u32,
    pub errors: u32,
}

/// Check (and where possible repair) the working tree under `root`.
pub fn check(root: &Path, cfg: &SiteConfig) -> BootReport {
    let mut report = BootReport::default();

    // ── 1. Directories ─────────────────────────────────
    let mut dirs: Vec<String> = REQUIRED_DIRS.iter().map(|d| d.to_string()).collect();
    if cfg.store == "sqlite" {
        if let Some(parent) = Path::new(&cfg.sqlite_path).parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent.to_string_lossy().to_string());
            }
        }
    }
    if cfg.storage.backend == "local" {
        dirs.push(cfg.storage.local_root.clone());
    }
    for dir in &dirs {
        let path = root.join(dir);
        if !path.exists() {
            match fs::create_dir_all(&path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    report.errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !root.join(file).exists() {
            error!("  MISSING critical template: {}", file);
            report.errors += 1;
        }
    }

    // ── 3. Static assets ───────────────────────────────
    for file in CRITICAL_STATIC {
        if !root.join(file).exists() {
            warn!("  Missing static asset: {} (pages will be unstyled)", file);
            report.warnings += 1;
        }
    }

    // ── 4. Uploads directory writable ───────────────────
    if cfg.storage.backend == "local" {
        let uploads_dir = root.join(&cfg.storage.local_root);
        let test_file = uploads_dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                warn!("  Uploads directory not writable: {} (file uploads will fail)", e);
                report.warnings += 1;
            }
        }
    }

    // ── 5. Rocket.toml exists ───────────────────────────
    if !root.join("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        report.warnings += 1;
    }

    report
}

/// Run all boot checks. Call this before Rocket launches.
/// Aborts the process if critical files are absent.
pub fn run(cfg: &SiteConfig) {
    info!("Boot check starting...");
    let report = check(Path::new("."), cfg);

    if report.errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            report.errors, report.warnings
        );
        process::exit(1);
    }

    if report.warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            report.warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}
