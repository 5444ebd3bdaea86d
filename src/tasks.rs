use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SiteConfig;
use crate::rate_limit::{RateLimiter, LOGIN_WINDOW};
use crate::storage::{self, MediaStorage};

const RATE_LIMIT_CLEANUP_EVERY: Duration = Duration::from_secs(10 * 60);

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        // Bucket check: storage calls block, keep them off the async workers.
        match (
            rocket.state::<Arc<dyn MediaStorage>>(),
            rocket.state::<SiteConfig>(),
        ) {
            (Some(media), Some(cfg)) => {
                let media = Arc::clone(media);
                let required = cfg.storage.required_buckets.clone();
                tokio::task::spawn_blocking(move || {
                    let created = storage::ensure_buckets(&*media, &required);
                    if created > 0 {
                        log::info!("[task] Created {} missing storage buckets", created);
                    }
                });
            }
            _ => log::error!("[task] Storage not in managed state, skipping bucket check"),
        }

        // Rate limiter cleanup task
        if let Some(limiter) = rocket.state::<Arc<RateLimiter>>() {
            let limiter = Arc::clone(limiter);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(RATE_LIMIT_CLEANUP_EVERY).await;
                    let before = limiter.tracked_keys();
                    // The login window is the longest one in use.
                    limiter.cleanup(LOGIN_WINDOW);
                    let dropped = before.saturating_sub(limiter.tracked_keys());
                    if dropped > 0 {
                        log::info!("[task] Dropped {} stale rate-limit entries", dropped);
                    }
                }
            });
        }

        log::info!("[task] Background tasks started");
    }
}
