//! Background scheduler that refreshes stale repository caches.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::time::interval;
use tracing::{error, info};

use crate::db::repositories;
use crate::services::freshness::FreshnessPolicy;
use crate::services::sync::SyncService;

/// Maximum repositories refreshed per scan.
const SCAN_BATCH_SIZE: u64 = 25;

/// Configuration for the sync scheduler.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// How often to scan for stale repositories (in seconds)
    pub scan_interval_secs: u64,
}

/// Start the sync background task.
///
/// Spawns a tokio task that periodically scans for repositories whose cache
/// has gone stale and refreshes them one at a time. A failed repository is
/// logged and skipped; the scan itself never stops.
pub fn start_sync_task(db: DatabaseConnection, sync: Arc<SyncService>, config: SchedulerConfig) {
    tokio::spawn(async move {
        info!(
            "Starting sync scheduler (ttl: {} seconds, interval: {} seconds)",
            config.cache_ttl_secs, config.scan_interval_secs
        );

        let policy = FreshnessPolicy::new(config.cache_ttl_secs);
        let mut ticker = interval(Duration::from_secs(config.scan_interval_secs));

        loop {
            ticker.tick().await;

            if let Err(e) = run_scan(&db, &sync, &policy).await {
                error!("Sync scheduler scan error: {}", e);
            }
        }
    });
}

/// Run a single scan cycle.
async fn run_scan(
    db: &DatabaseConnection,
    sync: &SyncService,
    policy: &FreshnessPolicy,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let now = Utc::now();
    let stale = repositories::find_stale(db, now - policy.ttl(), SCAN_BATCH_SIZE).await?;

    if stale.is_empty() {
        return Ok(());
    }

    info!("Found {} stale repositories to refresh", stale.len());

    let mut refreshed = 0;
    let mut failed = 0;

    for repo in stale {
        // Double-check against the policy; rows can be refreshed between the
        // query and this point by a view-triggered sync.
        if !policy.is_stale(repo.cached_at, Utc::now()) {
            continue;
        }

        match sync.sync_all(repo.id).await {
            Ok(()) => refreshed += 1,
            // sync_all already logged the details.
            Err(_) => failed += 1,
        }
    }

    if refreshed > 0 || failed > 0 {
        info!("Sync scan: {} refreshed, {} failed", refreshed, failed);
    }

    Ok(())
}
