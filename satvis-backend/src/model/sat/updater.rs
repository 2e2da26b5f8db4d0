///! Scheduled catalog and transmitter refresh
use super::manager::SatelliteManager;
use super::transmitter::TransmitterFetcher;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 60;
const CATALOG_TIMEOUT_SECONDS: u64 = 300;
const TRANSMITTER_TIMEOUT_SECONDS: u64 = 1800;

/// What a `SatelliteUpdater` refreshes
#[derive(Clone)]
pub enum UpdateJob {
    /// Element sets from the TLE sources
    Catalog,
    /// Per-satellite transmitter lists
    Transmitters(Arc<dyn TransmitterFetcher>),
}

impl UpdateJob {
    fn label(&self) -> &'static str {
        match self {
            UpdateJob::Catalog => "Catalog",
            UpdateJob::Transmitters(_) => "Transmitter",
        }
    }

    fn timeout(&self) -> Duration {
        match self {
            UpdateJob::Catalog => Duration::from_secs(CATALOG_TIMEOUT_SECONDS),
            UpdateJob::Transmitters(_) => Duration::from_secs(TRANSMITTER_TIMEOUT_SECONDS),
        }
    }
}

/// Refresh intervals, in minutes
#[derive(Debug, Clone, Copy)]
pub struct UpdateIntervals {
    pub catalog_minutes: u64,
    pub transmitter_minutes: u64,
}

/// Runs one `UpdateJob` on a fixed interval
pub struct SatelliteUpdater {
    manager: Arc<SatelliteManager>,
    job: UpdateJob,
    update_interval_minutes: u64,
}

impl SatelliteUpdater {
    pub fn new(manager: Arc<SatelliteManager>, job: UpdateJob, update_interval_minutes: u64) -> Self {
        Self {
            manager,
            job,
            update_interval_minutes: update_interval_minutes.max(1),
        }
    }

    async fn run_scheduled_loop(&self) {
        let label = self.job.label();
        loop {
            let now = Utc::now();
            let next_trigger = self.calculate_next_trigger(now);
            let sleep_duration = (next_trigger - now)
                .to_std()
                .unwrap_or(Duration::from_secs(60));

            tracing::info!(
                "Next {} update scheduled at: {} (in {:.1} minutes)",
                label.to_lowercase(),
                next_trigger.format("%Y-%m-%d %H:%M:%S UTC"),
                sleep_duration.as_secs_f64() / 60.0
            );

            tokio::time::sleep(sleep_duration).await;

            self.run_update_cycle().await;
        }
    }

    /// One refresh with timeout and retries
    async fn run_update_cycle(&self) {
        let label = self.job.label();
        for attempt in 1..=MAX_RETRIES {
            tracing::info!(
                "Starting {} update (attempt {}/{})",
                label.to_lowercase(),
                attempt,
                MAX_RETRIES
            );

            match tokio::time::timeout(self.job.timeout(), self.run_job()).await {
                Ok(Ok(())) => break,
                Ok(Err(e)) => {
                    tracing::error!(
                        "✗ {} update failed (attempt {}/{}): {:#}",
                        label,
                        attempt,
                        MAX_RETRIES,
                        e
                    );
                }
                Err(_) => {
                    tracing::error!(
                        "✗ {} update timed out after {}s (attempt {}/{})",
                        label,
                        self.job.timeout().as_secs(),
                        attempt,
                        MAX_RETRIES
                    );
                }
            }

            if attempt < MAX_RETRIES {
                let delay = Duration::from_secs(RETRY_DELAY_SECONDS * attempt as u64);
                tracing::info!("Retrying in {:?}...", delay);
                tokio::time::sleep(delay).await;
            } else {
                tracing::error!(
                    "{} update failed after {} attempts, keeping previous data",
                    label,
                    MAX_RETRIES
                );
            }
        }
    }

    async fn run_job(&self) -> anyhow::Result<()> {
        match &self.job {
            UpdateJob::Catalog => {
                let report = self.manager.update_all_satellites().await?;
                tracing::info!(
                    "✓ Catalog update completed: {} satellites, {} sources ok, {} failed, {:.2}s",
                    report.total_satellites,
                    report.successful_sources,
                    report.failed_sources.len(),
                    report.duration_seconds
                );
                if !report.new_satellites.is_empty() {
                    tracing::info!("New satellites: {:?}", report.new_satellites);
                }
                if !report.failed_sources.is_empty() {
                    tracing::warn!("Stale sources kept from cache: {:?}", report.failed_sources);
                }
            }
            UpdateJob::Transmitters(fetcher) => {
                let report = self.manager.update_all_transmitters(fetcher.as_ref()).await?;
                tracing::info!(
                    "✓ Transmitter update completed: {} checked, {} changed, {} failed, {:.2}s",
                    report.checked,
                    report.changed,
                    report.failed.len(),
                    report.duration_seconds
                );
            }
        }
        Ok(())
    }

    fn calculate_next_trigger(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + chrono::Duration::minutes(self.update_interval_minutes as i64)
    }
}

/// Start both refresh schedules on one background task.
///
/// Returns immediately; with `initial_update` the first catalog and
/// transmitter refresh run on that task before the schedules begin.
pub fn start_satellite_updater(
    manager: Arc<SatelliteManager>,
    transmitter_fetcher: Arc<dyn TransmitterFetcher>,
    intervals: UpdateIntervals,
    initial_update: bool,
) -> JoinHandle<()> {
    let catalog = SatelliteUpdater::new(manager.clone(), UpdateJob::Catalog, intervals.catalog_minutes);
    let transmitters = SatelliteUpdater::new(
        manager,
        UpdateJob::Transmitters(transmitter_fetcher),
        intervals.transmitter_minutes,
    );

    tracing::info!(
        "Starting satellite updater (catalog every {} min, transmitters every {} min, initial update: {})",
        catalog.update_interval_minutes,
        transmitters.update_interval_minutes,
        initial_update
    );

    tokio::spawn(async move {
        if initial_update {
            // transmitter lookups walk the element catalog
            catalog.run_update_cycle().await;
            transmitters.run_update_cycle().await;
        }
        tokio::join!(catalog.run_scheduled_loop(), transmitters.run_scheduled_loop());
    })
}
