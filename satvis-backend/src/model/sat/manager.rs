use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use satvis_common::{SatelliteCategory, SatelliteSummary};

use super::cache::CacheManager;
use super::fetcher::{HttpTleFetcher, TleFetcher};
use super::transmitter::TransmitterFetcher;
use super::types::{
    CatalogSnapshot, SatelliteRecord, TleSourceConfig, TransmitterReport, UpdateReport,
    normalize_id,
};

/// SatNOGS requests in flight at once
const TRANSMITTER_CONCURRENCY: usize = 4;

/// Read side of the satellite catalog, as seen by the query handlers
#[async_trait]
pub trait SatelliteDirectory: Send + Sync {
    /// Look up a satellite by identifier (trimmed, case-insensitive)
    async fn find(&self, id: &str) -> Option<SatelliteRecord>;

    /// All satellites, optionally restricted to one category, sorted by name
    async fn list(&self, category: Option<SatelliteCategory>) -> Vec<SatelliteSummary>;

    /// Case-insensitive substring match on name or identifier
    async fn search(&self, query: &str) -> Vec<SatelliteSummary>;

    /// Time of the last successful refresh
    async fn last_update(&self) -> Option<DateTime<Utc>>;

    /// Time of the last transmitter refresh
    async fn transmitters_last_update(&self) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Default)]
struct Catalog {
    /// Keyed by normalized identifier
    satellites: HashMap<String, SatelliteRecord>,
    updated_at: Option<DateTime<Utc>>,
    transmitters_updated_at: Option<DateTime<Utc>>,
}

impl Catalog {
    fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let satellites = snapshot
            .satellites
            .into_iter()
            .map(|record| (record.key(), record))
            .collect();
        Self {
            satellites,
            updated_at: snapshot.updated_at,
            transmitters_updated_at: snapshot.transmitters_updated_at,
        }
    }

    fn to_snapshot(&self) -> CatalogSnapshot {
        let mut satellites: Vec<SatelliteRecord> = self.satellites.values().cloned().collect();
        satellites.sort_by(|a, b| a.id.cmp(&b.id));
        CatalogSnapshot {
            updated_at: self.updated_at,
            satellites,
            transmitters_updated_at: self.transmitters_updated_at,
        }
    }
}

/// Satellite catalog: loaded from the cache at start-up, refreshed from
/// the configured TLE sources by the updater.
pub struct SatelliteManager {
    fetcher: Arc<dyn TleFetcher>,

    cache_manager: CacheManager,

    sources: Vec<TleSourceConfig>,

    catalog: Arc<RwLock<Catalog>>,
}

impl SatelliteManager {
    /// Manager fetching over HTTP
    pub fn new<P: AsRef<Path>>(cache_dir: P, sources: Vec<TleSourceConfig>) -> Result<Arc<Self>> {
        let fetcher = Arc::new(HttpTleFetcher::new()?);
        Ok(Self::with_fetcher(cache_dir, sources, fetcher))
    }

    pub fn with_fetcher<P: AsRef<Path>>(
        cache_dir: P,
        sources: Vec<TleSourceConfig>,
        fetcher: Arc<dyn TleFetcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            cache_manager: CacheManager::new(cache_dir),
            sources,
            catalog: Arc::new(RwLock::new(Catalog::default())),
        })
    }

    /// Load the cached catalog
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing satellite catalog...");

        self.cache_manager.ensure_cache_dir().await?;

        match self.cache_manager.load_catalog().await {
            Ok(snapshot) => {
                let catalog = Catalog::from_snapshot(snapshot);
                info!(
                    "Catalog ready with {} satellites (last update: {})",
                    catalog.satellites.len(),
                    catalog
                        .updated_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string())
                );
                *self.catalog.write().await = catalog;
            }
            Err(e) => {
                warn!("Failed to load catalog cache: {:#}, starting empty", e);
            }
        }

        Ok(())
    }

    /// Refresh from every source.
    ///
    /// Records of a category whose source failed are kept from the previous
    /// catalog. Errors only if no source succeeded.
    pub async fn update_all_satellites(&self) -> Result<UpdateReport> {
        let run_id = uuid::Uuid::now_v7();
        let start_time = std::time::Instant::now();
        let mut report = UpdateReport::default();

        info!("[{}] Refreshing catalog from {} sources", run_id, self.sources.len());

        let results = join_all(
            self.sources
                .iter()
                .map(|source| async move { (source, self.fetcher.fetch(source).await) }),
        )
        .await;

        let mut fetched = Vec::new();
        let mut refreshed_categories = HashSet::new();
        for (source, result) in results {
            match result {
                Ok(records) => {
                    debug!("[{}] {} -> {} element sets", run_id, source.url, records.len());
                    refreshed_categories.insert(source.category);
                    fetched.extend(records);
                    report.successful_sources += 1;
                }
                Err(e) => {
                    error!("[{}] Source {} failed: {:#}", run_id, source.url, e);
                    report.failed_sources.push(source.url.clone());
                }
            }
        }

        if report.successful_sources == 0 {
            anyhow::bail!("All {} TLE sources failed", self.sources.len());
        }

        let snapshot = {
            let mut catalog = self.catalog.write().await;

            let mut satellites: HashMap<String, SatelliteRecord> = catalog
                .satellites
                .iter()
                .filter(|(_, record)| !refreshed_categories.contains(&record.category))
                .map(|(key, record)| (key.clone(), record.clone()))
                .collect();

            for mut record in fetched {
                let key = record.key();
                match catalog.satellites.get(&key) {
                    Some(previous) => record.transmitters = previous.transmitters.clone(),
                    None => report.new_satellites.push(record.id.clone()),
                }
                // later sources win on duplicate identifiers
                satellites.insert(key, record);
            }

            catalog.satellites = satellites;
            catalog.updated_at = Some(Utc::now());
            report.total_satellites = catalog.satellites.len();
            catalog.to_snapshot()
        };

        self.cache_manager.save_catalog(&snapshot).await?;

        report.duration_seconds = start_time.elapsed().as_secs_f64();
        info!(
            "[{}] Catalog refreshed: {} satellites, {} new, {} failed sources",
            run_id,
            report.total_satellites,
            report.new_satellites.len(),
            report.failed_sources.len()
        );
        Ok(report)
    }

    /// Refresh the transmitter list of every satellite with a NORAD number.
    ///
    /// A satellite whose request fails keeps its previous list. The refresh
    /// time is recorded even when nothing changed.
    pub async fn update_all_transmitters(
        &self,
        fetcher: &dyn TransmitterFetcher,
    ) -> Result<TransmitterReport> {
        let run_id = uuid::Uuid::now_v7();
        let start_time = std::time::Instant::now();
        let mut report = TransmitterReport::default();

        let targets: Vec<(String, u32)> = {
            let catalog = self.catalog.read().await;
            catalog
                .satellites
                .iter()
                .filter_map(|(key, record)| record.norad_id().map(|norad| (key.clone(), norad)))
                .collect()
        };
        report.checked = targets.len();
        info!("[{}] Refreshing transmitters for {} satellites", run_id, targets.len());

        let results: Vec<(String, u32, Result<_>)> = stream::iter(targets)
            .map(|(key, norad)| async move { (key, norad, fetcher.fetch(norad).await) })
            .buffer_unordered(TRANSMITTER_CONCURRENCY)
            .collect()
            .await;

        let snapshot = {
            let mut catalog = self.catalog.write().await;
            for (key, norad, result) in results {
                match result {
                    Ok(transmitters) => {
                        // the element refresh may have dropped it meanwhile
                        if let Some(record) = catalog.satellites.get_mut(&key) {
                            if record.transmitters != transmitters {
                                record.transmitters = transmitters;
                                report.changed += 1;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("[{}] Transmitters for NORAD {} failed: {:#}", run_id, norad, e);
                        report.failed.push(key);
                    }
                }
            }
            catalog.transmitters_updated_at = Some(Utc::now());
            catalog.to_snapshot()
        };

        self.cache_manager.save_catalog(&snapshot).await?;

        report.duration_seconds = start_time.elapsed().as_secs_f64();
        info!(
            "[{}] Transmitters refreshed: {} checked, {} changed, {} failed",
            run_id,
            report.checked,
            report.changed,
            report.failed.len()
        );
        Ok(report)
    }

    /// Number of satellites in the catalog
    pub async fn satellite_count(&self) -> usize {
        self.catalog.read().await.satellites.len()
    }
}

#[async_trait]
impl SatelliteDirectory for SatelliteManager {
    async fn find(&self, id: &str) -> Option<SatelliteRecord> {
        let catalog = self.catalog.read().await;
        catalog.satellites.get(&normalize_id(id)).cloned()
    }

    async fn list(&self, category: Option<SatelliteCategory>) -> Vec<SatelliteSummary> {
        let catalog = self.catalog.read().await;
        let mut summaries: Vec<SatelliteSummary> = catalog
            .satellites
            .values()
            .filter(|record| category.is_none_or(|c| record.category == c))
            .map(SatelliteRecord::to_summary)
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    async fn search(&self, query: &str) -> Vec<SatelliteSummary> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SatelliteSummary> = {
            let catalog = self.catalog.read().await;
            catalog
                .satellites
                .values()
                .filter(|record| {
                    record.name.to_lowercase().contains(&query_lower)
                        || record.id.to_lowercase().contains(&query_lower)
                })
                .map(SatelliteRecord::to_summary)
                .collect()
        };
        results.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("Search '{}' found {} results", query, results.len());
        results
    }

    async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.catalog.read().await.updated_at
    }

    async fn transmitters_last_update(&self) -> Option<DateTime<Utc>> {
        self.catalog.read().await.transmitters_updated_at
    }
}
