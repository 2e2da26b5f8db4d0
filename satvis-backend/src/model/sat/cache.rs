use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::types::CatalogSnapshot;

/// Catalog file inside the cache directory
const CATALOG_FILE: &str = "satellite_catalog.json";

/// Persists the satellite catalog as JSON
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    /// Make sure the cache directory exists
    pub async fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)
                .await
                .context("Failed to create cache directory")?;
            info!("Created cache directory: {:?}", self.cache_dir);
        }
        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.cache_dir.join(CATALOG_FILE)
    }

    /// Load the cached catalog; a missing file is an empty catalog
    pub async fn load_catalog(&self) -> Result<CatalogSnapshot> {
        let path = self.catalog_path();

        if !path.exists() {
            debug!("Catalog file does not exist: {:?}", path);
            return Ok(CatalogSnapshot::default());
        }

        let content = fs::read_to_string(&path)
            .await
            .context("Failed to read catalog file")?;

        let snapshot: CatalogSnapshot =
            serde_json::from_str(&content).context("Failed to parse catalog file")?;

        info!("Loaded {} satellites from cache", snapshot.satellites.len());
        Ok(snapshot)
    }

    /// Write the catalog via a temp file and rename
    pub async fn save_catalog(&self, snapshot: &CatalogSnapshot) -> Result<()> {
        self.ensure_cache_dir().await?;

        let path = self.catalog_path();
        let tmp_path = path.with_extension("json.tmp");
        let content =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize catalog")?;

        fs::write(&tmp_path, content)
            .await
            .context("Failed to write catalog file")?;
        fs::rename(&tmp_path, &path)
            .await
            .context("Failed to move catalog file into place")?;

        debug!("Saved {} satellites to cache", snapshot.satellites.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::SatelliteRecord;
    use chrono::{TimeZone, Utc};
    use satvis_common::SatelliteCategory;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_catalog_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::new(temp_dir.path().join("nested"));

        let snapshot = CatalogSnapshot {
            updated_at: Some(Utc.with_ymd_and_hms(2026, 10, 1, 8, 30, 0).unwrap()),
            satellites: vec![SatelliteRecord::new(
                "43017",
                "AO-91",
                SatelliteCategory::Amateur,
                "1 43017U ...",
                "2 43017 ...",
            )],
            transmitters_updated_at: None,
        };

        cache.save_catalog(&snapshot).await.unwrap();
        assert!(cache.catalog_path().exists());

        let loaded = cache.load_catalog().await.unwrap();
        assert_eq!(loaded.updated_at, snapshot.updated_at);
        assert_eq!(loaded.satellites, snapshot.satellites);
    }

    #[tokio::test]
    async fn test_missing_catalog_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::new(temp_dir.path());

        let loaded = cache.load_catalog().await.unwrap();
        assert!(loaded.satellites.is_empty());
        assert!(loaded.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_catalog_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let cache = CacheManager::new(temp_dir.path());
        tokio::fs::write(cache.catalog_path(), "{ not json").await.unwrap();

        assert!(cache.load_catalog().await.is_err());
    }
}
