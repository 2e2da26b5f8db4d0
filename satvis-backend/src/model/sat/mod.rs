///! Satellite catalog
///!
///! The directory the visibility queries read from. Loaded from the JSON
///! cache at start-up and refreshed in the background by `SatelliteUpdater`:
///! elements from CelesTrak TLE text, transmitter lists from SatNOGS.

mod types;
pub use types::{
    CatalogSnapshot, SatelliteRecord, TleSourceConfig, TransmitterReport, UpdateReport,
    default_sources, normalize_id,
};

mod parser;
pub use parser::parse_tle_text;

mod fetcher;
pub use fetcher::{HttpTleFetcher, TleFetcher};

mod transmitter;
pub use transmitter::{
    DEFAULT_TRANSMITTER_API_URL, SatnogsTransmitterFetcher, TransmitterFetcher,
    parse_transmitters,
};

mod cache;
pub use cache::CacheManager;

mod manager;
pub use manager::{SatelliteDirectory, SatelliteManager};

mod updater;
pub use updater::{SatelliteUpdater, UpdateIntervals, UpdateJob, start_satellite_updater};
