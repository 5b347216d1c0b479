/// Server configuration
///
/// # Environment variables
///
/// All settings can be overridden via environment variables:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | DATA_DIR | /var/lib/fulfillment | Data directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | CARRIER_API_URL | http://localhost:4100 | Carrier API base URL |
/// | CARRIER_TIMEOUT_MS | 30000 | Carrier call timeout (ms) |
/// | CARRIER_CONNECT_TIMEOUT_MS | 10000 | Carrier connectivity timeout (ms) |
/// | TRACKING_SYNC_INTERVAL_SECS | 900 | Periodic tracking sync interval |
///
/// # Example
///
/// ```ignore
/// DATA_DIR=/data/fulfillment HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory for the embedded database and log files
    pub data_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Carrier API base URL
    pub carrier_api_url: String,
    /// Hard timeout for carrier API calls (ms)
    pub carrier_timeout_ms: u64,
    /// Timeout for the carrier connectivity probe (ms)
    pub carrier_connect_timeout_ms: u64,
    /// Interval between periodic tracking sync runs (seconds)
    pub tracking_sync_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/var/lib/fulfillment".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            carrier_api_url: std::env::var("CARRIER_API_URL")
                .unwrap_or_else(|_| "http://localhost:4100".into()),
            carrier_timeout_ms: std::env::var("CARRIER_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            carrier_connect_timeout_ms: std::env::var("CARRIER_CONNECT_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
            tracking_sync_interval_secs: std::env::var("TRACKING_SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(900),
        }
    }

    /// Override the fields tests commonly need
    pub fn with_overrides(data_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Path of the embedded database file
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("fulfillment.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::with_overrides("/tmp/fulfillment-test", 0);
        assert_eq!(config.data_dir, "/tmp/fulfillment-test");
        assert_eq!(config.http_port, 0);
        assert_eq!(config.carrier_timeout_ms, 30000);
        assert_eq!(config.carrier_connect_timeout_ms, 10000);
    }

    #[test]
    fn test_database_path() {
        let config = Config::with_overrides("/tmp/x", 0);
        assert_eq!(
            config.database_path(),
            std::path::PathBuf::from("/tmp/x/fulfillment.redb")
        );
    }
}
