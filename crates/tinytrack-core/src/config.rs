use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub cors_origins: Vec<String>,
    /// Bound on a single append; a timed-out write fails that delivery.
    pub write_timeout_ms: u64,
    /// Bound on a summary query; no partial result on timeout.
    pub query_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("TINYTRACK_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("TINYTRACK_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("TINYTRACK_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "512MB".to_string()),
            cors_origins: std::env::var("TINYTRACK_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            write_timeout_ms: std::env::var("TINYTRACK_WRITE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2_000),
            query_timeout_ms: std::env::var("TINYTRACK_QUERY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        })
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
