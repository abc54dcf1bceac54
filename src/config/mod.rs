use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration, read from the environment on start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding uploaded files (default: "uploads")
    pub stash_dir: PathBuf,

    /// Directory for exported results awaiting upload (default: system temp dir)
    pub export_dir: PathBuf,

    /// Maximum upload size in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Publish processed results to the object store (default: false)
    pub publish_enabled: bool,

    /// Bucket receiving published results (default: "processed-results")
    pub publish_bucket: String,

    /// Upper bound on one publish call, in seconds (default: 30)
    pub publish_timeout_secs: u64,

    /// S3 / MinIO endpoint
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    /// S3 region (default: "us-east-1")
    pub s3_region: String,

    /// Base of the URLs handed back for published objects. Falls back to the
    /// S3 endpoint.
    pub public_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stash_dir: PathBuf::from("uploads"),
            export_dir: env::temp_dir().join("sales-insights-exports"),
            max_file_size: 50 * 1024 * 1024, // 50 MB
            publish_enabled: false,
            publish_bucket: "processed-results".to_string(),
            publish_timeout_secs: 30,
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_region: "us-east-1".to_string(),
            public_base_url: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            stash_dir: lookup("STASH_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.stash_dir),

            export_dir: lookup("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.export_dir),

            max_file_size: lookup("MAX_FILE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            publish_enabled: lookup("PUBLISH_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.publish_enabled),

            publish_bucket: lookup("PUBLISH_BUCKET").unwrap_or(default.publish_bucket),

            publish_timeout_secs: lookup("PUBLISH_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.publish_timeout_secs),

            s3_endpoint: lookup("MINIO_ENDPOINT"),
            s3_access_key: lookup("MINIO_ACCESS_KEY"),
            s3_secret_key: lookup("MINIO_SECRET_KEY"),
            s3_region: lookup("MINIO_REGION").unwrap_or(default.s3_region),

            public_base_url: lookup("PUBLIC_BASE_URL"),
        }
    }

    /// Create config for local development (no publishing, paths relative to the working dir)
    pub fn development() -> Self {
        Self {
            stash_dir: PathBuf::from("uploads"),
            export_dir: PathBuf::from("exports"),
            publish_enabled: false,
            ..Self::default()
        }
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.stash_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert!(!config.publish_enabled);
        assert_eq!(config.publish_bucket, "processed-results");
        assert_eq!(config.publish_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert!(!config.publish_enabled);
        assert_eq!(config.export_dir, PathBuf::from("exports"));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STASH_DIR", "/srv/stash"),
            ("MAX_FILE_SIZE", "1024"),
            ("PUBLISH_ENABLED", "true"),
            ("PUBLISH_BUCKET", "reports"),
            ("PUBLISH_TIMEOUT_SECS", "5"),
            ("MINIO_ENDPOINT", "http://127.0.0.1:9000"),
        ]));

        assert_eq!(config.stash_dir, PathBuf::from("/srv/stash"));
        assert_eq!(config.max_file_size, 1024);
        assert!(config.publish_enabled);
        assert_eq!(config.publish_bucket, "reports");
        assert_eq!(config.publish_timeout(), Duration::from_secs(5));
        assert_eq!(config.s3_endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(config.s3_region, "us-east-1");
    }

    #[test]
    fn test_unparseable_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MAX_FILE_SIZE", "lots"),
            ("PUBLISH_ENABLED", "0"),
        ]));
        assert_eq!(config.max_file_size, AppConfig::default().max_file_size);
        assert!(!config.publish_enabled);
    }
}
