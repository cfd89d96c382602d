use serde::{Deserialize, Serialize};

/// Static configuration, loaded once at startup.
///
/// Sections:
/// - database: connection, pool and retry/timeout settings
/// - codes: short-code length and allocation retry bound
/// - clicks: click buffer flush tuning
/// - retention: ledger and expired-link sweep policy
/// - logging: log output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub codes: CodeConfig,
    #[serde(default)]
    pub clicks: ClickConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// Load configuration from `config.toml` and environment variables.
    ///
    /// Precedence: ENV > config.toml > defaults.
    /// ENV prefix `LF`, separator `__`, e.g. `LF__DATABASE__DATABASE_URL=...`
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        // Pick up a .env file before reading the environment
        dotenvy::dotenv().ok();

        let path = "config.toml";

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LF")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// Render a sample TOML configuration with all defaults filled in.
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// Per-operation timeout; exceeding it (after retries) surfaces as
    /// StoreUnavailable.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Short-code allocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Generated code length; 10 alphanumeric symbols make per-draw
    /// collisions negligible but not impossible.
    #[serde(default = "default_code_length")]
    pub length: usize,
    /// Bounded retry count for insert collisions before giving up with
    /// CodeSpaceExhausted.
    #[serde(default = "default_max_insert_attempts")]
    pub max_insert_attempts: usize,
}

/// Click buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickConfig {
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    /// Buffer size that triggers an early flush ahead of the interval.
    #[serde(default = "default_max_buffer_before_flush")]
    pub max_buffer_before_flush: usize,
}

/// Retention sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Click events older than this are pruned.
    #[serde(default = "default_click_retention_days")]
    pub click_retention_days: u64,
    /// Expired links are kept visible to stats for this long before the
    /// sweep deletes them (their events cascade).
    #[serde(default = "default_expired_link_grace_days")]
    pub expired_link_grace_days: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_sweep_batch_size")]
    pub batch_size: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_database_url() -> String {
    "linkforge.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_code_length() -> usize {
    10
}

fn default_max_insert_attempts() -> usize {
    5
}

fn default_flush_interval_secs() -> u64 {
    10
}

fn default_max_buffer_before_flush() -> usize {
    500
}

fn default_click_retention_days() -> u64 {
    90
}

fn default_expired_link_grace_days() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_sweep_batch_size() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            operation_timeout_ms: default_operation_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: default_code_length(),
            max_insert_attempts: default_max_insert_attempts(),
        }
    }
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval_secs(),
            max_buffer_before_flush: default_max_buffer_before_flush(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            click_retention_days: default_click_retention_days(),
            expired_link_grace_days: default_expired_link_grace_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
            batch_size: default_sweep_batch_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
