use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::rule_engine::RuleThresholds;
use crate::utils::StringExt;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub mysql: MySQLConfig,
    pub rules: RuleThresholds,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection parameters for the analysed server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MySQLConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Schema holding the server-wide statement statistics (default: performance_schema)
    pub statistics_schema: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Whether the diagnostics snapshot endpoint is served (default: true)
    pub snapshot_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "querylens")]
#[command(version, about = "querylens - SQL query performance analysis for MySQL")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// MySQL host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub mysql_host: Option<String>,

    /// MySQL port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub mysql_port: Option<u16>,

    /// MySQL user (overrides config file)
    #[arg(long, value_name = "USER")]
    pub mysql_user: Option<String>,

    /// MySQL password (overrides config file)
    #[arg(long, value_name = "PASSWORD")]
    pub mysql_password: Option<String>,

    /// Column or identifier whose presence in hot digests should be reported
    #[arg(long, value_name = "MARKER")]
    pub hot_field: Option<String>,

    /// Enable/disable the diagnostics snapshot endpoint
    #[arg(long, value_name = "BOOL")]
    pub snapshot_enabled: Option<bool>,

    /// Logging level (overrides config file, e.g., "info,querylens=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_, `.env` is honoured)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();
        Self::load_with_args(&cli_args)
    }

    pub fn load_with_args(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!("Loaded environment from {}", path.display());
        }
        config.apply_env_overrides(|key| std::env::var(key).ok());

        config.apply_cli_overrides(cli_args);

        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_MYSQL_HOST / APP_MYSQL_PORT / APP_MYSQL_USER / APP_MYSQL_PASSWORD
    /// - APP_MYSQL_STATISTICS_SCHEMA
    /// - APP_HOT_FIELD
    /// - APP_SNAPSHOT_ENABLED (true/false)
    /// - APP_LOG_LEVEL
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Some(port) = var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Some(host) = var("APP_MYSQL_HOST") {
            self.mysql.host = host;
            tracing::info!("Override mysql.host from env: {}", self.mysql.host);
        }

        if let Some(port) = var("APP_MYSQL_PORT")
            && let Ok(port) = port.parse()
        {
            self.mysql.port = port;
            tracing::info!("Override mysql.port from env: {}", self.mysql.port);
        }

        if let Some(user) = var("APP_MYSQL_USER") {
            self.mysql.user = user;
            tracing::info!("Override mysql.user from env: {}", self.mysql.user);
        }

        if let Some(password) = var("APP_MYSQL_PASSWORD") {
            self.mysql.password = password;
            tracing::info!("Override mysql.password from env");
        }

        if let Some(schema) = var("APP_MYSQL_STATISTICS_SCHEMA") {
            self.mysql.statistics_schema = schema;
            tracing::info!(
                "Override mysql.statistics_schema from env: {}",
                self.mysql.statistics_schema
            );
        }

        if let Some(marker) = var("APP_HOT_FIELD") {
            self.rules.hot_field = marker.clean();
            tracing::info!("Override rules.hot_field from env: {:?}", self.rules.hot_field);
        }

        if let Some(enabled) = var("APP_SNAPSHOT_ENABLED")
            && let Ok(val) = enabled.parse()
        {
            self.diagnostics.snapshot_enabled = val;
            tracing::info!(
                "Override diagnostics.snapshot_enabled from env: {}",
                self.diagnostics.snapshot_enabled
            );
        }

        if let Some(level) = var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(host) = &args.mysql_host {
            self.mysql.host = host.clone();
            tracing::info!("Override mysql.host from CLI: {}", self.mysql.host);
        }

        if let Some(port) = args.mysql_port {
            self.mysql.port = port;
            tracing::info!("Override mysql.port from CLI: {}", self.mysql.port);
        }

        if let Some(user) = &args.mysql_user {
            self.mysql.user = user.clone();
            tracing::info!("Override mysql.user from CLI: {}", self.mysql.user);
        }

        if let Some(password) = &args.mysql_password {
            self.mysql.password = password.clone();
            tracing::info!("Override mysql.password from CLI");
        }

        if let Some(marker) = &args.hot_field {
            self.rules.hot_field = marker.clean();
            tracing::info!("Override rules.hot_field from CLI: {:?}", self.rules.hot_field);
        }

        if let Some(enabled) = args.snapshot_enabled {
            self.diagnostics.snapshot_enabled = enabled;
            tracing::info!("Override diagnostics.snapshot_enabled from CLI: {}", enabled);
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.mysql.host.trim().is_empty() {
            anyhow::bail!("mysql.host cannot be empty");
        }
        if self.mysql.port == 0 {
            anyhow::bail!("mysql.port cannot be 0");
        }
        if self.mysql.statistics_schema.trim().is_empty() {
            anyhow::bail!("mysql.statistics_schema cannot be empty");
        }

        if self.rules.frequent_execution_count == 0 {
            anyhow::bail!("rules.frequent_execution_count must be > 0");
        }
        if self.rules.slow_average_secs <= 0.0 || self.rules.heavy_total_secs <= 0.0 {
            anyhow::bail!("rules.slow_average_secs and rules.heavy_total_secs must be > 0");
        }

        if self.mysql.password.is_empty() {
            tracing::warn!("Connecting to MySQL without a password");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml"];

        possible_paths.iter().find(|p| Path::new(p).exists()).map(|p| p.to_string())
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl Default for MySQLConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            statistics_schema: "performance_schema".to_string(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { snapshot_enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,querylens=debug".to_string(), file: None }
    }
}

impl LoggingConfig {
    /// Directory and file prefix for the daily rolling appender
    ///
    /// A bare file name lands in `logs/`. The `.log` suffix is dropped because the
    /// appender adds a date suffix of its own.
    pub fn file_location(&self) -> Option<(PathBuf, String)> {
        let log_path = Path::new(self.file.as_deref()?.trim());
        let dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_name = log_path.file_name().and_then(|n| n.to_str()).unwrap_or("querylens.log");
        let prefix = file_name.strip_suffix(".log").unwrap_or(file_name).to_string();
        Some((dir, prefix))
    }
}
