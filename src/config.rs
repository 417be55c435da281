use serde::Deserialize;
use std::net::SocketAddr;

use crate::store::FileStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub static_files: StaticFilesConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Storage settings for the managed file directory
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub base_dir: String,
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
}

/// Front-end directory served for paths outside the API surface
#[derive(Debug, Deserialize, Clone)]
pub struct StaticFilesConfig {
    pub dir: String,
    pub index_files: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("FILEPAD"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8003)?
            .set_default("storage.base_dir", "data")?
            .set_default("storage.max_file_size", 1_048_576)? // 1MB
            .set_default(
                "storage.allowed_extensions",
                vec!["txt", "md", "json", "csv", "py"],
            )?
            .set_default("static_files.dir", "static")?
            .set_default("static_files.index_files", vec!["index.html"])?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Shared application state passed to every request handler
pub struct AppState {
    pub config: Config,
    pub store: FileStore,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            store: FileStore::new(&config.storage),
        }
    }
}
