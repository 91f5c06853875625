use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Development mode. Mounts the media route that serves stored images.
    pub debug: bool,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued tokens, in hours.
    pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the image store.
    pub data_dir: PathBuf,
    /// Maximum decoded image size in bytes.
    pub max_image_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Prefix prepended to stored image paths to build `image_url`.
    pub url_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Number of cats per page on the paginated list.
    pub page_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.debug", false)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("storage.data_dir", "./data/media")?
            .set_default("storage.max_image_size", 10 * 1024 * 1024)?
            .set_default("media.url_prefix", "/media/")?
            .set_default("api.page_size", 10)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., KITTYGRAM__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("KITTYGRAM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
