use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Backend settings for the device storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Host directory the device hierarchy is mounted under.
    pub root: String,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanDefaultsConfig {
    pub root_path: String,
    pub read_concurrency: usize,
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub scan_defaults: ScanDefaultsConfig,
    pub security: Option<SecurityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: irkatalog.toml (in CWD)
        .add_source(::config::File::with_name("irkatalog").required(false));

    if let Ok(custom_path) = std::env::var("IRKATALOG_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("IRKATALOG").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    if cfg.storage.read_timeout_ms == 0 {
        return Err(anyhow::anyhow!("storage.read_timeout_ms must be > 0"));
    }
    if cfg.storage.write_timeout_ms == 0 {
        return Err(anyhow::anyhow!("storage.write_timeout_ms must be > 0"));
    }

    // Fixed groups of reads; more than 8 overwhelms the serial transport
    let c = cfg.scan_defaults.read_concurrency;
    if c == 0 || c > 8 {
        return Err(anyhow::anyhow!("scan_defaults.read_concurrency must be in 1..=8"));
    }
    if !cfg.scan_defaults.root_path.starts_with('/') {
        return Err(anyhow::anyhow!(
            "scan_defaults.root_path must be an absolute device path"
        ));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
