use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linkboard", about = "A single-page link feed")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Where posts are stored
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub feed: FeedConfig,
    pub pages: PagesConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite file in the data directory
    #[default]
    Local,
    /// Hosted PostgREST-style service
    Rest,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: Option<String>,
    pub api_key: String,
    pub table: String,
    /// Server-side function that increments likes atomically.
    pub increment_rpc: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// Whatever auth the backend offers
    #[default]
    Backend,
    /// External identity provider SDK
    Provider,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub kind: AuthKind,
    pub default_provider: String,
    pub redirect_url: Option<String>,
    pub provider_login_url: Option<String>,
    /// Where the provider ends its own session after we sign out.
    pub provider_logout_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub self_like_guard: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PagesConfig {
    pub cookie_name: String,
    pub idle_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Local,
            url: None,
            api_key: String::new(),
            table: "posts".to_string(),
            increment_rpc: None,
            timeout_secs: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kind: AuthKind::Backend,
            default_provider: "twitter".to_string(),
            redirect_url: None,
            provider_login_url: None,
            provider_logout_url: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            self_like_guard: true,
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            cookie_name: "linkboard_page".to_string(),
            idle_minutes: 30,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(kind) = cli.backend {
            config.backend.kind = kind;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("linkboard.db"));
        }
        if config.auth.redirect_url.is_none() {
            config.auth.redirect_url = Some(format!(
                "http://localhost:{}/auth/callback",
                config.server.port
            ));
        }

        if config.backend.kind == BackendKind::Rest && config.backend.url.is_none() {
            anyhow::bail!("backend.url is required when backend.kind = \"rest\"");
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".linkboard")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("linkboard.db"))
    }

    pub fn redirect_url(&self) -> String {
        self.auth.redirect_url.clone().unwrap_or_else(|| {
            format!("http://localhost:{}/auth/callback", self.server.port)
        })
    }
}
