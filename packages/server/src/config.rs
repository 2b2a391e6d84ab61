use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec![],
            max_age: 3600,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Upper bound of the connection pool. Default: 20.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens. Default: 168 (7 days).
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Bootstrap administrator, created on startup when all three are set.
    #[serde(default)]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub admin_email: Option<String>,
}

fn default_token_ttl_hours() -> i64 {
    168
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    /// Maximum size of a template file accepted by `POST /api/template/file`.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    256 * 1024
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub template: TemplateConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("HACKATHON_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 15000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("auth.token_ttl_hours", 168)?
            .set_default("template.max_upload_bytes", 256 * 1024)?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., HACKATHON__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("HACKATHON").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// The bootstrap administrator as `(name, password, email)`, if fully configured.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str, &str)> {
        match (
            self.auth.admin_name.as_deref(),
            self.auth.admin_password.as_deref(),
            self.auth.admin_email.as_deref(),
        ) {
            (Some(name), Some(password), Some(email)) => Some((name, password, email)),
            _ => None,
        }
    }
}
