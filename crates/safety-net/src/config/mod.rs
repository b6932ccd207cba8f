use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

pub const DEFAULT_GENERATOR_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_GENERATOR_MODEL: &str = "gemini-1.5-flash";

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub generator: GeneratorConfig,
    pub sources: PolicySources,
    pub forms: FormsConfig,
    pub batch: BatchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let generator = GeneratorConfig {
            api_key: optional_var("TEXT_GENERATOR_API_KEY"),
            base_url: optional_var("TEXT_GENERATOR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GENERATOR_BASE_URL.to_string()),
            model: optional_var("TEXT_GENERATOR_MODEL")
                .unwrap_or_else(|| DEFAULT_GENERATOR_MODEL.to_string()),
            timeout: Duration::from_secs(parse_var("TEXT_GENERATOR_TIMEOUT_SECS", 30)?),
        };

        let sources = PolicySources {
            policy_path: optional_var("APP_POLICY_PATH").map(PathBuf::from),
            schemes_csv: optional_var("APP_SCHEMES_CSV").map(PathBuf::from),
        };

        let forms = FormsConfig {
            output_dir: optional_var("APP_FORMS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("generated_forms")),
        };

        let max_concurrency = parse_var("APP_BATCH_CONCURRENCY", 4usize)?;
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "APP_BATCH_CONCURRENCY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            generator,
            sources,
            forms,
            batch: BatchConfig { max_concurrency },
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output is only enabled for local development.
    pub ansi: bool,
}

/// Connection details for the external text-generation service.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Optional files overriding the built-in scoring policy and scheme table.
#[derive(Debug, Clone, Default)]
pub struct PolicySources {
    pub policy_path: Option<PathBuf>,
    pub schemes_csv: Option<PathBuf>,
}

/// Where rendered aid applications are written.
#[derive(Debug, Clone)]
pub struct FormsConfig {
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub max_concurrency: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
