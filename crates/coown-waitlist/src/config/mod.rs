use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

use crate::waitlist::countdown::CommunityLinks;
use crate::waitlist::gateway::ScriptTransport;

pub const DEFAULT_AIRTABLE_API_BASE: &str = "https://api.airtable.com/v0";
pub const DEFAULT_TABLE_NAME: &str = "Waitlist";

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub waitlist: WaitlistConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            waitlist: WaitlistConfig::from_env()?,
        })
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
}

/// Which spreadsheet service receives waitlist entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Airtable,
    GoogleSheets,
}

impl BackendKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "airtable" => Some(Self::Airtable),
            "google_sheets" | "google-sheets" | "sheets" => Some(Self::GoogleSheets),
            _ => None,
        }
    }
}

/// Airtable credentials. Missing values are reported at submission time.
#[derive(Debug, Clone)]
pub struct AirtableSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table_name: String,
}

/// Google Apps Script web app that appends rows to the waitlist sheet.
#[derive(Debug, Clone)]
pub struct GoogleScriptSettings {
    pub url: Option<Url>,
    pub transport: ScriptTransport,
}

/// Waitlist backend selection, outbound limits and post-signup redirect.
#[derive(Debug, Clone)]
pub struct WaitlistConfig {
    pub backend: BackendKind,
    pub airtable: AirtableSettings,
    pub google_script: GoogleScriptSettings,
    pub request_timeout: Duration,
    pub community: CommunityLinks,
    pub redirect_after_secs: u64,
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Airtable,
            airtable: AirtableSettings {
                api_base: DEFAULT_AIRTABLE_API_BASE.to_string(),
                api_key: None,
                base_id: None,
                table_name: DEFAULT_TABLE_NAME.to_string(),
            },
            google_script: GoogleScriptSettings {
                url: None,
                transport: ScriptTransport::Query,
            },
            request_timeout: Duration::from_secs(10),
            community: CommunityLinks::default(),
            redirect_after_secs: 5,
        }
    }
}

impl WaitlistConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match optional_var("WAITLIST_BACKEND") {
            Some(raw) => BackendKind::parse(&raw).ok_or(ConfigError::InvalidBackend(raw))?,
            None => defaults.backend,
        };

        let transport = match optional_var("GOOGLE_SCRIPT_TRANSPORT") {
            Some(raw) => {
                ScriptTransport::parse(&raw).ok_or(ConfigError::InvalidTransport(raw))?
            }
            None => defaults.google_script.transport,
        };

        let request_timeout = match optional_var("WAITLIST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_seconds("WAITLIST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let redirect_after_secs = match optional_var("WAITLIST_REDIRECT_SECS") {
            Some(raw) => parse_seconds("WAITLIST_REDIRECT_SECS", &raw)?,
            None => defaults.redirect_after_secs,
        };

        Ok(Self {
            backend,
            airtable: AirtableSettings {
                api_base: optional_var("AIRTABLE_API_URL")
                    .unwrap_or(defaults.airtable.api_base),
                api_key: optional_var("AIRTABLE_API_KEY"),
                base_id: optional_var("AIRTABLE_BASE_ID"),
                table_name: optional_var("AIRTABLE_TABLE_NAME")
                    .unwrap_or(defaults.airtable.table_name),
            },
            google_script: GoogleScriptSettings {
                url: optional_url("GOOGLE_SCRIPT_URL")?,
                transport,
            },
            request_timeout,
            community: CommunityLinks {
                co_owner: optional_url("COOWNER_COMMUNITY_URL")?,
                realtor: optional_url("REALTOR_COMMUNITY_URL")?,
            },
            redirect_after_secs,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn optional_url(name: &'static str) -> Result<Option<Url>, ConfigError> {
    optional_var(name)
        .map(|raw| Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { name, source }))
        .transpose()
}

fn parse_seconds(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>()
        .map_err(|_| ConfigError::InvalidSeconds { name })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidBackend(String),
    InvalidTransport(String),
    InvalidSeconds {
        name: &'static str,
    },
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBackend(value) => write!(
                f,
                "WAITLIST_BACKEND must be 'airtable' or 'google_sheets' (got '{value}')"
            ),
            ConfigError::InvalidTransport(value) => write!(
                f,
                "GOOGLE_SCRIPT_TRANSPORT must be 'query' or 'plain_text_post' (got '{value}')"
            ),
            ConfigError::InvalidSeconds { name } => {
                write!(f, "{name} must be a whole number of seconds")
            }
            ConfigError::InvalidUrl { name, .. } => write!(f, "{name} must be an absolute URL"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidUrl { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBackend(_)
            | ConfigError::InvalidTransport(_)
            | ConfigError::InvalidSeconds { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const VARS: [&str; 15] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "WAITLIST_BACKEND",
        "AIRTABLE_API_URL",
        "AIRTABLE_API_KEY",
        "AIRTABLE_BASE_ID",
        "AIRTABLE_TABLE_NAME",
        "GOOGLE_SCRIPT_URL",
        "GOOGLE_SCRIPT_TRANSPORT",
        "WAITLIST_TIMEOUT_SECS",
        "WAITLIST_REDIRECT_SECS",
        "COOWNER_COMMUNITY_URL",
        "REALTOR_COMMUNITY_URL",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.waitlist.backend, BackendKind::Airtable);
        assert_eq!(config.waitlist.airtable.table_name, "Waitlist");
        assert!(config.waitlist.airtable.api_key.is_none());
        assert_eq!(config.waitlist.redirect_after_secs, 5);
        assert_eq!(config.waitlist.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_google_sheets_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAITLIST_BACKEND", "google_sheets");
        env::set_var(
            "GOOGLE_SCRIPT_URL",
            "https://script.google.com/macros/s/abc/exec",
        );
        env::set_var("GOOGLE_SCRIPT_TRANSPORT", "plain_text_post");
        env::set_var("REALTOR_COMMUNITY_URL", "https://chat.example.com/realtors");

        let config = WaitlistConfig::from_env().expect("config loads");
        assert_eq!(config.backend, BackendKind::GoogleSheets);
        assert_eq!(config.google_script.transport, ScriptTransport::PlainTextPost);
        assert!(config.google_script.url.is_some());
        assert!(config.community.co_owner.is_none());
        assert_eq!(
            config.community.realtor.as_ref().map(Url::as_str),
            Some("https://chat.example.com/realtors")
        );
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("AIRTABLE_API_KEY", "   ");
        env::set_var("AIRTABLE_TABLE_NAME", "");

        let config = WaitlistConfig::from_env().expect("config loads");
        assert!(config.airtable.api_key.is_none());
        assert_eq!(config.airtable.table_name, "Waitlist");
    }

    #[test]
    fn rejects_unknown_backend_and_bad_urls() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WAITLIST_BACKEND", "mailchimp");
        assert!(matches!(
            WaitlistConfig::from_env(),
            Err(ConfigError::InvalidBackend(value)) if value == "mailchimp"
        ));

        reset_env();
        env::set_var("COOWNER_COMMUNITY_URL", "not a url");
        assert!(matches!(
            WaitlistConfig::from_env(),
            Err(ConfigError::InvalidUrl {
                name: "COOWNER_COMMUNITY_URL",
                ..
            })
        ));

        reset_env();
        env::set_var("WAITLIST_REDIRECT_SECS", "five");
        assert!(matches!(
            WaitlistConfig::from_env(),
            Err(ConfigError::InvalidSeconds {
                name: "WAITLIST_REDIRECT_SECS"
            })
        ));
    }
}
