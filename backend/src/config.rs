//! # Configuration
//!
//! Runtime settings for the registration service. Every value has a default
//! suitable for local development and can be overridden with an environment
//! variable prefixed with `REGISTRATION_`.

use chrono::Duration;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "sqlite:registrations.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:3000/uploads";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8080";
const DEFAULT_SESSION_HOURS: i64 = 24;
const DEFAULT_FORM_IDLE_MINUTES: i64 = 60;

/// Credentials and lifetime for the admin dashboard login
#[derive(Debug, Clone, PartialEq)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub session_hours: i64,
}

impl AdminConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_hours)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "1234".to_string(),
            session_hours: DEFAULT_SESSION_HOURS,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    /// Base URL under which uploaded profile images are publicly served
    pub public_base_url: String,
    pub allowed_origin: String,
    pub admin: AdminConfig,
    /// Registration form sessions unused for this long are dropped
    pub form_idle_minutes: i64,
    /// Default `EnvFilter` directive when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            admin: AdminConfig::default(),
            form_idle_minutes: DEFAULT_FORM_IDLE_MINUTES,
            log_level: "info".to_string(),
        }
    }
}

/// Parse a positive whole number, or fall back and say why
fn positive_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: i64,
    warnings: &mut Vec<String>,
) -> i64 {
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value > 0 => value,
            _ => {
                warnings.push(format!("Invalid {} '{}', using {}", key, raw, default));
                default
            }
        },
        None => default,
    }
}

impl AppConfig {
    /// Build configuration from the process environment
    pub fn from_env() -> (Self, Vec<String>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults; the returned warnings
    /// describe each fallback so they can be logged once logging is up.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut warnings = Vec::new();

        let bind_addr = match lookup("REGISTRATION_BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warnings.push(format!(
                    "Invalid REGISTRATION_BIND_ADDR '{}', using {}",
                    raw, DEFAULT_BIND_ADDR
                ));
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let session_hours = positive_number(
            &lookup,
            "REGISTRATION_ADMIN_SESSION_HOURS",
            DEFAULT_SESSION_HOURS,
            &mut warnings,
        );
        let form_idle_minutes = positive_number(
            &lookup,
            "REGISTRATION_FORM_IDLE_MINUTES",
            DEFAULT_FORM_IDLE_MINUTES,
            &mut warnings,
        );

        let config = Self {
            database_url: lookup("REGISTRATION_DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr,
            upload_dir: lookup("REGISTRATION_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_base_url: lookup("REGISTRATION_PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            allowed_origin: lookup("REGISTRATION_ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            admin: AdminConfig {
                username: lookup("REGISTRATION_ADMIN_USERNAME").unwrap_or(defaults.admin.username),
                password: lookup("REGISTRATION_ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
                session_hours,
            },
            form_idle_minutes,
            log_level: lookup("REGISTRATION_LOG_LEVEL").unwrap_or(defaults.log_level),
        };
        (config, warnings)
    }

    pub fn form_idle_timeout(&self) -> Duration {
        Duration::minutes(self.form_idle_minutes)
    }
}
