//! Configuration for the admin service
//!
//! Settings come from a builder or from environment variables. Connection
//! details are only checked when [`AdminConfig::connect_options`] runs, so a
//! misconfigured deployment fails once, at startup.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

use crate::error::{AdminError, Result};

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 1000;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Configuration for the admin service
#[derive(Clone)]
pub struct AdminConfig {
    /// Full connection URL; overrides the individual connection fields
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Pool size
    pub max_connections: u32,
    /// Address the HTTP server listens on
    pub bind_address: SocketAddr,
    /// Include SQL and driver messages in error responses
    pub debug: bool,
    /// Upper bound for the `limit` of a data page
    pub max_page_size: i64,
}

// Hand-written so the password never ends up in logs.
impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("max_connections", &self.max_connections)
            .field("bind_address", &self.bind_address)
            .field("debug", &self.debug)
            .field("max_page_size", &self.max_page_size)
            .finish()
    }
}

impl AdminConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdminConfigBuilder {
        AdminConfigBuilder::new()
    }

    /// Load configuration from the process environment
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `DATABASE_URL` | unset |
    /// | `DB_HOST` | `localhost` |
    /// | `DB_PORT` | `5432` |
    /// | `DB_NAME`, `DB_USER` | required unless `DATABASE_URL` is set |
    /// | `DB_PASSWORD` | unset |
    /// | `DB_MAX_CONNECTIONS` | `5` |
    /// | `BIND_ADDRESS` | `127.0.0.1:8080` |
    /// | `APP_DEBUG` | `false` |
    /// | `MAX_PAGE_SIZE` | `1000` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = AdminConfigBuilder::new();

        if let Some(url) = get("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        if let Some(host) = get("DB_HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = get("DB_PORT") {
            builder = builder.port(parse_setting("DB_PORT", &port)?);
        }
        if let Some(database) = get("DB_NAME") {
            builder = builder.database(database);
        }
        if let Some(username) = get("DB_USER") {
            builder = builder.username(username);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            builder = builder.password(password);
        }
        if let Some(max) = get("DB_MAX_CONNECTIONS") {
            builder = builder.max_connections(parse_setting("DB_MAX_CONNECTIONS", &max)?);
        }
        if let Some(addr) = get("BIND_ADDRESS") {
            builder = builder.bind_address(parse_setting("BIND_ADDRESS", &addr)?);
        }
        if let Some(debug) = get("APP_DEBUG") {
            builder = builder.debug(parse_flag("APP_DEBUG", &debug)?);
        }
        if let Some(size) = get("MAX_PAGE_SIZE") {
            builder = builder.max_page_size(parse_setting("MAX_PAGE_SIZE", &size)?);
        }

        let config = builder.build();
        config.check()?;
        Ok(config)
    }

    /// Reject settings that can never produce a working connection
    pub fn check(&self) -> Result<()> {
        if self.database_url.is_none() {
            let mut missing = Vec::new();
            if self.database.is_none() {
                missing.push("DB_NAME");
            }
            if self.username.is_none() {
                missing.push("DB_USER");
            }
            if !missing.is_empty() {
                return Err(AdminError::configuration(format!(
                    "Missing database settings: {} (or set DATABASE_URL)",
                    missing.join(", ")
                )));
            }
        }

        if self.max_connections == 0 {
            return Err(AdminError::configuration(
                "DB_MAX_CONNECTIONS must be at least 1",
            ));
        }
        if self.max_page_size < 1 {
            return Err(AdminError::configuration("MAX_PAGE_SIZE must be at least 1"));
        }

        Ok(())
    }

    /// Connection options for sqlx
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        self.check()?;

        if let Some(url) = &self.database_url {
            return PgConnectOptions::from_str(url)
                .map_err(|e| AdminError::configuration(format!("Invalid DATABASE_URL: {}", e)));
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port);

        if let Some(database) = &self.database {
            options = options.database(database);
        }
        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }

        Ok(options)
    }
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AdminError::configuration(format!("Invalid {} '{}': {}", key, value, e)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AdminError::configuration(format!(
            "Invalid {} '{}': expected true or false",
            key, value
        ))),
    }
}

/// Builder for AdminConfig
#[derive(Debug)]
pub struct AdminConfigBuilder {
    config: AdminConfig,
}

impl Default for AdminConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AdminConfig {
                database_url: None,
                host: "localhost".to_string(),
                port: DEFAULT_PORT,
                database: None,
                username: None,
                password: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
                bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
                debug: false,
                max_page_size: DEFAULT_MAX_PAGE_SIZE,
            },
        }
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Pool size (default: 5)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    /// HTTP listen address (default: 127.0.0.1:8080)
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Expose SQL and driver messages in error responses (default: false)
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Largest accepted page size (default: 1000)
    pub fn max_page_size(mut self, size: i64) -> Self {
        self.config.max_page_size = size;
        self
    }

    pub fn build(self) -> AdminConfig {
        self.config
    }
}
