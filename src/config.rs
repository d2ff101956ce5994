use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use chrono_tz::Tz;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEZONE: &str = "Europe/Madrid";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// CA bundle for the database server certificate. When set the connection
    /// requires TLS and verifies the host against it.
    pub ssl_ca: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub reference_tz: Tz,
    pub cors_allow_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("DB_MAX_CONNECTIONS must be a positive integer, got '{}'", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:3000")?;

        let tz_name = get("REFERENCE_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let reference_tz = tz_name
            .parse::<Tz>()
            .map_err(|e| anyhow!("REFERENCE_TIMEZONE '{}' is not a known IANA zone: {}", tz_name, e))?;

        Ok(Self {
            database_url,
            max_connections,
            ssl_ca: get("PGSSL_CA").map(PathBuf::from),
            bind_addr,
            reference_tz,
            cors_allow_origin: get("CORS_ALLOW_ORIGIN"),
        })
    }

    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        let options = PgConnectOptions::from_str(&self.database_url)
            .context("DATABASE_URL is not a valid Postgres connection string")?;

        Ok(match &self.ssl_ca {
            Some(ca) => {
                if !ca.is_file() {
                    return Err(anyhow!("PGSSL_CA points to a missing file: {}", ca.display()));
                }
                options.ssl_mode(PgSslMode::VerifyFull).ssl_root_cert(ca)
            }
            None => options,
        })
    }
}
