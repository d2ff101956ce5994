use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

/// Where log events end up once the subscriber is installed.
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    Console,
    Loki(url::Url),
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            loki_enabled: var("LOKI_ENABLED")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            loki_url: var("LOKI_URL"),
            service_name: var("SERVICE_NAME").unwrap_or_else(|| "investfolio".to_string()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: var("RUST_LOG")
                .unwrap_or_else(|| "info,sqlx=warn,tower_http=info".to_string()),
        }
    }

    /// Resolves the sink. Loki needs a parseable `LOKI_URL` when enabled.
    pub fn target(&self) -> Result<LogTarget, String> {
        if !self.loki_enabled {
            return Ok(LogTarget::Console);
        }
        let raw = self
            .loki_url
            .as_deref()
            .ok_or_else(|| "LOKI_ENABLED is true but LOKI_URL is not set".to_string())?;
        url::Url::parse(raw)
            .map(LogTarget::Loki)
            .map_err(|e| format!("LOKI_URL '{}' is invalid: {}", raw, e))
    }

    fn filter(&self) -> Result<EnvFilter, String> {
        EnvFilter::try_new(&self.log_level)
            .map_err(|e| format!("RUST_LOG '{}' is invalid: {}", self.log_level, e))
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = config.filter()?;

    match config.target()? {
        #[cfg(feature = "loki")]
        LogTarget::Loki(url) => init_with_loki(&config, filter, url),
        #[cfg(not(feature = "loki"))]
        LogTarget::Loki(_) => {
            init_console_only(&config, filter)?;
            tracing::warn!("Built without the loki feature, LOKI_ENABLED is ignored");
            Ok(())
        }
        LogTarget::Console => init_console_only(&config, filter),
    }
}

fn init_console_only(config: &LoggingConfig, filter: EnvFilter) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!("Console logging initialized for {} ({})", config.service_name, config.environment);
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(
    config: &LoggingConfig,
    filter: EnvFilter,
    url: url::Url,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = url.to_string();
    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // ships buffered events in the background
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()?;

    tracing::info!("Loki logging initialized at {}", endpoint);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(loki_enabled: bool, loki_url: Option<&str>) -> LoggingConfig {
        LoggingConfig {
            loki_enabled,
            loki_url: loki_url.map(String::from),
            service_name: "investfolio".into(),
            environment: "test".into(),
            log_level: "info".into(),
        }
    }

    #[test]
    fn test_console_when_loki_disabled() {
        assert_eq!(config(false, None).target(), Ok(LogTarget::Console));
        assert_eq!(config(false, Some("not a url")).target(), Ok(LogTarget::Console));
    }

    #[test]
    fn test_loki_requires_valid_url() {
        assert!(config(true, None).target().is_err());
        assert!(config(true, Some("not a url")).target().is_err());
        assert!(matches!(
            config(true, Some("http://loki:3100")).target(),
            Ok(LogTarget::Loki(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_filter() {
        let mut cfg = config(false, None);
        cfg.log_level = "info,sqlx=notalevel".into();
        assert!(cfg.filter().is_err());
    }
}
