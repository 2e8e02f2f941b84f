//! Server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use notekeep_core::TokenConfig;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected \"pretty\" or \"json\", got {:?}", other)),
        }
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    pub log_format: LogFormat,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// HS256 secret for access and refresh tokens.
    pub jwt_secret: String,
    /// Salt for refresh-token fingerprints.
    pub refresh_token_salt: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Time between expired-session sweeps.
    pub session_sweep_interval: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `JWT_SECRET`: Token signing secret
    /// - `REFRESH_TOKEN_SALT`: Salt for refresh-token fingerprints
    ///
    /// Optional:
    /// - `PORT`: Server port (default: 3000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `LOG_FORMAT`: "pretty" or "json" (default: "pretty")
    /// - `CORS_ALLOWED_ORIGINS`: Allowed CORS origins (default: "*")
    /// - `ACCESS_TOKEN_TTL_SECS`: Access token lifetime (default: 900)
    /// - `REFRESH_TOKEN_TTL_SECS`: Refresh token lifetime (default: 30 days)
    /// - `SESSION_SWEEP_INTERVAL_SECS`: Sweep interval (default: 60)
    ///
    /// The database is configured separately through
    /// `notekeep_store::StoreConfig::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = required(&lookup, "JWT_SECRET")?;
        let refresh_token_salt = required(&lookup, "REFRESH_TOKEN_SALT")?;

        let port = parsed(&lookup, "PORT", 3000)?;
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = parsed(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;
        let cors_allowed_origins =
            lookup("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());

        let access_token_ttl = seconds(&lookup, "ACCESS_TOKEN_TTL_SECS", 900)?;
        let refresh_token_ttl = seconds(&lookup, "REFRESH_TOKEN_TTL_SECS", 30 * 24 * 60 * 60)?;
        let session_sweep_interval = seconds(&lookup, "SESSION_SWEEP_INTERVAL_SECS", 60)?;

        Ok(Self {
            port,
            log_level,
            log_format,
            cors_allowed_origins,
            jwt_secret,
            refresh_token_salt,
            access_token_ttl,
            refresh_token_ttl,
            session_sweep_interval,
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Inputs for the token issuer.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            salt: self.refresh_token_salt.clone(),
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("session_sweep_interval", &self.session_sweep_interval)
            .finish_non_exhaustive()
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        }),
        None => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn seconds<F>(lookup: &F, name: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parsed(lookup, name, default)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    const SECRETS: [(&str, &str); 2] = [("JWT_SECRET", "s3cret"), ("REFRESH_TOKEN_SALT", "pepper")];

    #[test]
    fn test_default_values() {
        let config = load(&SECRETS).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.cors_allowed_origins, "*");
        assert_eq!(config.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let mut vars = SECRETS.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("LOG_FORMAT", "json"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("SESSION_SWEEP_INTERVAL_SECS", "5"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(5));
        assert_eq!(config.token_config().secret, "s3cret");
    }

    #[test]
    fn test_missing_secret() {
        let err = load(&[("REFRESH_TOKEN_SALT", "pepper")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref n) if n == "JWT_SECRET"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = load(&[("JWT_SECRET", ""), ("REFRESH_TOKEN_SALT", "pepper")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "PORT"
        ));

        let mut vars = SECRETS.to_vec();
        vars.push(("REFRESH_TOKEN_TTL_SECS", "0"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = load(&SECRETS).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("pepper"));
    }
}
