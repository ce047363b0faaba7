use std::env;
use std::fmt;

pub const DEFAULT_JWT_EXPIRATION_MINUTES: i64 = 4320;
/// Ten years.
pub const MAX_JWT_EXPIRATION_MINUTES: i64 = 10 * 365 * 24 * 60;
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP relay settings. Present only when both host and user are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_expiration_minutes: i64,
    pub bcrypt_cost: u32,
    /// Base URL of the web client; verification and reset links point here.
    pub frontend_url: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid { name, value } => write!(f, "{} has invalid value '{}'", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let server_port = match get("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let jwt_expiration_minutes = match get("JWT_EXPIRATION_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if (1..=MAX_JWT_EXPIRATION_MINUTES).contains(&minutes) => minutes,
                _ => {
                    log::warn!(
                        "JWT_EXPIRATION_MINUTES '{}' is not an integer between 1 and {}, using {}",
                        raw,
                        MAX_JWT_EXPIRATION_MINUTES,
                        DEFAULT_JWT_EXPIRATION_MINUTES
                    );
                    DEFAULT_JWT_EXPIRATION_MINUTES
                }
            },
            None => DEFAULT_JWT_EXPIRATION_MINUTES,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if BCRYPT_COST_RANGE.contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_BCRYPT_COST,
        };

        let smtp = match (get("SMTP_HOST"), get("SMTP_USER")) {
            (Some(host), Some(user)) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                        name: "SMTP_PORT",
                        value: raw,
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(SmtpConfig {
                    host,
                    port,
                    password: get("SMTP_PASSWORD").unwrap_or_default(),
                    from: get("SMTP_FROM").unwrap_or_else(|| user.clone()),
                    user,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_port,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_expiration_minutes,
            bcrypt_cost,
            frontend_url: get("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            smtp,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "s3cret")];

    #[test]
    fn test_config_defaults() {
        let config = config_from(&REQUIRED).unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.jwt_expiration_minutes, DEFAULT_JWT_EXPIRATION_MINUTES);
        assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert_eq!(config.frontend_url, DEFAULT_FRONTEND_URL);
        assert!(config.smtp.is_none());
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("JWT_EXPIRATION_MINUTES", "60"),
            ("FRONTEND_URL", "https://app.example.com/"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer@example.com"),
            ("SMTP_PASSWORD", "pw"),
        ]);
        let config = config_from(&vars).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.jwt_expiration_minutes, 60);
        assert_eq!(config.frontend_url, "https://app.example.com");

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, DEFAULT_SMTP_PORT);
        assert_eq!(smtp.from, "mailer@example.com");
    }

    #[test]
    fn test_missing_required_values() {
        assert_eq!(
            config_from(&[("JWT_SECRET", "s3cret")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config_from(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_invalid_expiration_falls_back_to_default() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("JWT_EXPIRATION_MINUTES", "soon"));
        assert_eq!(
            config_from(&vars).unwrap().jwt_expiration_minutes,
            DEFAULT_JWT_EXPIRATION_MINUTES
        );
    }

    #[test]
    fn test_out_of_range_expiration_falls_back_to_default() {
        for raw in ["0", "-5", "200000000000"] {
            let mut vars = REQUIRED.to_vec();
            vars.push(("JWT_EXPIRATION_MINUTES", raw));
            assert_eq!(
                config_from(&vars).unwrap().jwt_expiration_minutes,
                DEFAULT_JWT_EXPIRATION_MINUTES,
                "JWT_EXPIRATION_MINUTES={}",
                raw
            );
        }

        let mut vars = REQUIRED.to_vec();
        let max = MAX_JWT_EXPIRATION_MINUTES.to_string();
        vars.push(("JWT_EXPIRATION_MINUTES", max.as_str()));
        assert_eq!(
            config_from(&vars).unwrap().jwt_expiration_minutes,
            MAX_JWT_EXPIRATION_MINUTES
        );
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVER_PORT", "http"));
        assert!(matches!(
            config_from(&vars),
            Err(ConfigError::Invalid { name: "SERVER_PORT", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("BCRYPT_COST", "99"));
        assert!(matches!(
            config_from(&vars),
            Err(ConfigError::Invalid { name: "BCRYPT_COST", .. })
        ));
    }

    #[test]
    fn test_smtp_requires_host_and_user() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SMTP_HOST", "smtp.example.com"));
        assert!(config_from(&vars).unwrap().smtp.is_none());
    }
}
