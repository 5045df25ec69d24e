use serde::Deserialize;

/// Configuration loading failures. Any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// How the refresh flow treats the stored "remember me" flag.
///
/// `Ignore` always hands out a persistent, fixed-lifetime access cookie on
/// refresh. `Honor` makes the refreshed cookie persistent only when the user
/// asked to be remembered at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RememberMePolicy {
    Ignore,
    Honor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Argon2 work factor. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for argon2id)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub store_timeout_ms: u64,
    pub remember_me: RememberMePolicy,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingVar(key.to_string()))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: or_default("JWT_ISSUER", "grindly"),
            audience: or_default("JWT_AUDIENCE", "grindly-users"),
            access_ttl_minutes: parse_or(&lookup, "JWT_ACCESS_TTL_MINUTES", 15)?,
            refresh_ttl_minutes: parse_or(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 7)?,
        };
        if jwt.access_ttl_minutes < 0 || jwt.refresh_ttl_minutes < 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_*_TTL_MINUTES".into(),
                "token lifetimes must not be negative".into(),
            ));
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&lookup, "HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "HASH_PARALLELISM", defaults.parallelism)?,
        };

        let environment = match or_default("APP_ENV", "development").to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" | "test" => Environment::Development,
            other => {
                return Err(ConfigError::InvalidValue("APP_ENV".into(), other.to_string()));
            }
        };

        let remember_me = match or_default("REMEMBER_ME_POLICY", "ignore").to_lowercase().as_str() {
            "ignore" => RememberMePolicy::Ignore,
            "honor" | "honour" => RememberMePolicy::Honor,
            other => {
                return Err(ConfigError::InvalidValue(
                    "REMEMBER_ME_POLICY".into(),
                    other.to_string(),
                ));
            }
        };

        Ok(Self {
            database_url,
            host: or_default("APP_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "APP_PORT", 8080)?,
            environment,
            jwt,
            password,
            store_timeout_ms: parse_or(&lookup, "STORE_TIMEOUT_MS", 5000)?,
            remember_me,
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.trim().is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/grindly"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.access_ttl_minutes, 15);
        assert_eq!(cfg.jwt.refresh_ttl_minutes, 7 * 24 * 60);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.remember_me, RememberMePolicy::Ignore);
        assert_eq!(cfg.store_timeout_ms, 5000);
        assert!(cfg.cors_origin.is_none());
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/grindly",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "JWT_SECRET"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/grindly"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn parses_policy_environment_and_numbers() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/grindly"),
            ("JWT_SECRET", "s3cret"),
            ("APP_ENV", "production"),
            ("REMEMBER_ME_POLICY", "honor"),
            ("APP_PORT", "3000"),
            ("HASH_ITERATIONS", "3"),
        ]))
        .expect("config should load");
        assert!(cfg.environment.is_production());
        assert_eq!(cfg.remember_me, RememberMePolicy::Honor);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.password.iterations, 3);
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/grindly"),
            ("JWT_SECRET", "s3cret"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "APP_PORT"));
    }
}
