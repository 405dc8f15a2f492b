use std::{env, fmt::Display, str::FromStr};

use atelier_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const DEFAULT_ATELIER_HOST: &str = "127.0.0.1";
const DEFAULT_ATELIER_PORT: u16 = 8470;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/atelier.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_REVIEW_MAX_ATTEMPTS: usize = 5;
const DEFAULT_LIVE_BUFFER: usize = 256;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub identity: IdentityConfig,
    /// How many times a review submission that keeps losing the race for the merchant's aggregate is attempted.
    pub review_max_attempts: usize,
    /// Capacity of the live-update change feed. Watchers that fall further behind than this reload once.
    pub live_buffer: usize,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
}

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    /// Key shared with the identity gateway that signs the `x-atelier-*` headers.
    pub secret: Secret<String>,
    /// When false, identity headers are accepted without a signature. **DANGER**: development only.
    pub checks: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { secret: Secret::default(), checks: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ATELIER_HOST.to_string(),
            port: DEFAULT_ATELIER_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            identity: IdentityConfig::default(),
            review_max_attempts: DEFAULT_REVIEW_MAX_ATTEMPTS,
            live_buffer: DEFAULT_LIVE_BUFFER,
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ATELIER_HOST").ok().unwrap_or_else(|| DEFAULT_ATELIER_HOST.into());
        let port = parse_env("ATELIER_PORT", DEFAULT_ATELIER_PORT);
        let database_url = env::var("ATELIER_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ ATELIER_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("ATELIER_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let identity = IdentityConfig::from_env_or_default();
        let review_max_attempts = parse_env("ATELIER_REVIEW_MAX_ATTEMPTS", DEFAULT_REVIEW_MAX_ATTEMPTS).max(1);
        let live_buffer = parse_env("ATELIER_LIVE_BUFFER", DEFAULT_LIVE_BUFFER).max(1);
        let use_x_forwarded_for = parse_boolean_flag(env::var("ATELIER_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("ATELIER_USE_FORWARDED").ok(), false);
        Self {
            host,
            port,
            database_url,
            max_connections,
            identity,
            review_max_attempts,
            live_buffer,
            use_x_forwarded_for,
            use_forwarded,
        }
    }
}

impl IdentityConfig {
    pub fn from_env_or_default() -> Self {
        let checks = parse_boolean_flag(env::var("ATELIER_IDENTITY_CHECKS").ok(), true);
        let secret = env::var("ATELIER_IDENTITY_SECRET").ok().unwrap_or_else(|| {
            if checks {
                error!(
                    "🪛️ ATELIER_IDENTITY_SECRET is not set. Every request to /api will be refused until it is set to \
                     the key shared with the identity gateway."
                );
            }
            String::default()
        });
        if !checks {
            warn!("🚨️🚨️🚨️ Identity checks are DISABLED. Anyone can act as any user. Never run production like this. 🚨️🚨️🚨️");
        }
        Self { secret: Secret::new(secret), checks }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers and middleware need. Secrets stay out of it.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        env::set_var("ATELIER_TEST_PORT", "eighty");
        assert_eq!(parse_env("ATELIER_TEST_PORT", 8470u16), 8470);
        env::set_var("ATELIER_TEST_PORT", " 9000 ");
        assert_eq!(parse_env("ATELIER_TEST_PORT", 8470u16), 9000);
        env::remove_var("ATELIER_TEST_PORT");
        assert_eq!(parse_env("ATELIER_TEST_PORT", 25u32), 25);
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 80);
        assert_eq!(config.database_url, "sqlite://data/atelier.db");
        assert_eq!(config.review_max_attempts, 5);
        assert_eq!(config.live_buffer, 256);
        assert!(config.identity.checks);
        assert_eq!(format!("{:?}", config.identity.secret), "****");
    }
}
