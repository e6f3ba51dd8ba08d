use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub notification_interval_secs: u64,
    pub seed_admin: Option<(String, String)>, // (name, phone)
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("notification_interval_secs", &self.notification_interval_secs)
            .field("seed_admin", &self.seed_admin.as_ref().map(|(name, _)| name))
            .finish()
    }
}

fn parsed_positive(key: &str, default: u64) -> u64 {
    match parsed(key, default) {
        0 => {
            log::warn!("{} must be positive, using {}", key, default);
            default
        }
        value => value,
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        let seed_admin = match (env::var("SEED_ADMIN_NAME"), env::var("SEED_ADMIN_PHONE")) {
            (Ok(name), Ok(phone)) => Some((name, phone)),
            _ => None,
        };

        Self {
            port: parsed("PORT", 3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // set a real secret in production
            token_ttl_secs: parsed_positive("TOKEN_TTL_SECS", 86_400),
            notification_interval_secs: parsed_positive("NOTIFICATION_INTERVAL_SECS", 3_600),
            seed_admin,
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
