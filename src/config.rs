use std::path::PathBuf;
use std::time::Duration;

// === Fixed limits ===
pub const POSTS_PER_PAGE: usize = 10;
pub const LABEL_LEN: usize = 15;
pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_NAME_LENGTH: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const INDEX_CACHE_PREFIX: &str = "index_page";
pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_URL: &str = "/auth/login/";
pub const POST_IMAGE_DIR: &str = "posts";

/// Runtime settings, read from the environment.
///
/// | Env Var                    | Default                        |
/// |----------------------------|--------------------------------|
/// | `GAZETTE_BIND_ADDR`        | `0.0.0.0:8000`                 |
/// | `GAZETTE_DATABASE_URL`     | `sqlite://gazette.db?mode=rwc` |
/// | `GAZETTE_MEDIA_DIR`        | `media`                        |
/// | `GAZETTE_SESSION_HOURS`    | `336`                          |
/// | `GAZETTE_INDEX_CACHE_SECS` | `20`                           |
/// | `GAZETTE_MAX_UPLOAD_BYTES` | `5242880`                      |
/// | `GAZETTE_SEED_DEMO`        | `false`                        |
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub media_dir: PathBuf,
    pub session_hours: i64,
    pub index_cache_ttl: Duration,
    pub max_upload_bytes: usize,
    pub seed_demo: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("GAZETTE_BIND_ADDR", "0.0.0.0:8000"),
            database_url: env_or("GAZETTE_DATABASE_URL", "sqlite://gazette.db?mode=rwc"),
            media_dir: PathBuf::from(env_or("GAZETTE_MEDIA_DIR", "media")),
            session_hours: env_parse("GAZETTE_SESSION_HOURS", 24 * 14),
            index_cache_ttl: Duration::from_secs(env_parse("GAZETTE_INDEX_CACHE_SECS", 20)),
            max_upload_bytes: env_parse("GAZETTE_MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            seed_demo: env_parse("GAZETTE_SEED_DEMO", false),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            database_url: "sqlite::memory:".to_string(),
            media_dir: PathBuf::from("media"),
            session_hours: 24 * 14,
            index_cache_ttl: Duration::from_secs(20),
            max_upload_bytes: 5 * 1024 * 1024,
            seed_demo: false,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
