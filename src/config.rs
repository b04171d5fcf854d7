use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Runtime configuration, read from the environment (and `.env`).
///
/// | Env Var                     | Default                         |
/// |-----------------------------|---------------------------------|
/// | `TMDB_API_KEY`              | required                        |
/// | `TMDB_BASE_URL`             | `https://api.themoviedb.org/3`  |
/// | `TMDB_IMAGE_BASE_URL`       | `https://image.tmdb.org/t/p`    |
/// | `TMDB_LANGUAGE`             | `pt-BR`                         |
/// | `CINELOG_DATA_PATH`         | `./data/cinelog.json`           |
/// | `HTTP_CONNECT_TIMEOUT_SECS` | `10`                            |
/// | `HTTP_TIMEOUT_SECS`         | `30`                            |
/// | `LOG_LEVEL`                 | `info`                          |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    pub language: String,
    pub data_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let tmdb_api_key = get("TMDB_API_KEY", "");
        if tmdb_api_key.is_empty() {
            return Err(Error::Config("TMDB_API_KEY is not set".to_string()));
        }

        let connect_timeout_secs = parse(
            "HTTP_CONNECT_TIMEOUT_SECS",
            &get("HTTP_CONNECT_TIMEOUT_SECS", "10"),
        )?;
        let request_timeout_secs = parse("HTTP_TIMEOUT_SECS", &get("HTTP_TIMEOUT_SECS", "30"))?;

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: get("TMDB_BASE_URL", DEFAULT_BASE_URL),
            tmdb_image_base_url: get("TMDB_IMAGE_BASE_URL", DEFAULT_IMAGE_BASE_URL),
            language: get("TMDB_LANGUAGE", "pt-BR"),
            data_path: PathBuf::from(get("CINELOG_DATA_PATH", "./data/cinelog.json")),
            connect_timeout_secs,
            request_timeout_secs,
            log_level: get("LOG_LEVEL", "info"),
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))
}
