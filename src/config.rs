use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://stego-crypt-tau.vercel.app",
    "http://localhost:3000",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<HeaderValue>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Starts from [`Config::default`] and applies whichever variables are set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("STEGOCRYPT_BIND") {
            config.bind = raw.parse().context("invalid STEGOCRYPT_BIND")?;
        }
        if let Some(raw) = lookup("STEGOCRYPT_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = raw
                .parse()
                .context("invalid STEGOCRYPT_MAX_UPLOAD_BYTES")?;
        }
        if let Some(raw) = lookup("STEGOCRYPT_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origins(&raw)?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        }
    }
}

fn parse_origins(raw: &str) -> anyhow::Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid origin in STEGOCRYPT_ALLOWED_ORIGINS: {origin}"))
        })
        .collect()
}
