use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use rand::{distributions::Alphanumeric, Rng};
use tokio_postgres::NoTls;

const DEFAULT_SESSION_TTL_SECS: i64 = 14 * 24 * 60 * 60;
const DEFAULT_CACHE_TTL_SECS: u64 = 20;

/// Returns `None` when PG_HOST is unset, so the caller can fall back to the
/// in-memory store.
pub fn get_pg_pool() -> Result<Option<Pool>> {
    let Ok(host) = env::var("PG_HOST") else {
        return Ok(None);
    };

    let mut cfg = Config::new();
    cfg.host = Some(host);
    cfg.user = Some(env::var("PG_USER").context("PG_USER not set")?);
    cfg.password = env::var("PG_PASS").ok();
    cfg.dbname = Some(env::var("PG_DB").context("PG_DB not set")?);

    // jika cfg.pool sudah ada, ubah; kalau belum, set default
    let pcfg = cfg.pool.get_or_insert_with(PoolConfig::default);
    pcfg.max_size = 16;

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map(Some)
        .context("failed to create postgres pool")
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub cache_ttl: Duration,
    pub media_root: PathBuf,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub seed_file: Option<PathBuf>,
}

impl AppConfig {
    /// `with_database` makes JWT_SECRET mandatory; without a database every
    /// session dies with the process anyway.
    pub fn from_env(with_database: bool) -> Result<Self> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if with_database => anyhow::bail!("JWT_SECRET must be set when PG_HOST is set"),
            _ => random_secret(),
        };

        let session_secs = parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let cache_secs = parse_var("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let port = parse_var("PORT", 8080u16)?;

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into());
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into());

        Ok(Self {
            jwt_secret,
            session_ttl: chrono::Duration::seconds(session_secs),
            cache_ttl: Duration::from_secs(cache_secs),
            media_root: PathBuf::from(media_root),
            port,
            allowed_origins: split_origins(&allowed_origins),
            seed_file: env::var("SEED_FILE").ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
