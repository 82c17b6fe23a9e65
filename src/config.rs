use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::Context;
use chrono::Duration;
use tracing::{info, warn};

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub refresh_threshold: Duration,
    pub session_path: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a reachable Postgres instance")?;
        let refresh_secs: i64 = try_load("SMART_SHOP_REFRESH_SECS", "3600")?;

        Ok(Self {
            database_url,
            max_connections: try_load("SMART_SHOP_MAX_CONNECTIONS", "5")?,
            refresh_threshold: Duration::seconds(refresh_secs),
            session_path: try_load("SMART_SHOP_SESSION", ".smart-shop-session.json")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("invalid {key} value {raw:?}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_unset() {
        let value: u32 = try_load("SMART_SHOP_TEST_UNSET_KEY", "7").unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn rejects_unparseable_default() {
        let value: anyhow::Result<u32> = try_load("SMART_SHOP_TEST_UNSET_KEY", "seven");
        assert!(value.is_err());
    }
}
