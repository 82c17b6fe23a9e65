use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use crate::error::ShopResult;
use crate::scores;

pub const DEMO_CUSTOMER_ID: i64 = 1;

/// State carried between invocations: the active customer and the last score refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub customer_id: i64,
    pub last_score_update: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            customer_id: DEMO_CUSTOMER_ID,
            last_score_update: None,
        }
    }
}

impl Session {
    pub fn load(path: &Path) -> ShopResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no session file, starting fresh");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> ShopResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn refresh_due(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        scores::refresh_due(now, self.last_score_update, threshold)
    }

    /// Runs the score refresh when the threshold has passed and records `now` if it did.
    pub async fn refresh_if_due(
        &mut self,
        pool: &PgPool,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> ShopResult<bool> {
        if !self.refresh_due(now, threshold) {
            return Ok(false);
        }

        scores::refresh_scores(pool, now).await?;
        self.last_score_update = Some(now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("smart-shop-session-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_yields_demo_session() {
        let session = Session::load(&scratch_path()).unwrap();
        assert_eq!(session, Session::default());
        assert_eq!(session.customer_id, DEMO_CUSTOMER_ID);
        assert!(session.last_score_update.is_none());
    }

    #[test]
    fn session_survives_save_and_load() {
        let path = scratch_path();
        let session = Session {
            customer_id: 2,
            last_score_update: Some(Utc::now()),
        };
        session.save(&path).unwrap();
        let loaded = Session::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn fresh_session_is_due_for_refresh() {
        let now = Utc::now();
        let threshold = Duration::seconds(3600);
        let mut session = Session::default();
        assert!(session.refresh_due(now, threshold));

        session.last_score_update = Some(now - Duration::minutes(5));
        assert!(!session.refresh_due(now, threshold));
    }
}
