//! Popularity and trend scoring.
//!
//! Scores are recomputed from the behavior log over a trailing window. Products with
//! no events in the window keep whatever scores they had before.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::error::ShopResult;
use crate::models::{ProductActivity, ScoreUpdate};

pub const SCORING_WINDOW_DAYS: i64 = 7;
pub const VIEW_WEIGHT: f64 = 0.1;
pub const PURCHASE_WEIGHT: f64 = 0.5;
pub const POPULARITY_SCALE: f64 = 10.0;
pub const NEUTRAL_TREND: f64 = 0.5;

pub fn popularity_score(views: i64, purchases: i64) -> f64 {
    let weighted = views as f64 * VIEW_WEIGHT + purchases as f64 * PURCHASE_WEIGHT;
    (weighted / POPULARITY_SCALE).min(1.0)
}

/// Week-over-week change mapped onto [0, 1] with 0.5 meaning "no change".
pub fn trend_score(current_activity: i64, previous_activity: i64) -> f64 {
    if previous_activity <= 0 {
        return NEUTRAL_TREND;
    }

    let change = (current_activity - previous_activity) as f64 / previous_activity as f64;
    (NEUTRAL_TREND + change * 0.5).clamp(0.0, 1.0)
}

pub fn score_activity(activity: &ProductActivity) -> ScoreUpdate {
    ScoreUpdate {
        product_id: activity.product_id,
        popularity: popularity_score(activity.views, activity.purchases),
        trend: trend_score(activity.views + activity.purchases, activity.previous_activity),
    }
}

/// Whether a lazy refresh should run. `None` means no refresh has been recorded yet.
pub fn refresh_due(
    now: DateTime<Utc>,
    last_refresh: Option<DateTime<Utc>>,
    threshold: Duration,
) -> bool {
    match last_refresh {
        None => true,
        Some(last) => now - last > threshold,
    }
}

pub fn window_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let current_start = now - Duration::days(SCORING_WINDOW_DAYS);
    let previous_start = current_start - Duration::days(SCORING_WINDOW_DAYS);
    (previous_start, current_start)
}

pub async fn fetch_activity(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> ShopResult<Vec<ProductActivity>> {
    let (previous_start, current_start) = window_bounds(now);

    let rows = sqlx::query(
        r#"
        SELECT product_id,
               COUNT(*) FILTER (WHERE action = 'view' AND occurred_at > $2) AS views,
               COUNT(*) FILTER (WHERE action = 'purchase' AND occurred_at > $2) AS purchases,
               COUNT(*) FILTER (WHERE occurred_at BETWEEN $1 AND $2) AS previous_activity
        FROM smart_shopping.behavior_events
        WHERE occurred_at >= $1
        GROUP BY product_id
        HAVING COUNT(*) FILTER (WHERE occurred_at > $2) > 0
        ORDER BY product_id
        "#,
    )
    .bind(previous_start)
    .bind(current_start)
    .fetch_all(pool)
    .await?;

    let mut activity = Vec::with_capacity(rows.len());
    for row in rows {
        activity.push(ProductActivity {
            product_id: row.get("product_id"),
            views: row.get("views"),
            purchases: row.get("purchases"),
            previous_activity: row.get("previous_activity"),
        });
    }

    Ok(activity)
}

/// Recompute popularity and trend for every product active in the trailing window.
///
/// Each score row is written by its own statement; there is no transaction around
/// the aggregate read and the writes that follow it.
pub async fn refresh_scores(pool: &PgPool, now: DateTime<Utc>) -> ShopResult<usize> {
    let activity = fetch_activity(pool, now).await?;

    for entry in activity.iter() {
        let update = score_activity(entry);
        debug!(
            product_id = update.product_id,
            popularity = update.popularity,
            trend = update.trend,
            "updating product score"
        );

        sqlx::query(
            r#"
            UPDATE smart_shopping.product_scores
            SET popularity_score = $2,
                trend_score = $3,
                last_updated = $4
            WHERE product_id = $1
            "#,
        )
        .bind(update.product_id)
        .bind(update.popularity)
        .bind(update.trend)
        .bind(now)
        .execute(pool)
        .await?;
    }

    info!(products = activity.len(), "product scores refreshed");
    Ok(activity.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(views: i64, purchases: i64, previous_activity: i64) -> ProductActivity {
        ProductActivity {
            product_id: 7,
            views,
            purchases,
            previous_activity,
        }
    }

    #[test]
    fn popularity_weighs_purchases_five_times_views() {
        assert!((popularity_score(5, 2) - 0.15).abs() < 1e-12);
        assert!((popularity_score(10, 0) - popularity_score(0, 2)).abs() < 1e-12);
        assert_eq!(popularity_score(0, 0), 0.0);
    }

    #[test]
    fn popularity_saturates_at_one() {
        assert_eq!(popularity_score(0, 20), 1.0);
        assert_eq!(popularity_score(500, 300), 1.0);
    }

    #[test]
    fn popularity_stays_in_unit_range() {
        for views in 0..60 {
            for purchases in 0..30 {
                let score = popularity_score(views, purchases);
                assert!((0.0..=1.0).contains(&score));
                let expected = ((0.1 * views as f64 + 0.5 * purchases as f64) / 10.0).min(1.0);
                assert!((score - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn trend_is_neutral_without_prior_activity() {
        assert_eq!(trend_score(0, 0), 0.5);
        assert_eq!(trend_score(40, 0), 0.5);
    }

    #[test]
    fn trend_saturates_on_doubling_and_bottoms_out_on_silence() {
        assert_eq!(trend_score(8, 4), 1.0);
        assert_eq!(trend_score(30, 4), 1.0);
        assert_eq!(trend_score(0, 4), 0.0);
        assert_eq!(trend_score(4, 4), 0.5);
        assert!((trend_score(3, 4) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn scoring_recent_views_and_purchases() {
        let update = score_activity(&activity(5, 2, 0));
        assert_eq!(update.product_id, 7);
        assert!((update.popularity - 0.15).abs() < 1e-12);
        assert_eq!(update.trend, 0.5);
    }

    #[test]
    fn wishlist_only_activity_scores_zero_popularity() {
        let update = score_activity(&activity(0, 0, 2));
        assert_eq!(update.popularity, 0.0);
        assert_eq!(update.trend, 0.0);
    }

    #[test]
    fn refresh_runs_when_never_refreshed() {
        assert!(refresh_due(Utc::now(), None, Duration::seconds(3600)));
    }

    #[test]
    fn refresh_waits_for_threshold_to_pass() {
        let now = Utc::now();
        let threshold = Duration::seconds(3600);
        assert!(!refresh_due(now, Some(now - Duration::seconds(10)), threshold));
        assert!(!refresh_due(now, Some(now - threshold), threshold));
        assert!(refresh_due(now, Some(now - Duration::seconds(3601)), threshold));
    }

    #[test]
    fn windows_are_consecutive_weeks() {
        let now = Utc::now();
        let (previous_start, current_start) = window_bounds(now);
        assert_eq!(now - current_start, Duration::days(7));
        assert_eq!(current_start - previous_start, Duration::days(7));
    }
}
