use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::ShopResult;
use crate::models::{ActionSummary, BehaviorAction, BehaviorRecord, Customer};

pub fn tracked_source_key() -> String {
    format!("track-{}", Uuid::new_v4())
}

pub async fn record_behavior(
    pool: &PgPool,
    customer_id: i64,
    product_id: i64,
    action: BehaviorAction,
) -> ShopResult<()> {
    record_behavior_at(pool, customer_id, product_id, action, Utc::now()).await
}

pub async fn record_behavior_at(
    pool: &PgPool,
    customer_id: i64,
    product_id: i64,
    action: BehaviorAction,
    occurred_at: DateTime<Utc>,
) -> ShopResult<()> {
    sqlx::query(
        r#"
        INSERT INTO smart_shopping.behavior_events
        (customer_id, product_id, action, occurred_at, source_key)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(action.as_str())
    .bind(occurred_at)
    .bind(tracked_source_key())
    .execute(pool)
    .await?;

    debug!(customer_id, product_id, action = %action, "behavior recorded");
    Ok(())
}

pub async fn customer_profile(pool: &PgPool, customer_id: i64) -> ShopResult<Option<Customer>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, email, age, gender, location, created_at
        FROM smart_shopping.customers
        WHERE id = $1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Customer {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        age: row.get("age"),
        gender: row.get("gender"),
        location: row.get("location"),
        created_at: row.get("created_at"),
    }))
}

/// Most recent behavior first, joined with the product it touched.
pub async fn behavior_history(
    pool: &PgPool,
    customer_id: i64,
    limit: i64,
) -> ShopResult<Vec<BehaviorRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT p.name, p.category, b.action, b.occurred_at
        FROM smart_shopping.behavior_events b
        JOIN smart_shopping.products p ON p.id = b.product_id
        WHERE b.customer_id = $1
        ORDER BY b.occurred_at DESC, b.id DESC
        LIMIT $2
        "#,
    )
    .bind(customer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        let action: String = row.get("action");
        history.push(BehaviorRecord {
            product_name: row.get("name"),
            category: row.get("category"),
            action: action.parse()?,
            occurred_at: row.get("occurred_at"),
        });
    }

    Ok(history)
}

pub async fn action_mix(pool: &PgPool, customer_id: i64) -> ShopResult<Vec<ActionSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT action, COUNT(*) AS events
        FROM smart_shopping.behavior_events
        WHERE customer_id = $1
        GROUP BY action
        "#,
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    let mut mix = Vec::with_capacity(rows.len());
    for row in rows {
        let action: String = row.get("action");
        mix.push(ActionSummary {
            action: action.parse()?,
            count: row.get("events"),
        });
    }

    Ok(mix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_keys_are_unique_and_prefixed() {
        let first = tracked_source_key();
        let second = tracked_source_key();
        assert!(first.starts_with("track-"));
        assert_ne!(first, second);
    }
}
