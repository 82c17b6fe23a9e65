use std::io::Read;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ShopResult;
use crate::models::BehaviorAction;

pub const SEED_SCORE: f64 = 0.5;

pub async fn init_db(pool: &PgPool) -> ShopResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn reset(pool: &PgPool) -> ShopResult<()> {
    sqlx::query(
        r#"
        TRUNCATE smart_shopping.behavior_events,
                 smart_shopping.product_scores,
                 smart_shopping.products,
                 smart_shopping.customers
        RESTART IDENTITY
        "#,
    )
    .execute(pool)
    .await?;

    warn!("all shop data truncated");
    Ok(())
}

pub async fn seed(pool: &PgPool) -> ShopResult<()> {
    let customers = vec![
        (1_i64, "John Doe", "john@example.com", 32, "male", "New York"),
        (2, "Jane Smith", "jane@example.com", 28, "female", "Los Angeles"),
        (3, "Mike Johnson", "mike@example.com", 45, "male", "Chicago"),
    ];

    for (id, name, email, age, gender, location) in customers {
        sqlx::query(
            r#"
            INSERT INTO smart_shopping.customers (id, name, email, age, gender, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email, age = EXCLUDED.age,
                gender = EXCLUDED.gender, location = EXCLUDED.location
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(age)
        .bind(gender)
        .bind(location)
        .execute(pool)
        .await?;
    }

    let products = vec![
        (
            1_i64,
            "iPhone 15 Pro",
            "Smartphones",
            999.99,
            "Latest Apple smartphone with A17 Pro chip",
            "/static/images/iphone.jpg",
        ),
        (
            2,
            "Samsung Galaxy S23",
            "Smartphones",
            799.99,
            "Premium Android smartphone with Snapdragon 8 Gen 2",
            "/static/images/galaxy.jpg",
        ),
        (
            3,
            "Google Pixel 8",
            "Smartphones",
            699.99,
            "Google's flagship with Tensor G3 chip",
            "/static/images/pixel.jpg",
        ),
        (
            4,
            "Apple Watch Series 9",
            "Wearables",
            399.99,
            "Latest Apple smartwatch with S9 chip",
            "/static/images/apple_watch.jpg",
        ),
        (
            5,
            "Samsung Galaxy Watch 6",
            "Wearables",
            349.99,
            "Premium Android smartwatch",
            "/static/images/galaxy_watch.jpg",
        ),
        (
            6,
            "AirPods Pro (2nd Gen)",
            "Audio",
            249.99,
            "Premium wireless earbuds with ANC",
            "/static/images/airpods.jpg",
        ),
        (
            7,
            "Sony WH-1000XM5",
            "Audio",
            399.99,
            "Industry-leading noise cancelling headphones",
            "/static/images/sony_headphones.jpg",
        ),
        (
            8,
            "MacBook Pro 14\" M3",
            "Laptops",
            1599.99,
            "Powerful Apple laptop with M3 chip",
            "/static/images/macbook.jpg",
        ),
        (
            9,
            "Dell XPS 15",
            "Laptops",
            1499.99,
            "Premium Windows laptop",
            "/static/images/dell_xps.jpg",
        ),
        (
            10,
            "iPad Pro 12.9\"",
            "Tablets",
            1099.99,
            "Professional tablet with M2 chip",
            "/static/images/ipad.jpg",
        ),
    ];

    for (id, name, category, price, description, image_url) in products {
        sqlx::query(
            r#"
            INSERT INTO smart_shopping.products (id, name, category, price, description, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, category = EXCLUDED.category, price = EXCLUDED.price,
                description = EXCLUDED.description, image_url = EXCLUDED.image_url
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(category)
        .bind(price)
        .bind(description)
        .bind(image_url)
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO smart_shopping.product_scores
            (product_id, popularity_score, trend_score, relevance_score)
            VALUES ($1, $2, $2, $2)
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(SEED_SCORE)
        .execute(pool)
        .await?;
    }

    info!("demo customers and products seeded");
    Ok(())
}

#[derive(Debug, serde::Deserialize)]
pub struct BehaviorCsvRow {
    pub customer_id: i64,
    pub product_id: i64,
    pub action: BehaviorAction,
    pub occurred_at: DateTime<Utc>,
    pub source_key: Option<String>,
}

pub fn read_behavior_csv<R: Read>(input: R) -> ShopResult<Vec<BehaviorCsvRow>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();

    for result in reader.deserialize::<BehaviorCsvRow>() {
        rows.push(result?);
    }

    Ok(rows)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> ShopResult<usize> {
    let file = std::fs::File::open(csv_path)?;
    let rows = read_behavior_csv(file)?;
    let mut inserted = 0usize;

    for row in rows {
        let source_key = row
            .source_key
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO smart_shopping.behavior_events
            (customer_id, product_id, action, occurred_at, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(row.customer_id)
        .bind(row.product_id)
        .bind(row.action.as_str())
        .bind(row.occurred_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "behavior events imported");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_behavior_rows() {
        let data = "\
customer_id,product_id,action,occurred_at,source_key
1,6,view,2026-10-10T09:30:00Z,batch-001
2,8,purchase,2026-10-11T18:05:00Z,
";
        let rows = read_behavior_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, BehaviorAction::View);
        assert_eq!(rows[0].source_key.as_deref(), Some("batch-001"));
        assert_eq!(rows[1].product_id, 8);
        assert_eq!(rows[1].action, BehaviorAction::Purchase);
        assert!(rows[1].source_key.is_none());
    }

    #[test]
    fn rejects_unknown_actions() {
        let data = "\
customer_id,product_id,action,occurred_at,source_key
1,6,return,2026-10-10T09:30:00Z,batch-002
";
        assert!(read_behavior_csv(data.as_bytes()).is_err());
    }
}
