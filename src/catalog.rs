use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{ShopError, ShopResult};
use crate::models::ScoredProduct;

pub(crate) const SCORED_PRODUCT_COLUMNS: &str = "p.id, p.name, p.category, p.price, \
     p.description, p.image_url, \
     ps.popularity_score, ps.trend_score, ps.relevance_score";

/// Scores that fail to decode are shown as 0.0 instead of failing the listing.
fn display_score(row: &PgRow, column: &str) -> f64 {
    row.try_get::<f64, _>(column).unwrap_or(0.0)
}

pub(crate) fn scored_product(row: &PgRow) -> ScoredProduct {
    ScoredProduct {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        price: row.get("price"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        popularity: display_score(row, "popularity_score"),
        trend: display_score(row, "trend_score"),
        relevance: display_score(row, "relevance_score"),
    }
}

pub async fn product_category(pool: &PgPool, product_id: i64) -> ShopResult<String> {
    let category: Option<String> =
        sqlx::query_scalar("SELECT category FROM smart_shopping.products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;

    category.ok_or(ShopError::ProductNotFound(product_id))
}

pub async fn product_info(pool: &PgPool, product_id: i64) -> ShopResult<Option<ScoredProduct>> {
    let query = format!(
        "SELECT {SCORED_PRODUCT_COLUMNS} \
         FROM smart_shopping.products p \
         JOIN smart_shopping.product_scores ps ON ps.product_id = p.id \
         WHERE p.id = $1"
    );

    let row = sqlx::query(&query)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(scored_product))
}

/// Other products in the same category, best overall score first.
pub async fn related_products(
    pool: &PgPool,
    product_id: i64,
    limit: i64,
) -> ShopResult<Vec<ScoredProduct>> {
    let category = product_category(pool, product_id).await?;
    let query = format!(
        "SELECT {SCORED_PRODUCT_COLUMNS} \
         FROM smart_shopping.products p \
         JOIN smart_shopping.product_scores ps ON ps.product_id = p.id \
         WHERE p.category = $1 AND p.id <> $2 \
         ORDER BY (ps.popularity_score + ps.trend_score + ps.relevance_score) DESC, p.id ASC \
         LIMIT $3"
    );

    let rows = sqlx::query(&query)
        .bind(&category)
        .bind(product_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(scored_product).collect())
}

/// Every product with its scores, ordered by id.
pub async fn all_scored_products(pool: &PgPool) -> ShopResult<Vec<ScoredProduct>> {
    let query = format!(
        "SELECT {SCORED_PRODUCT_COLUMNS} \
         FROM smart_shopping.products p \
         JOIN smart_shopping.product_scores ps ON ps.product_id = p.id \
         ORDER BY p.id"
    );

    let rows = sqlx::query(&query).fetch_all(pool).await?;
    Ok(rows.iter().map(scored_product).collect())
}
