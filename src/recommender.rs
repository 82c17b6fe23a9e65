//! Recommendation selection and category relevance.
//!
//! A customer's favorite category (most viewed, all time) is tried first. The
//! personalized page is only used when it can fill the whole requested page; any
//! shortfall falls back to the global ranking, so the two are never mixed.

use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::catalog::{product_category, scored_product, SCORED_PRODUCT_COLUMNS};
use crate::error::ShopResult;
use crate::models::{CategoryViews, ScoredProduct};

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const RELEVANCE_STEP: f64 = 0.1;

/// Highest view count wins; equal counts go to the alphabetically first category.
pub fn favorite_category(views: &[CategoryViews]) -> Option<&str> {
    views
        .iter()
        .filter(|entry| entry.views > 0)
        .max_by(|a, b| a.views.cmp(&b.views).then_with(|| b.category.cmp(&a.category)))
        .map(|entry| entry.category.as_str())
}

/// Keeps a personalized page only when it is full.
pub fn settle_page(candidates: Vec<ScoredProduct>, limit: usize) -> Option<Vec<ScoredProduct>> {
    if candidates.len() >= limit {
        Some(candidates)
    } else {
        None
    }
}

pub async fn category_views(pool: &PgPool, customer_id: i64) -> ShopResult<Vec<CategoryViews>> {
    let rows = sqlx::query(
        r#"
        SELECT p.category, COUNT(*) AS views
        FROM smart_shopping.behavior_events b
        JOIN smart_shopping.products p ON p.id = b.product_id
        WHERE b.customer_id = $1 AND b.action = 'view'
        GROUP BY p.category
        "#,
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(CategoryViews {
            category: row.get("category"),
            views: row.get("views"),
        });
    }

    Ok(views)
}

/// Top products by `popularity + trend`, optionally restricted to one category.
pub async fn top_products(
    pool: &PgPool,
    category: Option<&str>,
    limit: i64,
) -> ShopResult<Vec<ScoredProduct>> {
    let mut query = format!(
        "SELECT {SCORED_PRODUCT_COLUMNS} \
         FROM smart_shopping.products p \
         JOIN smart_shopping.product_scores ps ON ps.product_id = p.id"
    );

    if category.is_some() {
        query.push_str(" WHERE p.category = $2");
    }
    query.push_str(
        " ORDER BY (ps.popularity_score + ps.trend_score) DESC, p.id ASC \
         LIMIT $1",
    );

    let mut rows = sqlx::query(&query).bind(limit);
    if let Some(value) = category {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(scored_product).collect())
}

pub async fn personalized_recommendations(
    pool: &PgPool,
    customer_id: i64,
    limit: i64,
) -> ShopResult<Vec<ScoredProduct>> {
    let views = category_views(pool, customer_id).await?;

    if let Some(category) = favorite_category(&views) {
        let candidates = top_products(pool, Some(category), limit).await?;
        let found = candidates.len();
        if let Some(page) = settle_page(candidates, limit.max(0) as usize) {
            debug!(customer_id, category, "serving favorite category page");
            return Ok(page);
        }
        debug!(
            customer_id,
            category,
            found,
            limit,
            "favorite category cannot fill page, using global ranking"
        );
    }

    top_products(pool, None, limit).await
}

/// Raises relevance for every product sharing the viewed product's category.
///
/// Relevance has no per-customer dimension, so a view from any customer lifts the
/// category for everyone. `customer_id` only identifies the viewer in logs.
pub async fn update_relevance_scores(
    pool: &PgPool,
    customer_id: i64,
    viewed_product_id: i64,
) -> ShopResult<u64> {
    let category = product_category(pool, viewed_product_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE smart_shopping.product_scores
        SET relevance_score = LEAST(1.0, relevance_score + $2)
        WHERE product_id IN (
            SELECT id FROM smart_shopping.products WHERE category = $1
        )
        "#,
    )
    .bind(&category)
    .bind(RELEVANCE_STEP)
    .execute(pool)
    .await?;

    info!(
        customer_id,
        viewed_product_id,
        category = %category,
        products = result.rows_affected(),
        "relevance raised"
    );
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(category: &str, views: i64) -> CategoryViews {
        CategoryViews {
            category: category.to_string(),
            views,
        }
    }

    fn product(id: i64, category: &str) -> ScoredProduct {
        ScoredProduct {
            id,
            name: format!("Product {id}"),
            category: category.to_string(),
            price: 99.0,
            description: String::new(),
            image_url: String::new(),
            popularity: 0.5,
            trend: 0.5,
            relevance: 0.5,
        }
    }

    #[test]
    fn favorite_is_most_viewed_category() {
        let counts = vec![views("Audio", 2), views("Smartphones", 5), views("Laptops", 1)];
        assert_eq!(favorite_category(&counts), Some("Smartphones"));
    }

    #[test]
    fn favorite_ties_go_to_first_category_name() {
        let counts = vec![views("Wearables", 3), views("Audio", 3), views("Tablets", 1)];
        assert_eq!(favorite_category(&counts), Some("Audio"));
    }

    #[test]
    fn no_views_means_no_favorite() {
        assert_eq!(favorite_category(&[]), None);
    }

    #[test]
    fn short_personalized_page_is_discarded() {
        let candidates = vec![
            product(1, "Smartphones"),
            product(2, "Smartphones"),
            product(3, "Smartphones"),
        ];
        assert!(settle_page(candidates, 6).is_none());
    }

    #[test]
    fn full_personalized_page_is_kept() {
        let candidates = vec![product(6, "Audio"), product(7, "Audio")];
        let page = settle_page(candidates, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|item| item.category == "Audio"));
    }
}
