use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ShopError;

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Kind of interaction a customer had with a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorAction {
    View,
    Purchase,
    Wishlist,
}

impl BehaviorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorAction::View => "view",
            BehaviorAction::Purchase => "purchase",
            BehaviorAction::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for BehaviorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorAction {
    type Err = ShopError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(BehaviorAction::View),
            "purchase" => Ok(BehaviorAction::Purchase),
            "wishlist" => Ok(BehaviorAction::Wishlist),
            other => Err(ShopError::InvalidAction(other.to_string())),
        }
    }
}

/// A behavior event joined with the product it refers to.
#[derive(Debug, Clone, Serialize)]
pub struct BehaviorRecord {
    pub product_name: String,
    pub category: String,
    pub action: BehaviorAction,
    pub occurred_at: DateTime<Utc>,
}

/// A product together with its current scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredProduct {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub popularity: f64,
    pub trend: f64,
    pub relevance: f64,
}

impl ScoredProduct {
    /// Ranking key used for recommendations.
    pub fn combined_score(&self) -> f64 {
        self.popularity + self.trend
    }
}

/// Per-product activity counts over the current and the prior scoring window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductActivity {
    pub product_id: i64,
    pub views: i64,
    pub purchases: i64,
    pub previous_activity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreUpdate {
    pub product_id: i64,
    pub popularity: f64,
    pub trend: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryViews {
    pub category: String,
    pub views: i64,
}

#[derive(Debug, Clone)]
pub struct ActionSummary {
    pub action: BehaviorAction,
    pub count: i64,
}
