use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{ActionSummary, Customer, ScoredProduct};

pub fn rank_by_combined(products: &[ScoredProduct]) -> Vec<ScoredProduct> {
    let mut ranked = products.to_vec();
    ranked.sort_by(|a, b| {
        b.combined_score()
            .partial_cmp(&a.combined_score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
}

pub fn build_report(
    customer: Option<&Customer>,
    generated_at: DateTime<Utc>,
    recommendations: &[ScoredProduct],
    products: &[ScoredProduct],
    action_mix: &[ActionSummary],
) -> String {
    let mut output = String::new();
    let customer_label = customer
        .map(|c| format!("{} <{}>", c.name, c.email))
        .unwrap_or_else(|| "unknown customer".to_string());

    let _ = writeln!(output, "# Smart Shop Recommendation Report");
    let _ = writeln!(
        output,
        "Generated for {} at {}",
        customer_label,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended For You");

    if recommendations.is_empty() {
        let _ = writeln!(output, "No products available to recommend.");
    } else {
        for (rank, product) in recommendations.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({}) ${:.2}",
                rank + 1,
                product.name,
                product.category,
                product.price
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Product Scores");

    if products.is_empty() {
        let _ = writeln!(output, "No products in the catalog.");
    } else {
        let _ = writeln!(output, "| Product | Category | Popularity | Trend | Relevance |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for product in rank_by_combined(products).iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2} | {:.2} |",
                product.name, product.category, product.popularity, product.trend, product.relevance
            );
        }
    }

    let mut mix = action_mix.to_vec();
    mix.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.as_str().cmp(b.action.as_str())));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Activity Mix");

    if mix.is_empty() {
        let _ = writeln!(output, "No activity recorded for this customer.");
    } else {
        for summary in mix.iter() {
            let _ = writeln!(output, "- {}: {} events", summary.action, summary.count);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BehaviorAction;

    fn product(id: i64, name: &str, popularity: f64, trend: f64) -> ScoredProduct {
        ScoredProduct {
            id,
            name: name.to_string(),
            category: "Audio".to_string(),
            price: 249.99,
            description: String::new(),
            image_url: String::new(),
            popularity,
            trend,
            relevance: 0.5,
        }
    }

    #[test]
    fn ranks_by_combined_score_then_id() {
        let products = vec![
            product(3, "C", 0.5, 0.5),
            product(1, "A", 0.5, 0.5),
            product(2, "B", 0.9, 0.4),
        ];
        let ranked = rank_by_combined(&products);
        let ids: Vec<i64> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn report_lists_recommendations_and_activity() {
        let products = vec![product(6, "AirPods Pro (2nd Gen)", 0.15, 0.5)];
        let mix = vec![
            ActionSummary {
                action: BehaviorAction::View,
                count: 5,
            },
            ActionSummary {
                action: BehaviorAction::Purchase,
                count: 2,
            },
        ];
        let report = build_report(None, Utc::now(), &products, &products, &mix);

        assert!(report.contains("# Smart Shop Recommendation Report"));
        assert!(report.contains("unknown customer"));
        assert!(report.contains("1. AirPods Pro (2nd Gen) (Audio) $249.99"));
        assert!(report.contains("| AirPods Pro (2nd Gen) | Audio | 0.15 | 0.50 | 0.50 |"));
        let views = report.find("- view: 5 events").unwrap();
        let purchases = report.find("- purchase: 2 events").unwrap();
        assert!(views < purchases);
    }

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_report(None, Utc::now(), &[], &[], &[]);
        assert!(report.contains("No products available to recommend."));
        assert!(report.contains("No activity recorded for this customer."));
    }
}
