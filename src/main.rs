use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use smart_shop::config::Config;
use smart_shop::models::{BehaviorAction, ScoredProduct};
use smart_shop::recommender::DEFAULT_PAGE_SIZE;
use smart_shop::session::Session;
use smart_shop::{catalog, db, recommender, report, scores, tracker, ShopError};

#[derive(Parser)]
#[command(name = "smart-shop")]
#[command(about = "Behavior tracking and product recommendations for the demo shop", long_about = None)]
struct Cli {
    /// Act as this customer instead of the one stored in the session
    #[arg(long, global = true)]
    customer: Option<i64>,
    /// Session file holding the active customer and last score refresh
    #[arg(long, global = true)]
    session: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the demo customers, products and starting scores
    Seed {
        /// Remove all existing shop data first
        #[arg(long)]
        reset: bool,
    },
    /// Import behavior events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show the customer, recommendations and recent activity
    Home {
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,
        #[arg(long)]
        json: bool,
    },
    /// View a product: records the view and raises category relevance
    View { product_id: i64 },
    /// Purchase a product and refresh scores
    Purchase { product_id: i64 },
    /// Add a product to the wishlist
    Wishlist { product_id: i64 },
    /// Show recent behavior for the customer
    History {
        #[arg(long, default_value_t = 5)]
        limit: i64,
    },
    /// Recompute popularity and trend scores now
    RefreshScores,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let outcome = run(cli, &config, &pool).await;
    pool.close().await;
    outcome
}

async fn run(cli: Cli, config: &Config, pool: &PgPool) -> anyhow::Result<()> {
    let session_path = cli.session.unwrap_or_else(|| config.session_path.clone());
    let mut session = Session::load(&session_path)
        .with_context(|| format!("failed to read session {}", session_path.display()))?;
    if let Some(customer_id) = cli.customer {
        session.customer_id = customer_id;
    }
    let customer_id = session.customer_id;

    match &cli.command {
        Commands::InitDb => {
            db::init_db(pool).await?;
            println!("Schema ready.");
            return Ok(());
        }
        Commands::Seed { reset } => {
            if *reset {
                db::reset(pool).await?;
            }
            db::seed(pool).await?;
            println!("Seed data inserted.");
            return Ok(());
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(pool, csv).await?;
            println!("Inserted {inserted} behavior events from {}.", csv.display());
            return Ok(());
        }
        _ => {}
    }

    let now = Utc::now();
    if session.refresh_if_due(pool, now, config.refresh_threshold).await? {
        info!("scores were stale, refreshed before handling command");
    }

    match cli.command {
        Commands::Home { limit, json } => {
            let customer = tracker::customer_profile(pool, customer_id)
                .await?
                .ok_or(ShopError::CustomerNotFound(customer_id))?;
            let recommendations =
                recommender::personalized_recommendations(pool, customer_id, limit).await?;
            let recent = tracker::behavior_history(pool, customer_id, 3).await?;

            if json {
                let page = serde_json::json!({
                    "customer": customer,
                    "recommendations": recommendations,
                    "recent_behavior": recent,
                });
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                println!("Welcome back, {} ({}).", customer.name, customer.email);
                println!("Recommended for you:");
                print_products(&recommendations);
                if recent.is_empty() {
                    println!("No recent activity.");
                } else {
                    println!("Recently:");
                    for record in recent.iter() {
                        println!(
                            "- {} {} ({}) at {}",
                            record.action,
                            record.product_name,
                            record.category,
                            record.occurred_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
        }
        Commands::View { product_id } => {
            tracker::record_behavior(pool, customer_id, product_id, BehaviorAction::View).await?;
            recommender::update_relevance_scores(pool, customer_id, product_id).await?;

            let product = catalog::product_info(pool, product_id)
                .await?
                .ok_or(ShopError::ProductNotFound(product_id))?;
            let related = catalog::related_products(pool, product_id, 3).await?;

            println!("{} ({}) ${:.2}", product.name, product.category, product.price);
            println!("{}", product.description);
            println!(
                "popularity {:.2}, trend {:.2}, relevance {:.2}",
                product.popularity, product.trend, product.relevance
            );
            if !related.is_empty() {
                println!("Related products:");
                print_products(&related);
            }
        }
        Commands::Purchase { product_id } => {
            tracker::record_behavior(pool, customer_id, product_id, BehaviorAction::Purchase)
                .await?;
            let now = Utc::now();
            scores::refresh_scores(pool, now).await?;
            session.last_score_update = Some(now);
            println!("Purchase of product {product_id} recorded.");
        }
        Commands::Wishlist { product_id } => {
            tracker::record_behavior(pool, customer_id, product_id, BehaviorAction::Wishlist)
                .await?;
            println!("Product {product_id} added to wishlist.");
        }
        Commands::History { limit } => {
            let history = tracker::behavior_history(pool, customer_id, limit).await?;
            if history.is_empty() {
                println!("No behavior recorded for customer {customer_id}.");
            }
            for record in history.iter() {
                println!(
                    "- {} {} {} ({})",
                    record.occurred_at.format("%Y-%m-%d %H:%M"),
                    record.action,
                    record.product_name,
                    record.category
                );
            }
        }
        Commands::RefreshScores => {
            let now = Utc::now();
            let refreshed = scores::refresh_scores(pool, now).await?;
            session.last_score_update = Some(now);
            println!("Refreshed scores for {refreshed} products.");
        }
        Commands::Report { out } => {
            let customer = tracker::customer_profile(pool, customer_id).await?;
            let recommendations =
                recommender::personalized_recommendations(pool, customer_id, DEFAULT_PAGE_SIZE)
                    .await?;
            let products = catalog::all_scored_products(pool).await?;
            let mix = tracker::action_mix(pool, customer_id).await?;
            let body =
                report::build_report(customer.as_ref(), now, &recommendations, &products, &mix);
            std::fs::write(&out, body)?;
            println!("Report written to {}.", out.display());
        }
        Commands::InitDb | Commands::Seed { .. } | Commands::Import { .. } => {}
    }

    session
        .save(&session_path)
        .with_context(|| format!("failed to write session {}", session_path.display()))?;
    Ok(())
}

fn print_products(products: &[ScoredProduct]) {
    for product in products.iter() {
        println!(
            "- [{}] {} ({}) ${:.2} score {:.2}",
            product.id,
            product.name,
            product.category,
            product.price,
            product.combined_score()
        );
    }
}
