use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("customer {0} not found")]
    CustomerNotFound(i64),

    #[error("unknown behavior action: {0}")]
    InvalidAction(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ShopResult<T> = Result<T, ShopError>;
