use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use rankly_core::domain::order::{Order, OrderId, OrderStatus};
use rankly_core::domain::product::{Product, ProductId};
use rankly_core::domain::shop::{Shop, ShopId};
use rankly_core::domain::view::ProductView;
use rankly_core::errors::FactSourceError;
use rankly_core::ranking::ViewsScope;

pub mod catalog;
pub mod memory;
pub mod order;
pub mod product_view;

pub use catalog::SqlCatalogRepository;
pub use memory::{InMemoryOrderRepository, InMemoryProductViewRepository};
pub use order::SqlOrderRepository;
pub use product_view::SqlProductViewRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for FactSourceError {
    fn from(value: RepositoryError) -> Self {
        FactSourceError::DataAccess(value.to_string())
    }
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn save_shop(&self, shop: Shop) -> Result<(), RepositoryError>;
    async fn find_shop(&self, id: &ShopId) -> Result<Option<Shop>, RepositoryError>;
    async fn save_product(&self, product: Product) -> Result<(), RepositoryError>;
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    async fn save(&self, order: Order) -> Result<(), RepositoryError>;
    async fn update_status(&self, id: &OrderId, status: OrderStatus)
        -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait ProductViewRepository: Send + Sync {
    async fn record(&self, view: ProductView) -> Result<(), RepositoryError>;
    async fn list(&self, scope: &ViewsScope) -> Result<Vec<ProductView>, RepositoryError>;
}

/// Fixed-width UTC rendering so stored timestamps compare correctly as text.
pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid `{column}` timestamp `{raw}`: {error}")))
}

/// Encodes ids as a single JSON array bind for `IN (SELECT value FROM json_each(?))`,
/// so an explicit subset of any size stays within SQLite's bound-variable limit.
pub(crate) fn json_id_list<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    serde_json::Value::from(ids.into_iter().collect::<Vec<_>>()).to_string()
}
