use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use rankly_core::domain::product::ProductId;
use rankly_core::domain::view::{ProductView, UserId, ViewId};
use rankly_core::errors::FactSourceError;
use rankly_core::ranking::{Fact, ViewFactSource, ViewsScope, VisitorFilter};

use super::{
    decode_timestamp, encode_timestamp, json_id_list, ProductViewRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlProductViewRepository {
    pool: DbPool,
}

impl SqlProductViewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product_view").fetch_one(&self.pool).await?;
        Ok(count)
    }
}

/// Builds `SELECT <columns> FROM product_view` narrowed to `scope`, or `None`
/// when the scope cannot match any row.
fn scoped_query(columns: &str, scope: &ViewsScope) -> Option<QueryBuilder<'static, Sqlite>> {
    let mut query_builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {columns} FROM product_view WHERE 1=1"));

    match scope {
        ViewsScope::All => {}
        ViewsScope::Explicit(view_ids) => {
            if view_ids.is_empty() {
                return None;
            }
            query_builder.push(" AND id IN (SELECT value FROM json_each(");
            query_builder.push_bind(json_id_list(view_ids.iter().map(|id| id.0.as_str())));
            query_builder.push("))");
        }
        ViewsScope::Filtered(filter) => {
            match &filter.visitor {
                VisitorFilter::Any => {}
                VisitorFilter::Anonymous => {
                    query_builder.push(" AND user_id IS NULL");
                }
                VisitorFilter::Authenticated => {
                    query_builder.push(" AND user_id IS NOT NULL");
                }
                VisitorFilter::User(user_id) => {
                    query_builder.push(" AND user_id = ");
                    query_builder.push_bind(user_id.0.clone());
                }
            }
            if let Some(since) = &filter.since {
                query_builder.push(" AND created_at >= ");
                query_builder.push_bind(encode_timestamp(since));
            }
            if let Some(until) = &filter.until {
                query_builder.push(" AND created_at <= ");
                query_builder.push_bind(encode_timestamp(until));
            }
        }
    }

    query_builder.push(" ORDER BY created_at, rowid");
    Some(query_builder)
}

fn row_to_view(row: &sqlx::sqlite::SqliteRow) -> Result<ProductView, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: String =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: Option<String> =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ProductView {
        id: ViewId(id),
        product_id: ProductId(product_id),
        user_id: user_id.map(UserId),
        created_at: decode_timestamp("created_at", &created_at)?,
    })
}

#[async_trait]
impl ProductViewRepository for SqlProductViewRepository {
    async fn record(&self, view: ProductView) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product_view (id, product_id, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&view.id.0)
        .bind(&view.product_id.0)
        .bind(view.user_id.as_ref().map(|user| user.0.clone()))
        .bind(encode_timestamp(&view.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, scope: &ViewsScope) -> Result<Vec<ProductView>, RepositoryError> {
        let Some(mut query_builder) = scoped_query("id, product_id, user_id, created_at", scope)
        else {
            return Ok(Vec::new());
        };
        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_view).collect()
    }
}

#[async_trait]
impl ViewFactSource for SqlProductViewRepository {
    async fn view_facts(&self, scope: &ViewsScope) -> Result<Vec<Fact>, FactSourceError> {
        let Some(mut query_builder) = scoped_query("product_id", scope) else {
            return Ok(Vec::new());
        };
        let rows = query_builder.build().fetch_all(&self.pool).await.map_err(RepositoryError::from)?;

        let facts = rows
            .iter()
            .map(|row| {
                row.try_get::<String, _>("product_id")
                    .map(|product_id| Fact::unit(ProductId(product_id)))
                    .map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(event_name = "db.view_facts.loaded", facts = facts.len(), "loaded view facts");
        Ok(facts)
    }
}
