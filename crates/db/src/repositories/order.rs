use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use rankly_core::domain::order::{
    Order, OrderId, OrderLine, OrderLineId, OrderLineType, OrderStatus,
};
use rankly_core::domain::product::ProductId;
use rankly_core::domain::shop::ShopId;
use rankly_core::errors::FactSourceError;
use rankly_core::ranking::{Fact, OrderFactSource, OrdersScope, ShopFilter};

use super::{
    decode_timestamp, encode_timestamp, json_id_list, OrderRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_facts(&self, scope: &OrdersScope) -> Result<Vec<Fact>, RepositoryError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT l.product_id AS product_id, l.quantity AS quantity
            FROM order_line l
            JOIN customer_order o ON o.id = l.order_id
            WHERE l.line_type = 'product' AND l.product_id IS NOT NULL
            "#,
        );

        match scope {
            OrdersScope::Explicit(order_ids) => {
                if order_ids.is_empty() {
                    return Ok(Vec::new());
                }
                query_builder.push(" AND o.id IN (SELECT value FROM json_each(");
                query_builder.push_bind(json_id_list(order_ids.iter().map(|id| id.0.as_str())));
                query_builder.push("))");
            }
            OrdersScope::Completed { shops } => {
                query_builder.push(" AND o.status = ");
                query_builder.push_bind(OrderStatus::Complete.as_str());
                match shops {
                    ShopFilter::All => {}
                    ShopFilter::Single(shop_id) => {
                        query_builder.push(" AND o.shop_id = ");
                        query_builder.push_bind(shop_id.0.clone());
                    }
                    ShopFilter::Many(shop_ids) => {
                        if shop_ids.is_empty() {
                            return Ok(Vec::new());
                        }
                        query_builder.push(" AND o.shop_id IN (");
                        let mut separated = query_builder.separated(", ");
                        for shop_id in shop_ids {
                            separated.push_bind(shop_id.0.clone());
                        }
                        query_builder.push(")");
                    }
                }
            }
        }

        query_builder.push(" ORDER BY o.created_at, o.rowid, l.rowid");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_fact).collect()
    }

    async fn load_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, line_type, product_id, quantity FROM order_line
             WHERE order_id = ? ORDER BY rowid",
        )
        .bind(&order_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_line).collect()
    }
}

fn parse_quantity(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid quantity `{raw}`: {error}")))
}

fn row_to_fact(row: &sqlx::sqlite::SqliteRow) -> Result<Fact, RepositoryError> {
    let product_id: String =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let raw_quantity: String =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let measure = parse_quantity(&raw_quantity)?.to_f64().ok_or_else(|| {
        RepositoryError::Decode(format!("quantity `{raw_quantity}` is out of range"))
    })?;

    Fact::new(ProductId(product_id), measure).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<OrderLine, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let line_type: String =
        row.try_get("line_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: Option<String> =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let raw_quantity: String =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(OrderLine {
        id: OrderLineId(id),
        line_type: OrderLineType::from_str(&line_type)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        product_id: product_id.map(ProductId),
        quantity: parse_quantity(&raw_quantity)?,
    })
}

#[async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) =
            sqlx::query("SELECT id, shop_id, status, created_at FROM customer_order WHERE id = ?")
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let order_id: String =
            row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let shop_id: String =
            row.try_get("shop_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let status: String =
            row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at: String =
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let order_id = OrderId(order_id);
        let lines = self.load_lines(&order_id).await?;

        Ok(Some(Order {
            id: order_id,
            shop_id: ShopId(shop_id),
            status: OrderStatus::from_str(&status)
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            lines,
            created_at: decode_timestamp("created_at", &created_at)?,
        }))
    }

    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO customer_order (id, shop_id, status, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                shop_id = excluded.shop_id,
                status = excluded.status,
                created_at = excluded.created_at",
        )
        .bind(&order.id.0)
        .bind(&order.shop_id.0)
        .bind(order.status.as_str())
        .bind(encode_timestamp(&order.created_at))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM order_line WHERE order_id = ?")
            .bind(&order.id.0)
            .execute(&mut *tx)
            .await?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_line (id, order_id, line_type, product_id, quantity)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&line.id.0)
            .bind(&order.id.0)
            .bind(line.line_type.as_str())
            .bind(line.product_id.as_ref().map(|product| product.0.clone()))
            .bind(line.quantity.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE customer_order SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderFactSource for SqlOrderRepository {
    async fn sales_facts(&self, scope: &OrdersScope) -> Result<Vec<Fact>, FactSourceError> {
        let facts = self.load_facts(scope).await?;
        debug!(event_name = "db.order_facts.loaded", facts = facts.len(), "loaded sales facts");
        Ok(facts)
    }
}
