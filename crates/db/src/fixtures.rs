use crate::connection::DbPool;
use crate::repositories::RepositoryError;
use sqlx::Executor;

const SEED_SHOP_IDS: &[&str] = &["shop1", "shop2"];

const SEED_PRODUCT_IDS: &[&str] = &["p1", "p2", "p3", "p4", "p5"];

const SEED_ORDER_IDS: &[&str] =
    &["seed-order-1", "seed-order-2", "seed-order-3", "seed-order-4", "seed-order-5", "seed-order-6"];

/// Per-product expectations the seeded rankings are built on.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract {
        product_id: "p1",
        completed_quantity: 10,
        views: 10,
        sales_label: "sales-p1",
        views_label: "views-p1",
    },
    SeedProductContract {
        product_id: "p2",
        completed_quantity: 20,
        views: 20,
        sales_label: "sales-p2",
        views_label: "views-p2",
    },
    SeedProductContract {
        product_id: "p3",
        completed_quantity: 30,
        views: 40,
        sales_label: "sales-p3",
        views_label: "views-p3",
    },
    SeedProductContract {
        product_id: "p4",
        completed_quantity: 100,
        views: 10,
        sales_label: "sales-p4",
        views_label: "views-p4",
    },
    SeedProductContract {
        product_id: "p5",
        completed_quantity: 2,
        views: 20,
        sales_label: "sales-p5",
        views_label: "views-p5",
    },
];

/// Deterministic demo catalog: two shops, five products, six orders (one
/// canceled) and a view log whose rankings are known in advance.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the dataset. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let views: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product_view WHERE id LIKE 'seed-view-%'")
                .fetch_one(pool)
                .await?;

        Ok(SeedResult {
            shops: SEED_SHOP_IDS.len(),
            products: SEED_PRODUCT_IDS.len(),
            orders: SEED_ORDER_IDS.len(),
            views,
        })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        checks.push(("shops", count_ids(pool, "shop", SEED_SHOP_IDS).await?));
        checks.push(("products", count_ids(pool, "product", SEED_PRODUCT_IDS).await?));
        checks.push(("orders", count_ids(pool, "customer_order", SEED_ORDER_IDS).await?));

        let canceled: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customer_order WHERE id = 'seed-order-6' AND status = 'canceled')",
        )
        .fetch_one(pool)
        .await?;
        checks.push(("canceled-order", canceled == 1));

        let quoted_orders = sql_array_from_ids(SEED_ORDER_IDS);
        for product in SEED_PRODUCTS {
            let quantities: Vec<String> = sqlx::query_scalar(&format!(
                "SELECT l.quantity FROM order_line l
                 JOIN customer_order o ON o.id = l.order_id
                 WHERE o.id IN {quoted_orders} AND o.status = 'complete'
                   AND l.line_type = 'product' AND l.product_id = ?1"
            ))
            .bind(product.product_id)
            .fetch_all(pool)
            .await?;
            let sold = quantities
                .iter()
                .map(|raw| raw.parse::<i64>())
                .sum::<Result<i64, _>>()
                .map_err(|error| RepositoryError::Decode(error.to_string()))?;
            checks.push((product.sales_label, sold == product.completed_quantity));

            let views: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM product_view WHERE product_id = ?1 AND id LIKE 'seed-view-%'",
            )
            .bind(product.product_id)
            .fetch_one(pool)
            .await?;
            checks.push((product.views_label, views == product.views));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded rows, leaving anything else untouched.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_orders = sql_array_from_ids(SEED_ORDER_IDS);
        let quoted_products = sql_array_from_ids(SEED_PRODUCT_IDS);
        let quoted_shops = sql_array_from_ids(SEED_SHOP_IDS);

        sqlx::query("DELETE FROM product_view WHERE id LIKE 'seed-view-%'")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM order_line WHERE order_id IN {quoted_orders}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM customer_order WHERE id IN {quoted_orders}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM product WHERE id IN {quoted_products}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM shop WHERE id IN {quoted_shops}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn count_ids(pool: &DbPool, table: &str, ids: &[&str]) -> Result<bool, RepositoryError> {
    let quoted = sql_array_from_ids(ids);
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table} WHERE id IN {quoted}"))
        .fetch_one(pool)
        .await?;
    Ok(count == ids.len() as i64)
}

#[derive(Debug, Clone, Copy)]
struct SeedProductContract {
    product_id: &'static str,
    completed_quantity: i64,
    views: i64,
    sales_label: &'static str,
    views_label: &'static str,
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub shops: usize,
    pub products: usize,
    pub orders: usize,
    pub views: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoDataset::SQL.is_empty());
        assert_eq!(sql_array_from_ids(&["a", "b"]), "('a','b')");
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification = DemoDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.views, 100);

        let second = DemoDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.views, 100);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");
        DemoDataset::load(&pool).await.expect("load seed fixtures");
        DemoDataset::clean(&pool).await.expect("clean seed fixtures");

        let verification = DemoDataset::verify(&pool).await.expect("verify after clean");
        assert!(!verification.all_present);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product_view")
            .fetch_one(&pool)
            .await
            .expect("count views");
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn half_of_the_seeded_views_are_anonymous() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");
        DemoDataset::load(&pool).await.expect("load seed fixtures");

        let anonymous: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product_view WHERE user_id IS NULL")
                .fetch_one(&pool)
                .await
                .expect("count anonymous views");
        assert_eq!(anonymous, 50);
    }
}
