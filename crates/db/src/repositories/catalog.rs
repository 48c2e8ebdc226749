use sqlx::Row;

use rankly_core::domain::product::{Product, ProductId};
use rankly_core::domain::shop::{Shop, ShopId};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query("SELECT id, sku, name, active FROM product ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_product).collect()
    }
}

fn row_to_shop(row: &sqlx::sqlite::SqliteRow) -> Result<Shop, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let identifier: String =
        row.try_get("identifier").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Shop { id: ShopId(id), identifier, name })
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let sku: String = row.try_get("sku").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let active: bool = row.try_get("active").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Product { id: ProductId(id), sku, name, active })
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn save_shop(&self, shop: Shop) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop (id, identifier, name) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET identifier = excluded.identifier, name = excluded.name",
        )
        .bind(&shop.id.0)
        .bind(&shop.identifier)
        .bind(&shop.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_shop(&self, id: &ShopId) -> Result<Option<Shop>, RepositoryError> {
        let row = sqlx::query("SELECT id, identifier, name FROM shop WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_shop).transpose()
    }

    async fn save_product(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, sku, name, active) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                sku = excluded.sku,
                name = excluded.name,
                active = excluded.active",
        )
        .bind(&product.id.0)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT id, sku, name, active FROM product WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }
}

#[cfg(test)]
mod tests {
    use rankly_core::domain::product::{Product, ProductId};
    use rankly_core::domain::shop::{Shop, ShopId};

    use super::SqlCatalogRepository;
    use crate::repositories::CatalogRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlCatalogRepository::new(pool)
    }

    fn product(id: &str, active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            active,
        }
    }

    #[tokio::test]
    async fn shop_round_trip() {
        let repo = setup().await;
        let shop = Shop {
            id: ShopId::new("shop1"),
            identifier: "shop1".to_string(),
            name: "Northwind".to_string(),
        };

        repo.save_shop(shop.clone()).await.expect("save");

        assert_eq!(repo.find_shop(&ShopId::new("shop1")).await.expect("find"), Some(shop));
        assert_eq!(repo.find_shop(&ShopId::new("missing")).await.expect("find"), None);
    }

    #[tokio::test]
    async fn product_save_is_an_upsert() {
        let repo = setup().await;
        repo.save_product(product("p1", true)).await.expect("save");
        repo.save_product(product("p1", false)).await.expect("save again");
        repo.save_product(product("p2", true)).await.expect("save p2");

        let found = repo.find_product(&ProductId::new("p1")).await.expect("find");
        assert_eq!(found, Some(product("p1", false)));

        let listed = repo.list_products().await.expect("list");
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }
}
