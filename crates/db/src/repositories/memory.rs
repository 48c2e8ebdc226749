use rust_decimal::prelude::ToPrimitive;
use tokio::sync::RwLock;

use rankly_core::domain::order::{Order, OrderId, OrderStatus};
use rankly_core::domain::view::ProductView;
use rankly_core::errors::FactSourceError;
use rankly_core::ranking::{Fact, OrderFactSource, OrdersScope, ViewFactSource, ViewsScope};

use super::{OrderRepository, ProductViewRepository, RepositoryError};

/// Orders kept in insertion order, which stands in for creation order.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self { orders: RwLock::new(orders) }
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|order| &order.id == id).cloned())
    }

    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|existing| existing.id == order.id) {
            Some(existing) => *existing = order,
            None => orders.push(order),
        }
        Ok(())
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.write().await;
        Ok(orders
            .iter_mut()
            .find(|order| &order.id == id)
            .map(|order| order.status = status)
            .is_some())
    }
}

#[async_trait::async_trait]
impl OrderFactSource for InMemoryOrderRepository {
    async fn sales_facts(&self, scope: &OrdersScope) -> Result<Vec<Fact>, FactSourceError> {
        let orders = self.orders.read().await;
        let mut facts = Vec::new();
        for order in orders.iter().filter(|order| scope.matches(order)) {
            for (product_id, line) in order.product_lines() {
                let measure = line.quantity.to_f64().ok_or_else(|| {
                    FactSourceError::DataAccess(format!("quantity `{}` is out of range", line.quantity))
                })?;
                let fact = Fact::new(product_id.clone(), measure)
                    .map_err(|error| FactSourceError::DataAccess(error.to_string()))?;
                facts.push(fact);
            }
        }
        Ok(facts)
    }
}

#[derive(Default)]
pub struct InMemoryProductViewRepository {
    views: RwLock<Vec<ProductView>>,
}

impl InMemoryProductViewRepository {
    pub fn with_views(views: Vec<ProductView>) -> Self {
        Self { views: RwLock::new(views) }
    }
}

#[async_trait::async_trait]
impl ProductViewRepository for InMemoryProductViewRepository {
    async fn record(&self, view: ProductView) -> Result<(), RepositoryError> {
        self.views.write().await.push(view);
        Ok(())
    }

    async fn list(&self, scope: &ViewsScope) -> Result<Vec<ProductView>, RepositoryError> {
        let views = self.views.read().await;
        Ok(views.iter().filter(|view| scope.matches(view)).cloned().collect())
    }
}

#[async_trait::async_trait]
impl ViewFactSource for InMemoryProductViewRepository {
    async fn view_facts(&self, scope: &ViewsScope) -> Result<Vec<Fact>, FactSourceError> {
        let views = self.views.read().await;
        Ok(views
            .iter()
            .filter(|view| scope.matches(view))
            .map(|view| Fact::unit(view.product_id.clone()))
            .collect())
    }
}
