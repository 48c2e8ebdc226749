use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::FactSourceError;

use super::facts::Fact;
use super::scope::{OrdersScope, ViewsScope};

/// Supplies one `(product, quantity)` fact per product order line in scope.
#[async_trait]
pub trait OrderFactSource: Send + Sync {
    async fn sales_facts(&self, scope: &OrdersScope) -> Result<Vec<Fact>, FactSourceError>;
}

/// Supplies one unit fact per recorded product view in scope.
#[async_trait]
pub trait ViewFactSource: Send + Sync {
    async fn view_facts(&self, scope: &ViewsScope) -> Result<Vec<Fact>, FactSourceError>;
}

#[async_trait]
impl<T: OrderFactSource + ?Sized> OrderFactSource for &T {
    async fn sales_facts(&self, scope: &OrdersScope) -> Result<Vec<Fact>, FactSourceError> {
        (**self).sales_facts(scope).await
    }
}

#[async_trait]
impl<T: OrderFactSource + ?Sized> OrderFactSource for Arc<T> {
    async fn sales_facts(&self, scope: &OrdersScope) -> Result<Vec<Fact>, FactSourceError> {
        (**self).sales_facts(scope).await
    }
}

#[async_trait]
impl<T: ViewFactSource + ?Sized> ViewFactSource for &T {
    async fn view_facts(&self, scope: &ViewsScope) -> Result<Vec<Fact>, FactSourceError> {
        (**self).view_facts(scope).await
    }
}

#[async_trait]
impl<T: ViewFactSource + ?Sized> ViewFactSource for Arc<T> {
    async fn view_facts(&self, scope: &ViewsScope) -> Result<Vec<Fact>, FactSourceError> {
        (**self).view_facts(scope).await
    }
}
