use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderId, OrderStatus};
use crate::domain::shop::ShopId;
use crate::domain::view::{ProductView, UserId, ViewId};
use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopFilter {
    #[default]
    All,
    Single(ShopId),
    Many(Vec<ShopId>),
}

impl ShopFilter {
    pub fn allows(&self, shop_id: &ShopId) -> bool {
        match self {
            Self::All => true,
            Self::Single(shop) => shop == shop_id,
            Self::Many(shops) => shops.contains(shop_id),
        }
    }
}

/// Which order lines feed the sales ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdersScope {
    /// Exactly these orders, whatever their status or shop.
    Explicit(Vec<OrderId>),
    /// Completed orders, optionally limited to some shops.
    Completed { shops: ShopFilter },
}

impl Default for OrdersScope {
    fn default() -> Self {
        Self::Completed { shops: ShopFilter::All }
    }
}

impl OrdersScope {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            Self::Explicit(orders) => orders.contains(&order.id),
            Self::Completed { shops } => {
                order.status == OrderStatus::Complete && shops.allows(&order.shop_id)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorFilter {
    #[default]
    Any,
    Anonymous,
    Authenticated,
    User(UserId),
}

/// Narrows the view log by visitor and creation time (inclusive bounds).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilter {
    pub visitor: VisitorFilter,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ViewFilter {
    pub fn anonymous() -> Self {
        Self { visitor: VisitorFilter::Anonymous, ..Self::default() }
    }

    pub fn matches(&self, view: &ProductView) -> bool {
        let visitor_ok = match &self.visitor {
            VisitorFilter::Any => true,
            VisitorFilter::Anonymous => view.user_id.is_none(),
            VisitorFilter::Authenticated => view.user_id.is_some(),
            VisitorFilter::User(user) => view.user_id.as_ref() == Some(user),
        };
        visitor_ok
            && self.since.map_or(true, |since| view.created_at >= since)
            && self.until.map_or(true, |until| view.created_at <= until)
    }
}

/// Which recorded views feed the views ranking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewsScope {
    #[default]
    All,
    Explicit(Vec<ViewId>),
    Filtered(ViewFilter),
}

impl ViewsScope {
    pub fn matches(&self, view: &ProductView) -> bool {
        match self {
            Self::All => true,
            Self::Explicit(views) => views.contains(&view.id),
            Self::Filtered(filter) => filter.matches(view),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationScope {
    pub orders: OrdersScope,
    pub views: ViewsScope,
}

/// Loose scoping options as a caller or config file supplies them.
///
/// `validate` turns them into a `RecommendationScope`, rejecting any
/// combination whose precedence would be ambiguous.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeOptions {
    pub base_orders: Option<Vec<OrderId>>,
    pub shop: Option<ShopId>,
    pub shops: Option<Vec<ShopId>>,
    pub views: Option<Vec<ViewId>>,
    pub view_filter: Option<ViewFilter>,
}

impl ScopeOptions {
    pub fn validate(self) -> Result<RecommendationScope, DomainError> {
        let orders = match (self.base_orders, self.shop, self.shops) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(DomainError::InvalidScope(
                    "`base_orders` cannot be combined with `shop` or `shops`".to_string(),
                ));
            }
            (_, Some(_), Some(_)) => {
                return Err(DomainError::InvalidScope(
                    "`shop` and `shops` are mutually exclusive".to_string(),
                ));
            }
            (Some(orders), None, None) => {
                if orders.is_empty() {
                    return Err(DomainError::InvalidScope(
                        "`base_orders` must name at least one order".to_string(),
                    ));
                }
                OrdersScope::Explicit(orders)
            }
            (None, Some(shop), None) => OrdersScope::Completed { shops: ShopFilter::Single(shop) },
            (None, None, Some(shops)) => {
                if shops.is_empty() {
                    return Err(DomainError::InvalidScope(
                        "`shops` must name at least one shop".to_string(),
                    ));
                }
                OrdersScope::Completed { shops: ShopFilter::Many(shops) }
            }
            (None, None, None) => OrdersScope::default(),
        };

        let views = match (self.views, self.view_filter) {
            (Some(_), Some(_)) => {
                return Err(DomainError::InvalidScope(
                    "`views` and `view_filter` are mutually exclusive".to_string(),
                ));
            }
            (Some(views), None) => {
                if views.is_empty() {
                    return Err(DomainError::InvalidScope(
                        "`views` must name at least one view".to_string(),
                    ));
                }
                ViewsScope::Explicit(views)
            }
            (None, Some(filter)) => {
                if let (Some(since), Some(until)) = (filter.since, filter.until) {
                    if since > until {
                        return Err(DomainError::InvalidScope(
                            "`view_filter.since` must not be later than `view_filter.until`"
                                .to_string(),
                        ));
                    }
                }
                ViewsScope::Filtered(filter)
            }
            (None, None) => ViewsScope::All,
        };

        Ok(RecommendationScope { orders, views })
    }
}
