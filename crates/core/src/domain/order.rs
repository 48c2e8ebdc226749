use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::domain::shop::ShopId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderLineId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Initial,
    Processing,
    Complete,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "initial" => Ok(Self::Initial),
            "processing" => Ok(Self::Processing),
            "complete" => Ok(Self::Complete),
            "canceled" => Ok(Self::Canceled),
            other => {
                Err(DomainError::UnknownValue { kind: "order status", value: other.to_string() })
            }
        }
    }
}

/// Kind of an order line. Only product lines count towards sales.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLineType {
    Product,
    Shipping,
    Payment,
    Discount,
    Other,
}

impl OrderLineType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Discount => "discount",
            Self::Other => "other",
        }
    }
}

impl FromStr for OrderLineType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "shipping" => Ok(Self::Shipping),
            "payment" => Ok(Self::Payment),
            "discount" => Ok(Self::Discount),
            "other" => Ok(Self::Other),
            other => {
                Err(DomainError::UnknownValue { kind: "order line type", value: other.to_string() })
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub line_type: OrderLineType,
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
}

impl OrderLine {
    pub fn product(id: impl Into<String>, product_id: ProductId, quantity: Decimal) -> Self {
        Self {
            id: OrderLineId(id.into()),
            line_type: OrderLineType::Product,
            product_id: Some(product_id),
            quantity,
        }
    }

    /// Product id of a line that counts as a sale of that product.
    pub fn sold_product(&self) -> Option<&ProductId> {
        match self.line_type {
            OrderLineType::Product => self.product_id.as_ref(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub shop_id: ShopId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn product_lines(&self) -> impl Iterator<Item = (&ProductId, &OrderLine)> {
        self.lines.iter().filter_map(|line| line.sold_product().map(|product| (product, line)))
    }
}
