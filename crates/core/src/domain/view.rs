use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub String);

impl ViewId {
    pub fn generate() -> Self {
        Self(format!("view-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// One recorded visit of a product page. Anonymous visits carry no user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: ViewId,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl ProductView {
    pub fn new(product_id: ProductId, user_id: Option<UserId>) -> Self {
        Self { id: ViewId::generate(), product_id, user_id, created_at: Utc::now() }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}
