use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

/// One raw observation tying a measure to a product: a sold quantity or a
/// single page view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    product_id: ProductId,
    measure: f64,
}

impl Fact {
    pub fn new(product_id: ProductId, measure: f64) -> Result<Self, DomainError> {
        if !measure.is_finite() || measure < 0.0 {
            return Err(DomainError::InvalidMeasure { product_id, measure });
        }
        Ok(Self { product_id, measure })
    }

    /// A fact that counts once, as every recorded view does.
    pub fn unit(product_id: ProductId) -> Self {
        Self { product_id, measure: 1.0 }
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn measure(&self) -> f64 {
        self.measure
    }

    pub fn into_parts(self) -> (ProductId, f64) {
        (self.product_id, self.measure)
    }
}
