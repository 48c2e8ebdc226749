//! Popular product rankings
//!
//! Turns raw sales and view facts into normalized per-product rankings and
//! blends the two signals into a single popularity score.

mod aggregate;
mod combine;
mod facts;
mod rank;
mod scope;
mod sources;
mod strategies;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use aggregate::{aggregate, AggregatedMeasure};
pub use combine::{combine, distance, CombinedEntry, CombinedRank};
pub use facts::Fact;
pub use rank::{rank, RankedEntry, RankedList};
pub use scope::{
    OrdersScope, RecommendationScope, ScopeOptions, ShopFilter, ViewFilter, ViewsScope,
    VisitorFilter,
};
pub use sources::{OrderFactSource, ViewFactSource};
pub use strategies::{MostSoldProducts, MostViewedProducts, PopularProducts, Recommender};

/// Passing this as `n` returns every ranked product.
pub const EVERYTHING: usize = 0;

/// Number of products returned when the caller does not say otherwise.
pub const DEFAULT_LIMIT: usize = 10;

/// Origin of a ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Sales,
    Views,
    Combined,
}

impl Signal {
    /// Field name used when presenting ranks of this signal.
    pub fn rank_field(self) -> &'static str {
        match self {
            Self::Sales => "sold_rank",
            Self::Views => "view_rank",
            Self::Combined => "rank",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sales => "sales",
            Self::Views => "views",
            Self::Combined => "combined",
        };
        f.write_str(label)
    }
}

/// Keeps the first `n` entries; `n == EVERYTHING` keeps all of them.
pub(crate) fn truncate<T>(entries: &mut Vec<T>, n: usize) {
    if n != EVERYTHING {
        entries.truncate(n);
    }
}

/// Stable descending sort: equal scores keep their incoming order.
pub(crate) fn sort_descending<T>(entries: &mut [T], score: impl Fn(&T) -> f64) {
    entries.sort_by(|a, b| score(b).total_cmp(&score(a)));
}
