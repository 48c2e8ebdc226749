use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::{ApplicationError, DomainError};

use super::aggregate::aggregate;
use super::combine::{combine, CombinedRank};
use super::rank::{rank, RankedList};
use super::scope::{OrdersScope, RecommendationScope, ScopeOptions, ViewsScope};
use super::sources::{OrderFactSource, ViewFactSource};
use super::{Signal, EVERYTHING};

/// A named ranking strategy.
#[async_trait]
pub trait Recommender: Send + Sync {
    type Output: Send;

    /// Returns at most `n` top products; `EVERYTHING` returns them all.
    async fn recommend(&self, n: usize) -> Result<Self::Output, ApplicationError>;
}

/// Ranks products by the total quantity sold.
pub struct MostSoldProducts<S> {
    source: S,
    scope: OrdersScope,
}

impl<S: OrderFactSource> MostSoldProducts<S> {
    pub fn new(source: S, scope: OrdersScope) -> Self {
        Self { source, scope }
    }

    pub fn with_options(source: S, options: ScopeOptions) -> Result<Self, DomainError> {
        Ok(Self::new(source, options.validate()?.orders))
    }

    pub fn scope(&self) -> &OrdersScope {
        &self.scope
    }
}

#[async_trait]
impl<S: OrderFactSource> Recommender for MostSoldProducts<S> {
    type Output = RankedList;

    async fn recommend(&self, n: usize) -> Result<RankedList, ApplicationError> {
        let facts = self.source.sales_facts(&self.scope).await?;
        let fact_count = facts.len();
        let aggregated = aggregate(facts);
        let ranked = rank(Signal::Sales, &aggregated, n)?;

        debug!(
            event_name = "ranking.sales.ranked",
            facts = fact_count,
            products = aggregated.len(),
            returned = ranked.len(),
            "ranked products by sold quantity"
        );
        Ok(ranked)
    }
}

/// Ranks products by the number of recorded page views.
pub struct MostViewedProducts<V> {
    source: V,
    scope: ViewsScope,
}

impl<V: ViewFactSource> MostViewedProducts<V> {
    pub fn new(source: V, scope: ViewsScope) -> Self {
        Self { source, scope }
    }

    pub fn with_options(source: V, options: ScopeOptions) -> Result<Self, DomainError> {
        Ok(Self::new(source, options.validate()?.views))
    }

    pub fn scope(&self) -> &ViewsScope {
        &self.scope
    }
}

#[async_trait]
impl<V: ViewFactSource> Recommender for MostViewedProducts<V> {
    type Output = RankedList;

    async fn recommend(&self, n: usize) -> Result<RankedList, ApplicationError> {
        let facts = self.source.view_facts(&self.scope).await?;
        let fact_count = facts.len();
        let aggregated = aggregate(facts);
        let ranked = rank(Signal::Views, &aggregated, n)?;

        debug!(
            event_name = "ranking.views.ranked",
            facts = fact_count,
            products = aggregated.len(),
            returned = ranked.len(),
            "ranked products by view count"
        );
        Ok(ranked)
    }
}

/// Blends the sales and views rankings into one popularity score.
///
/// Both inner rankings run untruncated so the join sees every product. A
/// signal with no data at all contributes an empty ranking; only when both
/// are empty does the blend fail.
pub struct PopularProducts<S, V> {
    sold: MostSoldProducts<S>,
    viewed: MostViewedProducts<V>,
}

impl<S: OrderFactSource, V: ViewFactSource> PopularProducts<S, V> {
    pub fn new(order_source: S, view_source: V, scope: RecommendationScope) -> Self {
        Self {
            sold: MostSoldProducts::new(order_source, scope.orders),
            viewed: MostViewedProducts::new(view_source, scope.views),
        }
    }

    pub fn with_options(
        order_source: S,
        view_source: V,
        options: ScopeOptions,
    ) -> Result<Self, DomainError> {
        Ok(Self::new(order_source, view_source, options.validate()?))
    }
}

#[async_trait]
impl<S: OrderFactSource, V: ViewFactSource> Recommender for PopularProducts<S, V> {
    type Output = CombinedRank;

    async fn recommend(&self, n: usize) -> Result<CombinedRank, ApplicationError> {
        let viewed = allow_missing(self.viewed.recommend(EVERYTHING).await, Signal::Views)?;
        let sold = allow_missing(self.sold.recommend(EVERYTHING).await, Signal::Sales)?;
        let combined = combine(&sold, &viewed)?;

        info!(
            event_name = "ranking.popular.combined",
            sold_products = sold.len(),
            viewed_products = viewed.len(),
            combined_products = combined.len(),
            "blended sales and views rankings"
        );
        Ok(combined.take(n))
    }
}

fn allow_missing(
    result: Result<RankedList, ApplicationError>,
    signal: Signal,
) -> Result<RankedList, ApplicationError> {
    match result {
        Err(error) if error.is_empty_input() => {
            debug!(
                event_name = "ranking.popular.signal_missing",
                signal = %signal,
                "signal has no data, blending without it"
            );
            Ok(RankedList::empty(signal))
        }
        other => other,
    }
}
