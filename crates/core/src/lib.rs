pub mod config;
pub mod domain;
pub mod errors;
pub mod ranking;

pub use domain::order::{Order, OrderId, OrderLine, OrderLineType, OrderStatus};
pub use domain::product::{Product, ProductId};
pub use domain::shop::{Shop, ShopId};
pub use domain::view::{ProductView, UserId, ViewId};
pub use errors::{ApplicationError, DomainError, FactSourceError, InterfaceError};
pub use ranking::{
    CombinedRank, MostSoldProducts, MostViewedProducts, PopularProducts, RankedList, Recommender,
    ScopeOptions, Signal, DEFAULT_LIMIT, EVERYTHING,
};
