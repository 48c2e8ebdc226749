use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use rankly_core::domain::order::OrderId;
use rankly_core::domain::shop::ShopId;
use rankly_core::errors::{ApplicationError, InterfaceError};
use rankly_core::ranking::{
    CombinedRank, MostSoldProducts, MostViewedProducts, PopularProducts, RankedList,
    RecommendationScope, Recommender, ScopeOptions, Signal, ViewFilter,
};
use rankly_db::{connect_with_config, DbPool, SqlOrderRepository, SqlProductViewRepository};

use crate::commands::{
    prepare, CommandResult, EXIT_BAD_REQUEST, EXIT_DB_CONNECTIVITY, EXIT_INTERNAL,
    EXIT_NO_RANKING, EXIT_SERVICE_UNAVAILABLE,
};

const COMMAND: &str = "rank";
const CORRELATION_ID: &str = "cli-rank";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Products ranked by sold quantity in completed orders.
    Sold,
    /// Products ranked by recorded page views.
    Viewed,
    /// Sales and views blended into one popularity score.
    #[default]
    Popular,
}

#[derive(Clone, Debug, Default, Args)]
pub struct RankArgs {
    #[arg(value_enum, help = "Ranking strategy to run")]
    pub strategy: Strategy,
    #[arg(long, help = "Number of products to return (0 returns every product)")]
    pub limit: Option<usize>,
    #[arg(long, help = "Only count completed orders of this shop")]
    pub shop: Option<String>,
    #[arg(long, value_delimiter = ',', help = "Only count completed orders of these shops")]
    pub shops: Vec<String>,
    #[arg(long = "order", help = "Count exactly these orders, whatever their status")]
    pub orders: Vec<String>,
    #[arg(long, help = "Only count views of visitors who were not signed in")]
    pub anonymous_views: bool,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

impl RankArgs {
    pub fn scope_options(&self) -> ScopeOptions {
        ScopeOptions {
            base_orders: (!self.orders.is_empty())
                .then(|| self.orders.iter().map(|id| OrderId::new(id.as_str())).collect()),
            shop: self.shop.as_deref().map(ShopId::new),
            shops: (!self.shops.is_empty())
                .then(|| self.shops.iter().map(|id| ShopId::new(id.as_str())).collect()),
            views: None,
            view_filter: self.anonymous_views.then(ViewFilter::anonymous),
        }
    }
}

enum Ranking {
    Single(RankedList),
    Combined(CombinedRank),
}

#[derive(Debug, Serialize)]
struct RankReport {
    command: &'static str,
    status: &'static str,
    strategy: Strategy,
    rank_field: &'static str,
    limit: usize,
    products: Vec<Map<String, Value>>,
}

pub fn run(args: RankArgs) -> CommandResult {
    let strategy = args.strategy;
    let (config, runtime) = match prepare(COMMAND) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let scope = match args.scope_options().validate() {
        Ok(scope) => scope,
        Err(error) => return interface_failure(ApplicationError::from(error)),
    };
    let limit = args.limit.unwrap_or(config.ranking.default_limit);

    let result = runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return Err(CommandResult::failure(
                    COMMAND,
                    "db_connectivity",
                    error.to_string(),
                    EXIT_DB_CONNECTIVITY,
                ));
            }
        };
        let ranking = execute(strategy, &pool, scope, limit).await;
        pool.close().await;
        ranking.map_err(interface_failure)
    });

    let ranking = match result {
        Ok(ranking) => ranking,
        Err(failure) => return failure,
    };

    let report = build_report(strategy, limit, &ranking);
    info!(
        event_name = "cli.rank.completed",
        strategy = ?strategy,
        products = report.products.len(),
        "ranking command completed"
    );

    let output = if args.json {
        serde_json::to_string(&report).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"rank\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report)
    };
    CommandResult { exit_code: 0, output }
}

async fn execute(
    strategy: Strategy,
    pool: &DbPool,
    scope: RecommendationScope,
    limit: usize,
) -> Result<Ranking, ApplicationError> {
    let orders = SqlOrderRepository::new(pool.clone());
    let views = SqlProductViewRepository::new(pool.clone());

    match strategy {
        Strategy::Sold => {
            MostSoldProducts::new(orders, scope.orders).recommend(limit).await.map(Ranking::Single)
        }
        Strategy::Viewed => {
            MostViewedProducts::new(views, scope.views).recommend(limit).await.map(Ranking::Single)
        }
        Strategy::Popular => PopularProducts::new(orders, views, scope)
            .recommend(limit)
            .await
            .map(Ranking::Combined),
    }
}

fn interface_failure(error: ApplicationError) -> CommandResult {
    let interface = error.into_interface(CORRELATION_ID);
    let exit_code = match interface {
        InterfaceError::BadRequest { .. } => EXIT_BAD_REQUEST,
        InterfaceError::NoRanking { .. } => EXIT_NO_RANKING,
        InterfaceError::ServiceUnavailable { .. } => EXIT_SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => EXIT_INTERNAL,
    };
    CommandResult::failure(
        COMMAND,
        interface.error_class(),
        format!("{} ({interface})", interface.user_message()),
        exit_code,
    )
}

fn build_report(strategy: Strategy, limit: usize, ranking: &Ranking) -> RankReport {
    let (rank_field, products) = match ranking {
        Ranking::Single(list) => (list.signal().rank_field(), ranked_rows(list)),
        Ranking::Combined(combined) => (Signal::Combined.rank_field(), combined_rows(combined)),
    };
    RankReport { command: COMMAND, status: "ok", strategy, rank_field, limit, products }
}

fn ranked_rows(list: &RankedList) -> Vec<Map<String, Value>> {
    let rank_field = list.signal().rank_field();
    list.iter()
        .map(|entry| {
            let mut row = Map::new();
            row.insert("product_id".to_string(), Value::from(entry.product_id.as_str()));
            row.insert(rank_field.to_string(), Value::from(entry.rank));
            row
        })
        .collect()
}

fn combined_rows(combined: &CombinedRank) -> Vec<Map<String, Value>> {
    combined
        .iter()
        .map(|entry| {
            let mut row = Map::new();
            row.insert("product_id".to_string(), Value::from(entry.product_id.as_str()));
            row.insert(Signal::Sales.rank_field().to_string(), Value::from(entry.sold_rank));
            row.insert(Signal::Views.rank_field().to_string(), Value::from(entry.view_rank));
            row.insert(Signal::Combined.rank_field().to_string(), Value::from(entry.rank));
            row
        })
        .collect()
}

fn render_human(report: &RankReport) -> String {
    let mut lines = vec![format!(
        "{:?} products by {} ({} returned):",
        report.strategy,
        report.rank_field,
        report.products.len()
    )];

    for (position, row) in report.products.iter().enumerate() {
        let product_id = row.get("product_id").and_then(Value::as_str).unwrap_or_default();
        let fields = row
            .iter()
            .filter(|(key, _)| key.as_str() != "product_id")
            .map(|(key, value)| match value.as_f64() {
                Some(rank) => format!("{key}={rank:.4}"),
                None => format!("{key}=-"),
            })
            .collect::<Vec<_>>();
        lines.push(format!("{:>3}. {product_id} {}", position + 1, fields.join(" ")));
    }

    lines.join("\n")
}
