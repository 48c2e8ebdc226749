use std::env;
use std::sync::{Mutex, OnceLock};

use rankly_cli::commands::rank::{RankArgs, Strategy};
use rankly_cli::commands::{config, doctor, migrate, rank, seed};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("RANKLY_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("RANKLY_DATABASE_URL", "postgres://localhost/rankly")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_returns_dataset_summary() {
    with_env(&[("RANKLY_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected deterministic seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(
            payload["message"],
            "demo dataset loaded: 2 shops, 5 products, 6 orders, 100 product views"
        );
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);
    with_env(&[("RANKLY_DATABASE_URL", &url)], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn rank_popular_over_seeded_database() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);
    with_env(&[("RANKLY_DATABASE_URL", &url)], || {
        assert_eq!(seed::run().exit_code, 0, "seed should succeed");

        let result =
            rank::run(RankArgs { strategy: Strategy::Popular, json: true, ..RankArgs::default() });
        assert_eq!(result.exit_code, 0, "expected ranking success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "rank");
        assert_eq!(payload["strategy"], "popular");
        assert_eq!(payload["rank_field"], "rank");
        assert_eq!(product_ids(&payload), vec!["p3", "p4", "p2", "p5", "p1"]);
        assert_eq!(payload["products"][0]["rank"], 1.0);
    });
}

#[test]
fn rank_sold_respects_shop_and_limit() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);
    with_env(&[("RANKLY_DATABASE_URL", &url)], || {
        assert_eq!(seed::run().exit_code, 0, "seed should succeed");

        let result = rank::run(RankArgs {
            strategy: Strategy::Sold,
            shop: Some("shop1".to_string()),
            limit: Some(2),
            json: true,
            ..RankArgs::default()
        });
        assert_eq!(result.exit_code, 0, "expected ranking success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["rank_field"], "sold_rank");
        assert_eq!(payload["limit"], 2);
        assert_eq!(product_ids(&payload), vec!["p3", "p2"]);
    });
}

#[test]
fn rank_uses_configured_default_limit() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);
    with_env(&[("RANKLY_DATABASE_URL", &url), ("RANKLY_RANKING_DEFAULT_LIMIT", "1")], || {
        assert_eq!(seed::run().exit_code, 0, "seed should succeed");

        let result =
            rank::run(RankArgs { strategy: Strategy::Viewed, json: true, ..RankArgs::default() });
        let payload = parse_payload(&result.output);
        assert_eq!(payload["rank_field"], "view_rank");
        assert_eq!(product_ids(&payload), vec!["p3"]);
    });
}

#[test]
fn rank_rejects_conflicting_shop_filters() {
    with_env(&[("RANKLY_DATABASE_URL", "sqlite::memory:")], || {
        let result = rank::run(RankArgs {
            strategy: Strategy::Sold,
            shop: Some("shop1".to_string()),
            shops: vec!["shop2".to_string()],
            ..RankArgs::default()
        });
        assert_eq!(result.exit_code, 7, "expected bad request code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "bad_request");
    });
}

#[test]
fn rank_reports_missing_data_on_empty_database() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);
    with_env(&[("RANKLY_DATABASE_URL", &url)], || {
        assert_eq!(migrate::run().exit_code, 0, "migrate should succeed");

        let result = rank::run(RankArgs { strategy: Strategy::Popular, ..RankArgs::default() });
        assert_eq!(result.exit_code, 8, "expected no-ranking code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "no_ranking");
    });
}

#[test]
fn rank_reports_service_unavailable_without_schema() {
    with_env(&[("RANKLY_DATABASE_URL", "sqlite::memory:")], || {
        let result = rank::run(RankArgs { strategy: Strategy::Sold, ..RankArgs::default() });
        assert_eq!(result.exit_code, 9, "expected service-unavailable code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "service_unavailable");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("RANKLY_DATABASE_URL", "sqlite::memory:"), ("RANKLY_LOG_LEVEL", "debug")], || {
        let output = config::run();

        assert!(output.contains("- database.url = sqlite::memory: (source: env (RANKLY_DATABASE_URL))"));
        assert!(output.contains("- logging.level = debug (source: env (RANKLY_LOG_LEVEL))"));
    });
}

#[test]
fn doctor_reports_pending_migrations() {
    with_env(&[("RANKLY_DATABASE_URL", "sqlite::memory:")], || {
        let report: Value = serde_json::from_str(&doctor::run(true)).expect("doctor json");

        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][0]["status"], "pass");
        assert_eq!(report["checks"][1]["name"], "database_connectivity");
        assert_eq!(report["checks"][1]["status"], "pass");
        assert_eq!(report["checks"][2]["name"], "schema_migrations");
        assert_eq!(report["checks"][2]["status"], "fail");
    });
}

#[test]
fn doctor_passes_after_migrate() {
    let dir = TempDir::new().expect("temp dir");
    let url = database_url(&dir);
    with_env(&[("RANKLY_DATABASE_URL", &url)], || {
        assert_eq!(migrate::run().exit_code, 0, "migrate should succeed");

        let report: Value = serde_json::from_str(&doctor::run(true)).expect("doctor json");
        assert_eq!(report["overall_status"], "pass");
    });
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("rankly.db").display())
}

fn product_ids(payload: &Value) -> Vec<&str> {
    payload["products"]
        .as_array()
        .expect("products should be an array")
        .iter()
        .map(|row| row["product_id"].as_str().unwrap_or_default())
        .collect()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "RANKLY_DATABASE_URL",
        "RANKLY_DATABASE_MAX_CONNECTIONS",
        "RANKLY_DATABASE_TIMEOUT_SECS",
        "RANKLY_RANKING_DEFAULT_LIMIT",
        "RANKLY_LOGGING_LEVEL",
        "RANKLY_LOGGING_FORMAT",
        "RANKLY_LOG_LEVEL",
        "RANKLY_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
