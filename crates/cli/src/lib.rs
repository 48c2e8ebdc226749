pub mod commands;

use clap::{Parser, Subcommand};
use rankly_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "rankly",
    about = "Rankly operator CLI",
    long_about = "Rank popular products from completed orders and product views, and operate the backing database.",
    after_help = "Examples:\n  rankly migrate\n  rankly seed\n  rankly rank popular --limit 5\n  rankly rank sold --shop shop1 --json\n  rankly doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog, orders and views, then verify it")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity and migration state")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Rank products by sales, views, or both blended")]
    Rank(commands::rank::RankArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    init_logging(&logging);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Rank(args) => commands::rank::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(logging: &LoggingConfig) {
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};
    use crate::commands::rank::Strategy;

    #[test]
    fn rank_arguments_parse() {
        let cli = Cli::try_parse_from([
            "rankly",
            "rank",
            "sold",
            "--limit",
            "3",
            "--shops",
            "shop1,shop2",
            "--json",
        ])
        .expect("parse");

        let Command::Rank(args) = cli.command else {
            panic!("expected rank command");
        };
        assert_eq!(args.strategy, Strategy::Sold);
        assert_eq!(args.limit, Some(3));
        assert_eq!(args.shops, vec!["shop1".to_string(), "shop2".to_string()]);
        assert!(args.json);
        assert!(!args.anonymous_views);
    }

    #[test]
    fn repeated_order_flags_accumulate() {
        let cli = Cli::try_parse_from([
            "rankly",
            "rank",
            "popular",
            "--order",
            "O-1",
            "--order",
            "O-2",
            "--anonymous-views",
        ])
        .expect("parse");

        let Command::Rank(args) = cli.command else {
            panic!("expected rank command");
        };
        assert_eq!(args.orders, vec!["O-1".to_string(), "O-2".to_string()]);
        assert!(args.anonymous_views);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["rankly", "rank", "trending"]).is_err());
    }
}
