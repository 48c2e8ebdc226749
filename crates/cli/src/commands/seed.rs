use rankly_db::{connect_with_config, migrations, DemoDataset, SeedResult};

use crate::commands::{prepare, CommandResult, EXIT_DB_CONNECTIVITY, EXIT_MIGRATION, EXIT_SEED};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB_CONNECTIVITY))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seed_result = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_SEED))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_SEED))?;

        let run_result: Result<SeedResult, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(seed_result)
            } else {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                Err(("seed_verification", verification_failure_message(&failed_checks), EXIT_SEED))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "demo dataset loaded: {} shops, {} products, {} orders, {} product views",
        seeded.shops, seeded.products, seeded.orders, seeded.views
    )
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use rankly_db::SeedResult;

    use super::{summary, verification_failure_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("shops", true), ("sales-p3", false), ("views-p5", false)];
        let failed_checks = checks
            .iter()
            .filter_map(|(check, passed)| (!passed).then_some(*check))
            .collect::<Vec<_>>();

        assert_eq!(
            verification_failure_message(&failed_checks),
            "Seed verification failed for checks: sales-p3, views-p5"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_failure_message(&[]), "Some seed data failed to load");
    }

    #[test]
    fn summary_lists_seeded_counts() {
        let seeded = SeedResult { shops: 2, products: 5, orders: 6, views: 100 };
        assert_eq!(
            summary(&seeded),
            "demo dataset loaded: 2 shops, 5 products, 6 orders, 100 product views"
        );
    }
}
