//! Fills empty department/designation fields on existing user profiles with
//! the same defaults the import applies to new accounts.

use dotenv::dotenv;
use std::process::ExitCode;

use user_import_service::backend::SupabaseClient;
use user_import_service::config::AppConfig;
use user_import_service::services::defaults_backfill::backfill_missing_defaults;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let backend = match SupabaseClient::new(&config.backend) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("❌ Failed to build backend client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match backfill_missing_defaults(&backend).await {
        Ok(report) if report.failed == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            log::error!("❌ Could not list user profiles: {}", e);
            ExitCode::FAILURE
        }
    }
}
