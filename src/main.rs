//! Maintenance runner: applies pending migrations and repairs denormalized
//! counters of the forum database.

use std::process::ExitCode;

use config::{Config, Environment, File};

use pushkind_forum::db::{establish_connection_pool, run_migrations};
use pushkind_forum::models::config::ServerConfig;
use pushkind_forum::repository::{CounterMaintenance, DieselRepository, PostReader, ThreadReader};

fn load_config() -> Result<ServerConfig, config::ConfigError> {
    Config::builder()
        .add_source(File::with_name("config/default"))
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let server_config = match load_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to open database {}: {e}", server_config.database_url);
            return ExitCode::FAILURE;
        }
    };

    match run_migrations(&pool) {
        Ok(applied) => log::info!("Applied {applied} pending migrations"),
        Err(e) => {
            log::error!("Failed to run migrations: {e}");
            return ExitCode::FAILURE;
        }
    }

    let repo = DieselRepository::new(pool);
    match repo.recount_counters() {
        Ok(updated) => log::info!(target: "forum", "Counters recounted: {updated}"),
        Err(e) => {
            log::error!("Failed to recount counters: {e}");
            return ExitCode::FAILURE;
        }
    }

    match (repo.count_threads(None), repo.count_posts(None)) {
        (Ok(threads), Ok(posts)) => {
            log::info!("Forum holds {threads} threads and {posts} posts");
            ExitCode::SUCCESS
        }
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Failed to summarize forum: {e}");
            ExitCode::FAILURE
        }
    }
}
