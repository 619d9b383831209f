//! Backend entry-point: loads configuration, applies migrations on request
//! and serves the account API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use tracing::info;

use account_service::logging::{self, ROOT, WEBSERVER};
use account_service::outbound::persistence::{DbPool, PoolConfig, migrations};
use account_service::settings::{AppConfig, DEFAULT_CONFIG_PATH};

use server::{ServerConfig, create_server};

const LOG_FILE: &str = "account-service.log";

/// `account-service` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "account-service",
    about = "Account REST API with audited, paginated request pipeline",
    version
)]
struct Cli {
    /// Directory holding `database.yml`, `clients.yml` and `system.yml`.
    #[arg(long = "config-path", value_name = "dir", default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,
    /// Apply pending database migrations, then exit.
    #[arg(long)]
    syncdb: bool,
    /// Listen address, overriding `system.yml`.
    #[arg(long, value_name = "addr")]
    bind: Option<SocketAddr>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config_path)
        .wrap_err_with(|| format!("failed to load config from {}", cli.config_path.display()))?;
    let _guard = logging::init(&config.system.log_dir, LOG_FILE)?;
    let database_url = config.database.url().map_err(|message| eyre!(message))?;

    if cli.syncdb {
        let applied = actix_web::rt::task::spawn_blocking(move || {
            migrations::run_pending(&database_url)
        })
        .await
        .wrap_err("migration task aborted")??;
        logging::logger(ROOT).in_scope(|| {
            info!(count = applied.len(), versions = ?applied, "database migrations applied");
        });
        return Ok(());
    }

    let bind_addr = match cli.bind {
        Some(addr) => addr,
        None => config
            .system
            .socket_addr()
            .wrap_err("system.yml bind_addr is not a socket address")?,
    };
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(config.database.max_connections),
    )
    .await
    .wrap_err("failed to create database pool")?;

    let server = create_server(ServerConfig::new(
        bind_addr,
        pool,
        config.clients.apollo.clone(),
    ))
    .wrap_err_with(|| format!("failed to start server on {bind_addr}"))?;

    logging::logger(WEBSERVER).in_scope(|| {
        info!(
            bind_addr = %bind_addr,
            environment = %config.system.environment,
            "server started"
        );
    });
    server.await?;
    logging::logger(WEBSERVER).in_scope(|| info!("server stopped"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_to_development_config() {
        let cli = Cli::try_parse_from(["account-service"]).expect("no arguments needed");
        assert_eq!(cli.config_path, PathBuf::from("configs/development"));
        assert!(!cli.syncdb);
        assert_eq!(cli.bind, None);
    }

    #[rstest]
    #[case(&["account-service", "--syncdb"], true, None)]
    #[case(
        &["account-service", "--config-path", "/etc/accounts", "--bind", "127.0.0.1:9000"],
        false,
        Some("127.0.0.1:9000")
    )]
    fn parses_flags(#[case] args: &[&str], #[case] syncdb: bool, #[case] bind: Option<&str>) {
        let cli = Cli::try_parse_from(args).expect("valid arguments");
        assert_eq!(cli.syncdb, syncdb);
        assert_eq!(
            cli.bind,
            bind.map(|addr| addr.parse().expect("socket address"))
        );
    }

    #[test]
    fn rejects_malformed_bind_address() {
        assert!(Cli::try_parse_from(["account-service", "--bind", "everywhere"]).is_err());
    }
}
