mod app;
mod commands;
mod error;
mod printer;
mod session;

use app::{App as CLI, Commands};
use cask_core::CaskEnvironment;
use clap::Parser;
use session::CaskSession;
use starbase::tracing::TracingOptions;
use starbase::{App, MainResult};
use starbase_utils::string_vec;
use std::env;
use std::process::ExitCode;
use tracing::debug;

#[tokio::main]
async fn main() -> MainResult {
    let app = App::default();
    app.setup_diagnostics();

    let cli = CLI::parse();

    // `--log` and `CASK_LOG` are both resolved by clap, so tracing reads
    // its own variable and otherwise falls back to the chosen level
    let _guard = app.setup_tracing(TracingOptions {
        default_level: cli.log.clone().unwrap_or_default().to_tracing_level(),
        filter_modules: string_vec!["cask", "starbase"],
        log_env: "STARBASE_LOG".into(),
        test_env: "CASK_TEST".into(),
        ..TracingOptions::default()
    });

    debug!(
        args = ?env::args().collect::<Vec<_>>(),
        "Running cask v{}",
        env!("CARGO_PKG_VERSION")
    );

    let session = CaskSession::new(cli, CaskEnvironment::new()?);

    let exit_code = app
        .run(session, |session| async {
            match session.cli.command.clone() {
                Commands::Info(args) => commands::info(session, args).await,
                Commands::Install(args) => commands::install(session, args).await,
                Commands::List(args) => commands::list(session, args).await,
                Commands::Uninstall(args) => commands::uninstall(session, args).await,
                Commands::Zap(args) => commands::zap(session, args).await,
            }
        })
        .await?;

    Ok(ExitCode::from(exit_code))
}
