use crate::session::CaskSession;
use cask_core::{Cask, InstallOptions, InstallOutcome, InstallPlan, Manager, SkipReason};
use clap::Args;
use starbase::AppResult;
use starbase_styles::color;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Clone, Debug)]
pub struct InstallArgs {
    #[arg(required = true, help = "Path to a cask manifest (.toml or .json)")]
    manifest: PathBuf,

    #[arg(long, help = "Reinstall even if this or a newer version is installed")]
    force: bool,

    #[arg(long, help = "Retries for transient network failures")]
    retries: Option<u8>,

    #[arg(long, help = "Fail immediately if the cask is already being changed")]
    no_wait: bool,
}

#[tracing::instrument(skip_all)]
pub async fn install(session: CaskSession, args: InstallArgs) -> AppResult {
    let cask = match Cask::load(&args.manifest) {
        Ok(cask) => cask,
        Err(error) => return session.report_failure(error.into()),
    };

    let mut options = InstallOptions::from_env(&session.env);
    options.force = args.force;
    options.lock_mode = session.lock_mode(args.no_wait);
    options.set_cancel_token(session.cancel.clone());

    if let Some(retries) = args.retries {
        options.fetch.retries = retries;
    }

    debug!(manifest = ?args.manifest, options = ?options, "Installing cask");

    let outcome = match Manager::new(&session.env).install(&cask, options).await {
        Ok(outcome) => outcome,
        Err(error) => return session.report_failure(error),
    };

    match outcome {
        InstallOutcome::Installed { plan, state } => {
            let action = match plan {
                InstallPlan::Upgrade { from } => format!("upgraded from {}", color::hash(from.as_str())),
                InstallPlan::Reinstall { .. } => "reinstalled".into(),
                _ => "installed".into(),
            };

            println!(
                "{} {} has been {action} to {}!",
                state.name,
                color::hash(state.version.as_str()),
                color::path(&state.install_path),
            );
        }
        InstallOutcome::Skipped { installed, reason } => {
            let why = match reason {
                SkipReason::SameVersion => "is already installed",
                SkipReason::NewerInstalled => "is older than the installed version",
                SkipReason::AutoUpdates => "updates itself",
            };

            println!(
                "{} {} {why} (installed {}), pass {} to reinstall",
                cask.name(),
                color::hash(cask.version().as_str()),
                color::hash(installed.as_str()),
                color::shell("--force"),
            );
        }
    };

    Ok(None)
}
