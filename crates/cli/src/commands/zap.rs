use crate::error::CaskCliError;
use crate::session::CaskSession;
use cask_core::flow::uninstall::expand_cleanup_path;
use cask_core::{Cask, CaskId, CaskManageError, Manager, UninstallTarget};
use clap::Args;
use dialoguer::Confirm;
use miette::IntoDiagnostic;
use starbase::AppResult;
use starbase_styles::color;
use std::io::{IsTerminal, stdin};
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Clone, Debug)]
pub struct ZapArgs {
    #[arg(required = true, help = "Identifier of the cask to zap")]
    id: String,

    #[arg(long, help = "Manifest to read cleanup paths from, in addition to the receipt")]
    manifest: Option<PathBuf>,

    #[arg(long, help = "Fail immediately if the cask is already being changed")]
    no_wait: bool,

    #[arg(long, short = 'y', help = "Avoid and force confirm prompts")]
    yes: bool,
}

struct ZapPreview {
    paths: Vec<PathBuf>,
    has_receipt: bool,
}

// Paths shown to the user before anything is deleted. The actual removal
// re-reads the receipt under the install lock.
fn preview_zap(
    session: &CaskSession,
    id: &CaskId,
    cask: Option<&Cask>,
) -> Result<ZapPreview, CaskManageError> {
    let receipt = session.env.store.load_receipt(id)?;
    let has_receipt = receipt.is_some();

    let target = match (receipt, cask) {
        (Some(state), Some(cask)) => {
            let mut target = UninstallTarget::from(&state);
            target.merge_cleanup_paths(cask.cleanup_paths());
            target
        }
        (Some(state), None) => UninstallTarget::from(&state),
        (None, Some(cask)) => UninstallTarget::from_cask(cask, &session.env.app_dir),
        (None, None) => return Err(CaskManageError::NotInstalled { id: id.to_string() }),
    };

    let mut paths = vec![target.install_path.clone()];

    for cleanup_path in &target.cleanup_paths {
        paths.extend(expand_cleanup_path(cleanup_path, &session.env.home_dir));
    }

    Ok(ZapPreview {
        paths: paths.into_iter().filter(|path| path.exists()).collect(),
        has_receipt,
    })
}

#[tracing::instrument(skip_all)]
pub async fn zap(session: CaskSession, args: ZapArgs) -> AppResult {
    let id = match CaskId::new(&args.id) {
        Ok(id) => id,
        Err(error) => return session.report_failure(error.into()),
    };

    let cask = match args.manifest.as_ref().map(Cask::load).transpose() {
        Ok(cask) => cask,
        Err(error) => return session.report_failure(error.into()),
    };

    if !args.yes {
        let preview = match preview_zap(&session, &id, cask.as_ref()) {
            Ok(preview) => preview,
            Err(error) => return session.report_failure(error),
        };

        if preview.paths.is_empty() && !preview.has_receipt {
            println!("Nothing to remove for {}", color::id(id.as_str()));

            return Ok(None);
        }

        // A receipt with nothing left on disk is removed without a prompt
        if !preview.paths.is_empty() {
            if !stdin().is_terminal() {
                return Err(CaskCliError::ZapRequiresConfirmation { id: id.to_string() }.into());
            }

            println!("The following will be permanently removed:");

            for path in &preview.paths {
                println!("  {} {}", color::muted("-"), color::path(path));
            }

            let confirmed = Confirm::new()
                .with_prompt(format!("Zap {}?", color::id(id.as_str())))
                .default(false)
                .interact()
                .into_diagnostic()?;

            if !confirmed {
                debug!("Zap not confirmed, skipping");

                return Ok(None);
            }
        }
    }

    let report = match Manager::new(&session.env)
        .zap(&id, cask.as_ref(), session.lock_mode(args.no_wait))
        .await
    {
        Ok(report) => report,
        Err(error) => return session.report_failure(error),
    };

    debug!(
        removed = ?report.removed,
        missing = ?report.missing,
        "Zapped cask",
    );

    println!(
        "{} has been zapped! Removed {} cleanup path(s){}",
        color::id(id.as_str()),
        report.removed.len(),
        if report.removed_bundle {
            " and the application bundle"
        } else {
            ""
        },
    );

    Ok(None)
}
