use crate::session::CaskSession;
use cask_core::{CaskId, Manager};
use clap::Args;
use starbase::AppResult;
use starbase_styles::color;

#[derive(Args, Clone, Debug)]
pub struct UninstallArgs {
    #[arg(required = true, help = "Identifier of the cask to uninstall")]
    id: String,

    #[arg(long, help = "Fail immediately if the cask is already being changed")]
    no_wait: bool,
}

#[tracing::instrument(skip_all)]
pub async fn uninstall(session: CaskSession, args: UninstallArgs) -> AppResult {
    let id = match CaskId::new(&args.id) {
        Ok(id) => id,
        Err(error) => return session.report_failure(error.into()),
    };

    let result = Manager::new(&session.env)
        .uninstall(&id, session.lock_mode(args.no_wait))
        .await;

    match result {
        Ok(Some(state)) => {
            println!(
                "{} {} has been uninstalled!",
                state.name,
                color::hash(state.version.as_str()),
            );
        }
        Ok(None) => {
            println!("{} is not installed, nothing to do", color::id(id.as_str()));
        }
        Err(error) => return session.report_failure(error),
    };

    Ok(None)
}
