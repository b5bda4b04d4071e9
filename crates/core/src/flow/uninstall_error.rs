use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskUninstallError {
    #[diagnostic(
        code(cask::uninstall::permission_denied),
        help = "Check that you can write to the applications directory."
    )]
    #[error("Permission denied while removing {}.", .path.style(Style::Path))]
    PermissionDenied {
        path: PathBuf,
        #[source]
        error: Box<FsError>,
    },

    #[diagnostic(code(cask::uninstall::failed))]
    #[error("Failed to remove {}.", .path.style(Style::Path))]
    RemoveFailed {
        path: PathBuf,
        #[source]
        error: Box<FsError>,
    },

    #[diagnostic(
        code(cask::zap::incomplete),
        help = "Remove the remaining paths manually or rerun with elevated permissions."
    )]
    #[error(
        "Zap of {} could not remove {} path(s):\n{}",
        .id.style(Style::Id),
        .failures.len(),
        .failures.iter().map(|(path, reason)| format!("  {} ({reason})", path.style(Style::Path))).collect::<Vec<_>>().join("\n"),
    )]
    ZapIncomplete {
        id: String,
        failures: Vec<(PathBuf, String)>,
    },
}
