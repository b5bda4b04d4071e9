use crate::utils::archive::CaskArchiveError;
use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskInstallError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Fs(#[from] Box<FsError>),

    #[diagnostic(code(cask::install::cancelled))]
    #[error("Install of {} was cancelled.", .id.style(Style::Id))]
    Cancelled { id: String },

    #[diagnostic(
        code(cask::install::incompatible_os),
        help = "This application does not support your version of macOS."
    )]
    #[error(
        "{} requires {}, but this machine is running {}.",
        .id.style(Style::Id),
        .requirement.style(Style::Label),
        .host.style(Style::Label),
    )]
    IncompatibleOS {
        id: String,
        requirement: String,
        host: String,
    },

    #[diagnostic(
        code(cask::install::insufficient_space),
        help = "Free up disk space and try again."
    )]
    #[error("Not enough disk space to install into {}.", .path.style(Style::Path))]
    InsufficientSpace {
        path: PathBuf,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[diagnostic(
        code(cask::install::permission_denied),
        help = "Check that you can write to the applications directory."
    )]
    #[error("Permission denied while writing {}.", .path.style(Style::Path))]
    PermissionDenied {
        path: PathBuf,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[diagnostic(
        code(cask::install::timed_out),
        help = "Raise install.timeout in ~/.cask/config.toml for very large applications."
    )]
    #[error(
        "Install of {} did not finish within {seconds} seconds.",
        .id.style(Style::Id),
    )]
    TimedOut { id: String, seconds: u64 },

    #[diagnostic(code(cask::install::stage_failed))]
    #[error(
        "Failed to stage {} for {}: {reason}",
        .artifact.style(Style::File),
        .id.style(Style::Id),
    )]
    StageFailure {
        id: String,
        artifact: String,
        reason: String,
    },

    #[diagnostic(code(cask::install::unpack_failed))]
    #[error(
        "Failed to unpack {} for {}.",
        .artifact.style(Style::File),
        .id.style(Style::Id),
    )]
    UnpackFailure {
        id: String,
        artifact: String,
        #[source]
        error: Box<CaskArchiveError>,
    },
}

impl From<FsError> for CaskInstallError {
    fn from(e: FsError) -> CaskInstallError {
        CaskInstallError::Fs(Box::new(e))
    }
}
