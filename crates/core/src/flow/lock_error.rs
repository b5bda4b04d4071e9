use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskLockError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Fs(#[from] Box<FsError>),

    #[diagnostic(
        code(cask::lock::in_progress),
        help = "Wait for the other operation to finish and try again."
    )]
    #[error(
        "Another install or uninstall of {} is in progress.",
        .id.style(Style::Id),
    )]
    InProgress { id: String },

    #[diagnostic(code(cask::lock::failed))]
    #[error("Failed to acquire the install lock for {}.", .id.style(Style::Id))]
    Failed {
        id: String,
        #[source]
        error: Box<tokio::task::JoinError>,
    },
}

impl From<FsError> for CaskLockError {
    fn from(e: FsError) -> CaskLockError {
        CaskLockError::Fs(Box::new(e))
    }
}
