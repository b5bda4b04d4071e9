use crate::flow::fetch::CaskFetchError;
use crate::flow::install::CaskInstallError;
use crate::flow::lock::CaskLockError;
use crate::flow::resolve::CaskResolveError;
use crate::flow::uninstall::CaskUninstallError;
use crate::layout::CaskLayoutError;
use crate::manifest_error::CaskManifestError;
use starbase_styles::{Style, Stylize};
use thiserror::Error;

/// Broad category of a failure, used for process exit codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureClass {
    Manifest,
    Verification,
    IncompatibleOs,
    FilesystemIo,
    Network,
    InProgress,
    Cancelled,
    Other,
}

impl FailureClass {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Other => 1,
            Self::Manifest => 2,
            Self::Verification => 3,
            Self::IncompatibleOs => 4,
            Self::FilesystemIo => 5,
            Self::Network => 6,
            Self::InProgress => 7,
            Self::Cancelled => 8,
        }
    }
}

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskManageError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Fetch(#[from] Box<CaskFetchError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Install(#[from] Box<CaskInstallError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Layout(#[from] Box<CaskLayoutError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Lock(#[from] Box<CaskLockError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Manifest(#[from] Box<CaskManifestError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Resolve(#[from] Box<CaskResolveError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Uninstall(#[from] Box<CaskUninstallError>),

    #[diagnostic(
        code(cask::zap::mismatched_identifier),
        help = "Pass the manifest that belongs to the cask being zapped."
    )]
    #[error(
        "Manifest is for {}, but {} was requested.",
        .actual.style(Style::Id),
        .expected.style(Style::Id),
    )]
    MismatchedIdentifier { expected: String, actual: String },

    #[diagnostic(
        code(cask::zap::not_installed),
        help = "Pass the cask manifest with --manifest to zap without a receipt."
    )]
    #[error("{} is not installed and no manifest was provided.", .id.style(Style::Id))]
    NotInstalled { id: String },
}

impl CaskManageError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Fetch(error) => match error.as_ref() {
                CaskFetchError::ChecksumMismatch { .. } => FailureClass::Verification,
                CaskFetchError::Cancelled { .. } | CaskFetchError::TimedOut { .. } => {
                    FailureClass::Cancelled
                }
                CaskFetchError::Client { .. } | CaskFetchError::FetchFailed { .. } => {
                    FailureClass::Network
                }
                CaskFetchError::Fs(_) | CaskFetchError::Layout(_) => FailureClass::FilesystemIo,
            },
            Self::Install(error) => match error.as_ref() {
                CaskInstallError::IncompatibleOS { .. } => FailureClass::IncompatibleOs,
                CaskInstallError::Cancelled { .. } | CaskInstallError::TimedOut { .. } => {
                    FailureClass::Cancelled
                }
                _ => FailureClass::FilesystemIo,
            },
            Self::Layout(_) | Self::Uninstall(_) => FailureClass::FilesystemIo,
            Self::Lock(error) => match error.as_ref() {
                CaskLockError::InProgress { .. } => FailureClass::InProgress,
                CaskLockError::Fs(_) => FailureClass::FilesystemIo,
                CaskLockError::Failed { .. } => FailureClass::Other,
            },
            Self::Manifest(_) | Self::Resolve(_) | Self::MismatchedIdentifier { .. } => {
                FailureClass::Manifest
            }
            Self::NotInstalled { .. } => FailureClass::Other,
        }
    }
}

impl From<CaskFetchError> for CaskManageError {
    fn from(e: CaskFetchError) -> CaskManageError {
        CaskManageError::Fetch(Box::new(e))
    }
}

impl From<CaskInstallError> for CaskManageError {
    fn from(e: CaskInstallError) -> CaskManageError {
        CaskManageError::Install(Box::new(e))
    }
}

impl From<CaskLayoutError> for CaskManageError {
    fn from(e: CaskLayoutError) -> CaskManageError {
        CaskManageError::Layout(Box::new(e))
    }
}

impl From<CaskLockError> for CaskManageError {
    fn from(e: CaskLockError) -> CaskManageError {
        CaskManageError::Lock(Box::new(e))
    }
}

impl From<CaskManifestError> for CaskManageError {
    fn from(e: CaskManifestError) -> CaskManageError {
        CaskManageError::Manifest(Box::new(e))
    }
}

impl From<CaskResolveError> for CaskManageError {
    fn from(e: CaskResolveError) -> CaskManageError {
        CaskManageError::Resolve(Box::new(e))
    }
}

impl From<CaskUninstallError> for CaskManageError {
    fn from(e: CaskUninstallError) -> CaskManageError {
        CaskManageError::Uninstall(Box::new(e))
    }
}
