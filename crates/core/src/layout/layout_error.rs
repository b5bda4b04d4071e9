use miette::Diagnostic;
use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use starbase_utils::json::JsonError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CaskLayoutError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Fs(#[from] Box<FsError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Json(#[from] Box<JsonError>),

    #[diagnostic(
        code(cask::store::invalid_receipt),
        help = "Remove the receipt and reinstall the cask."
    )]
    #[error("Install receipt {} is corrupt.", .path.style(Style::Path))]
    InvalidReceipt {
        path: PathBuf,
        #[source]
        error: Box<serde_json::Error>,
    },
}

impl From<FsError> for CaskLayoutError {
    fn from(e: FsError) -> CaskLayoutError {
        CaskLayoutError::Fs(Box::new(e))
    }
}

impl From<JsonError> for CaskLayoutError {
    fn from(e: JsonError) -> CaskLayoutError {
        CaskLayoutError::Json(Box::new(e))
    }
}
