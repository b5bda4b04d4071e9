use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskManifestError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Fs(#[from] Box<FsError>),

    #[diagnostic(code(cask::manifest::missing_field))]
    #[error(
        "Invalid cask manifest, required field {} is missing.",
        .field.style(Style::Property)
    )]
    MissingField { field: String },

    #[diagnostic(code(cask::manifest::invalid_field))]
    #[error(
        "Invalid cask manifest, field {} is invalid: {reason}",
        .field.style(Style::Property)
    )]
    InvalidField { field: String, reason: String },

    #[diagnostic(code(cask::manifest::invalid_syntax))]
    #[error("Unable to parse cask manifest as {format}.")]
    InvalidSyntax {
        format: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[diagnostic(
        code(cask::manifest::unknown_format),
        help = "Cask manifests must be .toml or .json files."
    )]
    #[error("Unknown cask manifest format for {}.", .path.style(Style::Path))]
    UnknownFormat { path: PathBuf },
}

impl CaskManifestError {
    /// Name of the manifest field at fault, if the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<FsError> for CaskManifestError {
    fn from(e: FsError) -> CaskManifestError {
        CaskManifestError::Fs(Box::new(e))
    }
}
