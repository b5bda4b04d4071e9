use miette::Diagnostic;
use starbase_styles::{Style, Stylize};
use starbase_utils::toml::TomlError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CaskConfigError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Toml(#[from] Box<TomlError>),

    #[diagnostic(code(cask::config::invalid_app_dir))]
    #[error(
        "Applications directory {} must be an absolute path.",
        .path.style(Style::Path),
    )]
    RelativeAppDir { path: PathBuf },
}

impl From<TomlError> for CaskConfigError {
    fn from(e: TomlError) -> CaskConfigError {
        CaskConfigError::Toml(Box::new(e))
    }
}
