use crate::utils::process::CaskProcessError;
use starbase_styles::{Style, Stylize};
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskEnvError {
    #[diagnostic(code(cask::env::home_dir))]
    #[error("Unable to determine your home directory.")]
    MissingHomeDir,

    #[diagnostic(code(cask::env::os_detection))]
    #[error("Unable to detect the macOS version of this machine.")]
    FailedOsDetection {
        #[source]
        error: Box<CaskProcessError>,
    },

    #[diagnostic(
        code(cask::env::invalid_os_version),
        help = "Set CASK_OS_VERSION to a version like 14.5, or unset it."
    )]
    #[error("Invalid operating system version {}.", .version.style(Style::Hash))]
    InvalidOsVersion { version: String },
}
