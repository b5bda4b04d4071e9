use miette::Diagnostic;
use starbase_styles::{Style, Stylize};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CaskChecksumError {
    #[diagnostic(
        code(cask::checksum::placeholder),
        help = "The artifact for this version has not been published with a real checksum yet."
    )]
    #[error("Checksum {} is a placeholder, refusing to trust it.", .value.style(Style::Hash))]
    Placeholder { value: String },

    #[diagnostic(code(cask::checksum::invalid_hex))]
    #[error("Checksum {} is not hex encoded.", .value.style(Style::Hash))]
    InvalidHex { value: String },

    #[diagnostic(
        code(cask::checksum::invalid_length),
        help = "Expected 64 hex characters for SHA-256, or 128 for SHA-512."
    )]
    #[error("Checksum {} has an unsupported length of {length}.", .value.style(Style::Hash))]
    InvalidLength { value: String, length: usize },

    #[diagnostic(code(cask::checksum::unsupported_algorithm))]
    #[error("Unsupported checksum algorithm {}.", .algo.style(Style::Symbol))]
    UnsupportedAlgorithm { algo: String },
}
