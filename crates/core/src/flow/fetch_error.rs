use crate::layout::CaskLayoutError;
use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskFetchError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Fs(#[from] Box<FsError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Layout(#[from] Box<CaskLayoutError>),

    #[diagnostic(code(cask::fetch::client))]
    #[error("Failed to create HTTP client.")]
    Client {
        #[source]
        error: Box<reqwest::Error>,
    },

    #[diagnostic(code(cask::fetch::failed))]
    #[error("Failed to download {}: {reason}", .url.style(Style::Url))]
    FetchFailed {
        url: String,
        reason: String,
        status: Option<u16>,
        retryable: bool,
    },

    #[diagnostic(
        code(cask::fetch::checksum_mismatch),
        help = "The download does not match the cask. Nothing was installed."
    )]
    #[error(
        "Checksum mismatch for {}! Received {} but expected {}.",
        .url.style(Style::Url),
        .actual.style(Style::Hash),
        .expected.style(Style::Hash),
    )]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[diagnostic(code(cask::fetch::cancelled))]
    #[error("Download of {} was cancelled.", .url.style(Style::Url))]
    Cancelled { url: String },

    #[diagnostic(code(cask::fetch::timed_out))]
    #[error(
        "Download of {} did not finish within {} seconds.",
        .url.style(Style::Url),
        .seconds,
    )]
    TimedOut { url: String, seconds: u64 },
}

impl CaskFetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { retryable: true, .. })
    }
}

impl From<FsError> for CaskFetchError {
    fn from(e: FsError) -> CaskFetchError {
        CaskFetchError::Fs(Box::new(e))
    }
}

impl From<CaskLayoutError> for CaskFetchError {
    fn from(e: CaskLayoutError) -> CaskFetchError {
        CaskFetchError::Layout(Box::new(e))
    }
}
