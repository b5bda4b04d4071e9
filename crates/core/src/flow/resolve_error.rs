use starbase_styles::{Style, Stylize};
use thiserror::Error;

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskResolveError {
    #[diagnostic(
        code(cask::resolve::missing_placeholder),
        help = "Use the version placeholder so the URL follows the cask version."
    )]
    #[error(
        "URL template {} does not reference the cask version.",
        .template.style(Style::Url),
    )]
    MissingPlaceholder { template: String },

    #[diagnostic(code(cask::resolve::unknown_placeholder))]
    #[error(
        "Unknown placeholder {} in URL template {}.",
        .placeholder.style(Style::Symbol),
        .template.style(Style::Url),
    )]
    UnknownPlaceholder {
        placeholder: String,
        template: String,
    },

    #[diagnostic(code(cask::resolve::unterminated_placeholder))]
    #[error(
        "Unterminated placeholder in URL template {}.",
        .template.style(Style::Url),
    )]
    UnterminatedPlaceholder { template: String },

    #[diagnostic(code(cask::resolve::unavailable_component))]
    #[error(
        "Placeholder {} is not available for version {}.",
        .placeholder.style(Style::Symbol),
        .version.style(Style::Hash),
    )]
    UnavailableComponent {
        placeholder: String,
        version: String,
    },

    #[diagnostic(code(cask::resolve::invalid_url))]
    #[error("Resolved download URL {} is invalid: {reason}", .url.style(Style::Url))]
    InvalidUrl { url: String, reason: String },
}
