use miette::Diagnostic;
use starbase_styles::{Style, Stylize};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CaskCliError {
    #[diagnostic(
        code(cask::cli::zap_requires_confirmation),
        help = "Pass --yes to zap without a prompt."
    )]
    #[error(
        "Zapping {} permanently removes user data and must be confirmed, but no terminal is attached.",
        .id.style(Style::Id),
    )]
    ZapRequiresConfirmation { id: String },
}
