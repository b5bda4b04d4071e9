use crate::commands::{InfoArgs, InstallArgs, ListArgs, UninstallArgs, ZapArgs};
use clap::builder::styling::{Color, Style, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use starbase_styles::color::Color as ColorType;
use starbase::tracing::LogLevel as TracingLogLevel;

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> TracingLogLevel {
        match self {
            LogLevel::Off => TracingLogLevel::Off,
            LogLevel::Error => TracingLogLevel::Error,
            LogLevel::Warn => TracingLogLevel::Warn,
            LogLevel::Info => TracingLogLevel::Info,
            LogLevel::Debug => TracingLogLevel::Debug,
            LogLevel::Trace => TracingLogLevel::Trace,
        }
    }
}

fn fg(ty: ColorType) -> Style {
    Style::new().fg_color(Some(Color::from(ty as u8)))
}

fn create_styles() -> Styles {
    Styles::default()
        .error(fg(ColorType::Red))
        .header(Style::new().bold())
        .invalid(fg(ColorType::Yellow))
        .literal(fg(ColorType::Pink)) // args, options, etc
        .placeholder(fg(ColorType::GrayLight))
        .usage(fg(ColorType::Purple).bold())
        .valid(fg(ColorType::Green))
}

#[derive(Clone, Debug, Parser)]
#[command(
    name = "cask",
    version,
    about,
    long_about = None,
    disable_help_subcommand = true,
    propagate_version = true,
    next_line_help = false,
    styles = create_styles()
)]
pub struct App {
    #[arg(
        value_enum,
        long,
        global = true,
        env = "CASK_LOG",
        help = "Lowest log level to output"
    )]
    pub log: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(
        name = "info",
        about = "Display details about a cask manifest.",
        long_about = "Display details about a cask manifest, including the resolved download URL and the currently installed version."
    )]
    Info(InfoArgs),

    #[command(
        alias = "i",
        name = "install",
        about = "Download, verify, and install a cask.",
        long_about = "Download the artifact declared by a cask manifest, verify its checksum, and install the application bundle into the applications directory. Installing over an older version upgrades it."
    )]
    Install(InstallArgs),

    #[command(
        alias = "ls",
        name = "list",
        about = "List installed casks.",
        long_about = "List installed casks by reading receipts from ~/.cask/receipts."
    )]
    List(ListArgs),

    #[command(
        alias = "ui",
        name = "uninstall",
        about = "Uninstall a cask.",
        long_about = "Remove the application bundle of an installed cask. Per-user state is kept, use zap to remove it as well."
    )]
    Uninstall(UninstallArgs),

    #[command(
        name = "zap",
        about = "Uninstall a cask and remove its per-user state.",
        long_about = "Uninstall a cask and remove every cleanup path it declares, such as preferences, caches, and application support files."
    )]
    Zap(ZapArgs),
}
