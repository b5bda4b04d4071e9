mod info;
mod install;
mod list;
mod uninstall;
mod zap;

pub use info::*;
pub use install::*;
pub use list::*;
pub use uninstall::*;
pub use zap::*;
