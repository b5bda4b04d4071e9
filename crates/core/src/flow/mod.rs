pub mod fetch;
mod fetch_error;
pub mod install;
mod install_error;
pub mod lock;
mod lock_error;
pub mod manage;
mod manage_error;
pub mod resolve;
mod resolve_error;
pub mod uninstall;
mod uninstall_error;
