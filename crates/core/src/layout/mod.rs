mod layout_error;
mod receipt;
mod store;

pub use layout_error::*;
pub use receipt::*;
pub use store::*;
