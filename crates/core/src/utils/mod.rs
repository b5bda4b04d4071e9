pub mod archive;
pub mod process;
