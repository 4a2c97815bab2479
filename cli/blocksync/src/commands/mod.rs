//! CLI command implementations.

pub mod apply;
pub mod init;
pub mod links;
pub mod status;
