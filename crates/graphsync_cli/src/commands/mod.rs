//! CLI command implementations.

pub mod apply;
pub mod decode;
pub mod provision;
