//! CLI command implementations

pub mod history;
pub mod status;
pub mod stress;
