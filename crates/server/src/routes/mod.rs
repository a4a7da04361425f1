//! Request handlers, grouped by resource

pub mod scaling;
pub mod stress;
