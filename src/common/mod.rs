// Shared constants and helpers used across modules

pub mod constants;
pub mod utils;
