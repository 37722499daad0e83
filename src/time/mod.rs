//! Clock access and calendar labels.

pub mod labels;
pub mod source;
