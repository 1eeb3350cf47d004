pub mod localized;
pub mod opportunity;
pub mod plan;
