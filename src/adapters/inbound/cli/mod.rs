pub mod dto;
pub mod report;

pub use dto::*;
pub use report::{OutputFormat, Renderer};
