pub mod scoring;
pub mod transitions;

pub use transitions::{StateKind, validate_transition};
