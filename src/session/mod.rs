pub mod clock;
pub mod drill;
pub mod input;
pub mod replay;
pub mod result;
