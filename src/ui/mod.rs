pub mod components;
pub mod layout;
pub mod line_input;
pub mod projection;
pub mod render;
pub mod theme;
