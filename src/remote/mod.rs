//! Remote play: each telnet connection gets its own session and screen.

pub mod server;
pub mod telnet;

pub use server::{serve, serve_on};
