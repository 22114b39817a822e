pub mod app;
pub mod config;
pub mod engine;
pub mod event;
pub mod generator;
pub mod logging;
pub mod remote;
pub mod session;
pub mod store;
pub mod ui;
