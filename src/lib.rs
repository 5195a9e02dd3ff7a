pub mod app;
pub mod args;
pub mod config;
pub mod error;
pub mod launcher;
pub mod log;
pub mod target;
