//! Runtime side of the dashboard: configuration, the module router, effect
//! execution and preference persistence.
mod app;
pub mod commands;
pub mod config;
mod effects;
mod module;
pub mod persistence;
pub mod router;

pub use app::run_app;
pub use module::console_line;
pub use router::Router;
