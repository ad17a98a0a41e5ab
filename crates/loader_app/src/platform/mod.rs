mod app;
mod bindings;
mod config;
mod effects;
mod history;
mod logging;
mod session;
mod timers;

pub use app::run_app;
