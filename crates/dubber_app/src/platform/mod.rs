mod app;
mod cli;
mod effects;
mod files;
mod render;
mod settings;

pub use app::run_app;
