pub mod api;
pub mod app;
pub mod config;
pub mod host;
pub mod strings;
pub mod task;
pub mod ui_queue;
