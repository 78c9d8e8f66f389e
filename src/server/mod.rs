pub mod admin_routes;
pub mod auth;
pub mod config;
mod http_layers;
pub mod listing_routes;
pub mod server;
pub mod state;
pub mod submission_routes;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::{make_app, run_server};
