pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod middleware;
pub mod models;
pub mod services;
