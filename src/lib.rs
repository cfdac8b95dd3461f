pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod postal_code;
pub mod types;

// Layered boundaries for application ports and infrastructure adapters
pub mod app;
pub mod infra;
