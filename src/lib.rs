pub mod api;
pub mod config;
pub mod observability;
pub mod publisher;
pub mod render;
