// Application layer - stores, resolution, aggregation, and session state
pub mod auth;
pub mod config_store;
pub mod date_range;
pub mod engine;
pub mod resolver;
pub mod row_store;
pub mod session;
pub mod view;
