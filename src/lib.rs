pub mod config;
pub mod content;
pub mod domain;
pub mod rate_limiter;
pub mod routes;
pub mod startup;
pub mod store_client;
pub mod telemetry;
pub mod webhook_client;
