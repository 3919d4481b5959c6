//! HTTP surface for the catalog synchronizer: server, routing and
//! request/response mapping.

pub mod app;
pub mod config;
pub mod scheduler;
pub mod telemetry;
