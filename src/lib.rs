// Library entry point for thoughts-journal
// Exposes modules for testing

pub mod api;
pub mod blob;
pub mod config;
pub mod metrics;
pub mod models;
pub mod store;
pub mod web;
