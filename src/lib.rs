//! es-glance - A lightweight, AI-first explorer for Elasticsearch-compatible stores.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod llm;
pub mod logging;
pub mod results;
pub mod schema;
pub mod search;
pub mod session;
