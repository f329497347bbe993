//! Connection management for es-glance.
//!
//! Holds the active search-store target and tracks reconnects.

pub mod registry;

pub use registry::{ActiveConnection, Connection, ConnectionRegistry};
