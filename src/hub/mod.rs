//! Room service entry point
//!
//! Exposes the inbound operations the connection layer calls, each keyed by
//! room id and routed through the registry.

pub mod service;

pub use service::RoomHub;
