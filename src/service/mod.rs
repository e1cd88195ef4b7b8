//! Collaborators of the local runtime: its CLI for service lifecycle and its
//! HTTP API for catalog, cache and model management.

pub mod client;
pub mod launcher;

pub use client::{ByteStream, ServiceClient};
pub use launcher::{parse_status_endpoint, ServiceLauncher};
