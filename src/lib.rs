//! Local library catalog application
//!
//! Wires the catalog module into the kernel's module registry and the HTTP
//! server, and provides sample data for development.

pub mod bootstrap;
pub mod modules;
pub mod seed;

/// Re-export commonly used types
pub use modules::*;
