//! Top-level facade crate for the tdarr exporter.
//!
//! Re-exports the core types and the exporter library so users can depend on a single crate.

pub mod core {
    pub use tdarr_core::*;
}

pub mod exporter {
    pub use tdarr_exporter::*;
}
