//! Top-level facade crate for promerge.
//!
//! Re-exports the merge engine and the gateway library so users can depend on a single crate.

pub mod core {
    pub use promerge_core::*;
}

pub mod gateway {
    pub use promerge_gateway::*;
}
