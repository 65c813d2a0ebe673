//! Solex solc adapter: drives a `solc` binary through standard JSON.
//!
//! The compiler itself is an external capability; this crate only shapes
//! the standard-JSON conversation and maps diagnostics onto the verifier's
//! error taxonomy. No filesystem writes, no network — one subprocess per
//! compile call.

pub mod solc;
pub mod standard_json;

pub use solc::SolcCompiler;
