//! Solex verify: the exercise verification pipeline.
//!
//! Takes one exercise's source fragments through
//! merge → compile → deploy → validate → report, against the capability
//! seams defined in `solex-core`. The shared assertion library is compiled
//! and deployed once per process; every verification links against that
//! one instance.
//!
//! # Example
//!
//! ```ignore
//! use solex_core::{SourceBundle, VerifierConfig};
//! use solex_verify::Verifier;
//!
//! let verifier = Verifier::new(compiler, backend, VerifierConfig::from_env());
//! let bundle = SourceBundle::from_blocks([
//!     ("solution", "contract Coin { uint public supply = 1000; }"),
//!     ("validation", "contract TestCoin { function testSupply() public { ... } }"),
//! ]);
//! let report = verifier.verify(bundle).await;
//! assert!(report.grading.is_some());
//! ```

pub mod bootstrap;
pub mod merge;
pub mod pipeline;
pub mod report;

pub use bootstrap::{AssertionLibrary, LibraryBootstrap, ASSERT_SOURCE};
pub use pipeline::{PipelineOutcome, StageFailure, Verifier};
