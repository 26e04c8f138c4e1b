//! # Tracelink-RS: Issue-to-Commit Link Recovery Engine
//!
//! A Rust implementation of a traceability-link recovery pipeline for
//! projects where most true issue/commit links are never recorded. The
//! library combines several independent weak-evidence heuristics into
//! per-(issue, commit) feature vectors and applies a positive-unlabeled
//! (PU) learning correction to the keyword-derived labels:
//!
//! - **Candidate Generation**: symmetric time windows over every issue/commit
//!   date-field combination bound the quadratic pair universe
//! - **Heuristic Filters**: keyword linking, narrow time confirmation,
//!   shared-file coverage, word-to-file association, phantom expansion and
//!   loner reduction
//! - **Similarity Engine**: TF-IDF vector space over issue and commit text
//!   with cosine scoring
//! - **PU Classification**: the Elkan–Noto bias correction recovers likely
//!   true links among pairs that were never keyword-confirmed
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        CLI Layer                           │
//! ├────────────────────────────────────────────────────────────┤
//! │  Core Engine   │  Filters     │  Learning   │  I/O         │
//! │                │              │             │              │
//! │ • Candidates   │ • Keyword    │ • SGD       │ • Git        │
//! │ • Featureset   │ • Time       │ • GridCV    │ • Diff       │
//! │ • Pipeline     │ • SharedFile │ • PU        │ • Sources    │
//! │ • Config       │ • WordAssoc  │ • Blinding  │              │
//! │                │ • Phantom    │             │              │
//! │                │ • Loner      │             │              │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tracelink_rs::core::config::TracelinkConfig;
//! use tracelink_rs::core::pipeline::{LinkInputs, LinkPipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TracelinkConfig::default();
//!     config.validate()?;
//!
//!     let pipeline = LinkPipeline::new(config)?;
//!     let outcome = pipeline.run(LinkInputs::default())?;
//!
//!     println!("linked issues: {}", outcome.links.issue_count());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Core pipeline modules
pub mod core {
    //! Core pipeline algorithms and data structures.

    pub mod candidates;
    pub mod config;
    pub mod errors;
    pub mod featureset;
    pub mod linkmap;
    pub mod pipeline;
    pub mod types;
}

// Text normalization and vector space
pub mod text {
    //! Text normalization and the TF-IDF similarity engine.

    pub mod normalize;
    pub mod tfidf;
}

// Weak-evidence heuristic filters
pub mod filters {
    //! Pluggable heuristic filters over the candidate universe.

    pub mod keyword;
    pub mod loner;
    pub mod phantom;
    pub mod shared_files;
    pub mod time;
    pub mod word_assoc;
}

// Classification stages
pub mod learning {
    //! Probabilistic classifiers and the PU correction.

    pub mod blinding;
    pub mod classifier;
    pub mod pu;
    pub mod supervised;
}

// Boundary data sources
pub mod io {
    //! Repository boundaries and unified-diff parsing.

    pub mod diff;
    pub mod sources;
}

// Re-export key types at the crate root
pub use crate::core::config::TracelinkConfig;
pub use crate::core::errors::{Result, TracelinkError};
pub use crate::core::linkmap::IssueLinkMap;
pub use crate::core::pipeline::{LinkOutcome, LinkPipeline};
pub use crate::core::types::{Commit, CommitHash, Issue, IssueId};

/// Library version from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
