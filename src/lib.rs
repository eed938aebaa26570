//! # rcc5-risk
//!
//! Topological weakness analysis for multi-agent cyber-physical systems.
//!
//! An architecture model (agents, ports, functional blocks, channels and
//! data sources) is mapped onto abstract regions standing for the facts,
//! beliefs and assertions held by each component. Every structurally related
//! pair of regions must stand in exactly one RCC5 relation. The crate grounds
//! the RCC5 mereology over a finite domain, splits the region-pair graph into
//! independent sub-structures, enumerates every relation assignment of the
//! cyclic ones against an incremental SAT solver and folds the satisfiable
//! assignments into a weakness catalogue and a risk score.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rcc5_risk::analysis::{Analyzer, Options};
//! use rcc5_risk::model::ArchitectureModel;
//! use rcc5_risk::report::VecSink;
//!
//! let model = ArchitectureModel::from_json(include_str!("model.json"))?;
//! let analyzer = Analyzer::new(Options::default());
//! let mut sink = VecSink::default();
//! let report = analyzer.run(&model, &mut sink)?;
//!
//! println!("risk score: {}", report.summary.risk_score);
//! for row in report.risk_table() {
//!     println!("{} / {}: {}", row.agent, row.component, row.weakness);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Architecture model consumed from the model parser
pub mod model;

/// Regions, region kinds and region pairs
pub mod region;

/// Region model builder: components to regions, pairs and constraints
pub mod builder;

/// The five RCC5 relations and their composition table
pub mod rcc5;

/// Clause store and Tseitin gate definitions
pub mod cnf;

/// Ground topology and RCC5 axioms over a finite domain
pub mod topology;

/// SAT solver backends
pub mod engine;

/// Axiomatized solver session with scoped scenario checks
pub mod session;

/// Dependency graph decomposition into independent sub-structures
pub mod decompose;

/// Scenario space and enumeration
pub mod enumerate;

/// Risk aggregation and weakness catalogue
pub mod risk;

/// Scenario logs, risk tables and dependency graph rendering
pub mod report;

/// End-to-end analysis pipeline
pub mod analysis;

/// Error types
pub mod error {
    //! Error types for rcc5-risk

    use thiserror::Error;

    /// Errors that can occur during an analysis run
    #[derive(Error, Debug)]
    pub enum AnalysisError {
        /// Two components share the same identifier
        #[error("duplicate component id: {0}")]
        DuplicateComponent(String),

        /// A flow or owner reference names a component that does not exist
        #[error("unknown component `{id}` referenced by {context}")]
        UnknownComponent {
            /// The missing identifier
            id: String,
            /// Where the reference was found
            context: String,
        },

        /// A component is owned by something that is not an agent
        #[error("component `{component}` is owned by `{owner}`, which is not an agent")]
        OwnerNotAgent {
            /// The owned component
            component: String,
            /// The offending owner
            owner: String,
        },

        /// A flow connects two component kinds that cannot exchange information
        #[error("unsupported flow `{source_id}` ({source_kind}) -> `{target}` ({target_kind})")]
        UnsupportedFlow {
            /// Flow source
            source_id: String,
            /// Kind of the flow source
            source_kind: String,
            /// Flow target
            target: String,
            /// Kind of the flow target
            target_kind: String,
        },

        /// A flow equates an output region with an input region of another kind
        #[error("flow `{source_id}` -> `{target}` equates a {source_region} region with a {target_region} region")]
        RegionKindMismatch {
            /// Flow source
            source_id: String,
            /// Flow target
            target: String,
            /// Kind of the source output region
            source_region: String,
            /// Kind of the target input region
            target_region: String,
        },

        /// Axiomatization was requested over an empty set of regions
        #[error("cannot axiomatize an empty region set")]
        EmptyDomain,

        /// A region name appears twice in a domain
        #[error("region {0} appears multiple times in the domain")]
        DuplicateRegion(String),

        /// The ground theory needs more SAT variables than a literal can address
        #[error("a domain of {0} constants needs more SAT variables than fit in a literal")]
        DomainTooLarge(usize),

        /// A literal or constraint names a region outside the domain
        #[error("region {0} is not in the domain")]
        UnknownRegion(String),

        /// A resume point does not name an existing scenario
        #[error("invalid resume point: {0}")]
        InvalidResume(String),

        /// Reading or writing an artifact failed
        #[error("i/o error: {0}")]
        Io(#[from] std::io::Error),

        /// (De)serializing a model or record failed
        #[error("serialization error: {0}")]
        Serialization(#[from] serde_json::Error),
    }

    /// Result type for rcc5-risk operations
    pub type Result<T> = std::result::Result<T, AnalysisError>;
}

// Re-export commonly used types
pub use error::{AnalysisError, Result};
pub use rcc5::Rcc5;
