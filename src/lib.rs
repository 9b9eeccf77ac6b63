// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # mapcheck
//!
//! Static analysis and automated fixes for AutoMapper configurations in C#.
//!
//! ## Core Concept
//!
//! A mapping registration (`CreateMap<Source, Destination>()` plus its
//! configuration chain) is checked against the member structure of both
//! types. Findings carry stable ids (`AM001`..`AM050`) and the data needed
//! to synthesize a code fix for them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mapcheck::{AnalyzerConfig, Compilation, Engine};
//!
//! let compilation = Compilation::load(&["src/Mapping".into()])?;
//! let engine = Engine::new(AnalyzerConfig::discover(".".as_ref())?);
//! let analysis = engine.analyze(&compilation)?;
//! for finding in &analysis.findings {
//!     println!("{}", finding);
//! }
//!
//! // apply every high and medium confidence fix
//! let (fixed, result) = mapcheck::fix::fix_all(&engine, &compilation, &Default::default())?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                                                             │
//! │  C# SOURCES                                                 │
//! │       │                                                     │
//! │       ├──► parse_csharp ──► ParsedFile (types, chains)      │
//! │       │                                                     │
//! │       └──► SymbolTable ──► TypeDescriptor / TypeModel       │
//! │                                                             │
//! │  REGISTRATIONS                                              │
//! │       │                                                     │
//! │       ├──► MappingRegistry (read-only snapshot)             │
//! │       │                                                     │
//! │       └──► Engine + rules ──► Finding                       │
//! │                                                             │
//! │  FINDINGS                                                   │
//! │       │                                                     │
//! │       └──► synthesize_fixes ──► CodeAction ──► Compilation  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// Host layer: syntax and symbols
pub mod ast;
pub mod parse;
pub mod symbols;

// Semantic model
pub mod model;
pub mod registration;

// Analysis
pub mod compilation;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod rules;

// Fixes and output
pub mod fix;
pub mod report;

// Re-exports
pub use compilation::{collect_sources, Compilation, Document};
pub use config::{AnalyzerConfig, PerformanceConfig, RuleSetting};
pub use diagnostic::{Category, Finding, RuleInfo, Severity, ALL_RULES};
pub use error::{Error, Result};
pub use fix::{
    apply_action, fix_all, synthesize_fixes, CodeAction, FixApplicationResult, FixConfidence,
    FixContext, FixOperation, FixOptions, TextEdit,
};
pub use parse::{parse_csharp, to_sexp};
pub use registration::{MappingRegistration, MappingRegistry};
pub use report::{CheckReport, FixReport};
pub use rules::{Analysis, CancellationToken, Engine, PerformanceMode, Rule, RuleContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
