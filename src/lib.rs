//! crosslens - language-agnostic code intelligence.
//!
//! crosslens answers the questions an editor asks about source code: what is
//! declared in this file, where is this name defined, who uses it, and what
//! is it. One adapter per language family (JVM, Python, web) reads
//! tree-sitter trees and feeds shared drivers, so every language returns the
//! same records.
//!
//! # Architecture
//!
//! - `analysis`: adapters, the per-request workspace and the shared drivers
//! - `index`: [`CodeIndex`], the entry point over one project root
//! - `config`: YAML configuration schema
//! - `error`: the public [`Error`] type
//! - `report`: output formatting (pretty, JSON)
//! - `cli`: the `crosslens` command line
//!
//! # Example
//!
//! ```no_run
//! use crosslens::{CodeIndex, ReferenceQuery};
//!
//! let index = CodeIndex::open(".")?;
//! let refs = index.references(&ReferenceQuery::by_name("UserService.addUser"))?;
//! for insight in &refs.insights {
//!     println!("{}", insight);
//! }
//! # Ok::<(), crosslens::Error>(())
//! ```
//!
//! # Adding a New Language
//!
//! See `src/analysis/languages/` for examples. Implement `LanguageAdapter`
//! and `Backend`, then register the adapter in `languages/mod.rs`.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod report;

pub use analysis::{
    DefinitionLocation, Element, ExtractionOptions, GroupedReferencesResult, HoverInfo, Location,
    ReferenceInfo, ReferenceQuery, ReferenceTarget, SymbolInfo, SymbolKind, UsageType, Visibility,
};
pub use config::Config;
pub use error::{Error, Result};
pub use index::{CodeIndex, Position};
