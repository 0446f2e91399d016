//! Language-agnostic code intelligence over tree-sitter.
//!
//! Each language family is served by one adapter that parses files and
//! records their declarations in an [`Outline`]. Everything else is shared:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────────────┐
//! │ Project     │────▶│ Adapter      │────▶│ Outline (per file)  │
//! │ (files,     │     │ (jvm, python,│     │ declarations,       │
//! │  parse      │     │  web)        │     │ parents, docs       │
//! │  cache)     │     └──────────────┘     └─────────────────────┘
//! └─────────────┘                                    │
//!                                                    ▼
//!                     ┌──────────────┐     ┌─────────────────────┐
//!                     │ Drivers      │◀────│ Workspace           │
//!                     │ (definitions,│     │ (per request, with  │
//!                     │  references, │     │  a scope Resolver)  │
//!                     │  hover)      │     └─────────────────────┘
//!                     └──────────────┘
//! ```
//!
//! # Adding a Language
//!
//! 1. Create a module in `src/analysis/languages/`
//! 2. Implement [`LanguageAdapter`] (parsing and outlining) and [`Backend`]
//!    (a [`Resolver`] plus hover records)
//! 3. Register the adapter's aliases and extensions in `languages/mod.rs`
//!
//! The four capability traits follow from `Backend` automatically.

mod backend;
pub mod confidence;
mod definitions;
pub mod extraction;
pub mod hover;
mod insights;
pub mod languages;
pub mod model;
pub mod navigation;
pub mod outline;
pub mod project;
pub mod references;
mod scan;
pub mod source;
pub mod timing;
pub mod traits;
pub mod workspace;

pub use backend::Backend;
pub use extraction::ExtractionOptions;
pub use hover::ControlFlowInfo;
pub use languages::{
    adapter_for_path, clear_cache, language_for_path, list_supported_languages, resolve,
    supported_symbol_kinds, AdapterHandle, JvmAdapter, PythonAdapter, WebAdapter,
};
pub use model::{
    DefinitionLocation, Decorator, DocFormat, Documentation, GroupedReferencesResult, HoverInfo,
    Location, ReferenceInfo, ReferenceSummary, SymbolInfo, SymbolKind, UsageType, Visibility,
};
pub use outline::{Decl, Element, Outline};
pub use project::Project;
pub use references::{ReferenceQuery, ReferenceTarget};
pub use source::SourceFile;
pub use timing::timed;
pub use traits::{
    DefinitionFinder, HoverProvider, LanguageAdapter, ReferenceFinder, Resolver, SymbolExtractor,
};
pub use workspace::{DeclRef, Workspace};
