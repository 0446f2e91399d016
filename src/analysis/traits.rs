//! Core traits for language adapters.
//!
//! An adapter is one language family's implementation of four capabilities:
//! symbol extraction, definition finding, reference finding and hover info.
//! The registry hands each capability out separately, so callers only depend
//! on the trait they use.

use std::path::Path;
use std::sync::Arc;

use tree_sitter::Node;

use super::extraction::ExtractionOptions;
use super::model::{
    DefinitionLocation, GroupedReferencesResult, HoverInfo, ReferenceInfo, SymbolInfo,
    SymbolKind, UsageType,
};
use super::outline::{Decl, Element, Outline};
use super::project::Project;
use super::references::{ReferenceQuery, ReferenceTarget};
use super::source::SourceFile;
use super::workspace::Workspace;

/// Language family adapter.
///
/// # Thread Safety
///
/// Adapters are stateless singletons shared across request threads.
/// tree_sitter::Parser is not Sync, so implementations create parsers as
/// needed.
pub trait LanguageAdapter: Send + Sync {
    /// Returns the adapter identifier (e.g., "jvm", "python").
    fn id(&self) -> &'static str;

    /// Language names shown in help text.
    fn display_names(&self) -> &'static [&'static str];

    /// Language identifiers this adapter claims (case-sensitive).
    fn aliases(&self) -> &'static [&'static str];

    /// Returns file extensions this adapter handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Language identifier for a file extension.
    fn language_for_extension(&self, ext: &str) -> Option<&'static str>;

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Partial parse errors are still returned as a valid tree with ERROR nodes.
    fn parse(&self, path: &Path, source: Vec<u8>) -> anyhow::Result<SourceFile>;

    /// Record every declaration of a parsed file.
    fn outline(&self, file: &Arc<SourceFile>) -> anyhow::Result<Outline>;

    /// Check if this adapter handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}

/// Symbol extraction capability.
pub trait SymbolExtractor: Send + Sync {
    /// All matching declarations in document order.
    fn extract_flat(
        &self,
        file: &Arc<SourceFile>,
        options: &ExtractionOptions,
    ) -> anyhow::Result<Vec<SymbolInfo>>;

    /// Top-level declarations with `children` populated.
    fn extract_hierarchical(
        &self,
        file: &Arc<SourceFile>,
        options: &ExtractionOptions,
    ) -> anyhow::Result<Vec<SymbolInfo>>;

    /// Symbol kinds this adapter can produce.
    fn supported_kinds(&self) -> &'static [SymbolKind];
}

/// Definition finding capability.
pub trait DefinitionFinder: Send + Sync {
    /// Resolve the reference at `offset`.
    fn find_definition_by_position(
        &self,
        project: &Project,
        file: &Arc<SourceFile>,
        offset: usize,
    ) -> anyhow::Result<Vec<DefinitionLocation>>;

    /// Search the project for declarations named `name` (`Name` or `Qualifier.member`).
    fn find_definition_by_name(
        &self,
        project: &Project,
        name: &str,
    ) -> anyhow::Result<Vec<DefinitionLocation>>;
}

/// Reference finding capability.
pub trait ReferenceFinder: Send + Sync {
    /// Resolve the element a reference search is about.
    fn find_target_element(
        &self,
        project: &Project,
        target: &ReferenceTarget,
    ) -> anyhow::Result<Option<Element>>;

    /// Enumerate and classify usages of `element`.
    fn find_references(
        &self,
        project: &Project,
        element: &Element,
        query: &ReferenceQuery,
    ) -> anyhow::Result<Vec<ReferenceInfo>>;

    /// Group references and derive insights.
    fn create_grouped_result(
        &self,
        references: Vec<ReferenceInfo>,
        element: &Element,
    ) -> GroupedReferencesResult {
        super::insights::group_references(references, element)
    }
}

/// Hover info capability.
pub trait HoverProvider: Send + Sync {
    fn hover_info(&self, project: &Project, element: &Element) -> anyhow::Result<Option<HoverInfo>>;

    fn hover_info_at_position(
        &self,
        project: &Project,
        file: &Arc<SourceFile>,
        offset: usize,
    ) -> anyhow::Result<Option<HoverInfo>>;
}

/// Scope resolution and usage classification for one language family.
///
/// Resolvers live for one request and borrow that request's workspace.
pub trait Resolver {
    fn workspace(&self) -> &Workspace;

    /// Declaration referred to by the identifier-like `node`.
    fn resolve(&self, file: &Arc<SourceFile>, node: Node<'_>) -> Option<Element>;

    /// Nodes in `file` that may refer to something named `name`.
    fn usage_nodes<'t>(&self, file: &'t SourceFile, name: &str) -> Vec<Node<'t>>;

    /// Classify a usage node already known to refer to `target`.
    fn classify(&self, file: &SourceFile, node: Node<'_>, target: &Element) -> UsageType;

    /// Short phrase describing the usage's syntactic role.
    fn data_flow_context(&self, file: &SourceFile, node: Node<'_>) -> Option<String>;

    /// Whether a declaration follows the language's test naming convention.
    fn is_test_decl(&self, decl: &Decl) -> bool;
}
