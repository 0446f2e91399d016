//! Public entry point: one [`CodeIndex`] per project.
//!
//! Every operation picks the adapter registered for the file (or tries each
//! adapter for name searches), holds the project's read scope while trees are
//! inspected, and logs its elapsed time.

use std::path::Path;

use crate::analysis::confidence;
use crate::analysis::languages::{self, AdapterHandle};
use crate::analysis::{
    timed, DefinitionLocation, Element, ExtractionOptions, GroupedReferencesResult, HoverInfo,
    Project, ReferenceQuery, ReferenceTarget, SymbolInfo, SymbolKind,
};
use crate::config::Config;
use crate::error::{Error, Result};

/// Where a position-based request points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Byte offset into the file.
    Offset(usize),
    /// 1-based line and column.
    LineColumn { line: usize, column: usize },
}

/// Code intelligence over one project root.
pub struct CodeIndex {
    project: Project,
}

impl CodeIndex {
    /// Open a project, discovering `crosslens.yaml` at the root.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self {
            project: Project::open(root)?,
        })
    }

    pub fn with_config<P: AsRef<Path>>(root: P, config: Config) -> Result<Self> {
        Ok(Self {
            project: Project::with_config(root, config)?,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Extraction options from the project configuration.
    pub fn default_extraction(&self) -> ExtractionOptions {
        ExtractionOptions::from_config(&self.project.config().extraction)
    }

    /// Declarations of a file, flat or as a tree.
    pub fn symbols<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ExtractionOptions,
        hierarchical: bool,
    ) -> Result<Vec<SymbolInfo>> {
        let path = path.as_ref();
        timed("symbols", || {
            let _scope = self.project.read_scope();
            let handle = languages::adapter_for_path(path)?;
            let file = self.project.parse_file(path)?;
            let symbols = if hierarchical {
                handle.extractor.extract_hierarchical(&file, options)
            } else {
                handle.extractor.extract_flat(&file, options)
            };
            symbols.map_err(|e| Error::from_adapter(handle.id, e))
        })
    }

    /// Byte offset for a position in `path`.
    pub fn offset_of<P: AsRef<Path>>(&self, path: P, position: Position) -> Result<usize> {
        let path = path.as_ref();
        timed("offset_of", || {
            let _scope = self.project.read_scope();
            let file = self.project.parse_file(path)?;
            match position {
                Position::Offset(offset) => {
                    file.check_offset(offset)?;
                    Ok(offset)
                }
                Position::LineColumn { line, column } => {
                    file.offset_of(line, column)
                        .ok_or_else(|| Error::PositionOutOfBounds {
                            path: file.path.clone(),
                            offset: file.unchecked_offset_of(line, column),
                            length: file.len(),
                        })
                }
            }
        })
    }

    /// Declarations the reference at `offset` resolves to.
    pub fn definition_at<P: AsRef<Path>>(
        &self,
        path: P,
        offset: usize,
    ) -> Result<Vec<DefinitionLocation>> {
        let path = path.as_ref();
        timed("definition_at", || {
            let _scope = self.project.read_scope();
            let handle = languages::adapter_for_path(path)?;
            let file = self.project.parse_file(path)?;
            handle
                .definitions
                .find_definition_by_position(&self.project, &file, offset)
                .map_err(|e| Error::from_adapter(handle.id, e))
        })
    }

    /// Ranked candidates for `name` across every language in the project.
    ///
    /// An adapter that fails is logged and left out; the others still answer.
    pub fn definitions_by_name(&self, name: &str) -> Result<Vec<DefinitionLocation>> {
        timed("definitions_by_name", || {
            let _scope = self.project.read_scope();
            let mut found = Vec::new();
            for handle in languages::all_adapters() {
                let handle = match handle {
                    Ok(handle) => handle,
                    Err(e) => {
                        tracing::warn!(error = %e, "adapter unavailable");
                        continue;
                    }
                };
                match handle
                    .definitions
                    .find_definition_by_name(&self.project, name)
                {
                    Ok(candidates) => found.extend(candidates),
                    Err(e) => {
                        tracing::warn!(adapter = handle.id, error = %e, "definition search failed")
                    }
                }
            }
            Ok(confidence::rank(
                found,
                self.project.config().definitions.max_candidates,
            ))
        })
    }

    /// Element a reference query is about, with the adapter that resolved it.
    fn target(&self, target: &ReferenceTarget) -> Result<Option<(AdapterHandle, Element)>> {
        match target {
            ReferenceTarget::Position { path, .. } => {
                let handle = languages::adapter_for_path(path)?;
                let element = handle
                    .references
                    .find_target_element(&self.project, target)
                    .map_err(|e| Error::from_adapter(handle.id, e))?;
                Ok(element.map(|element| (handle, element)))
            }
            ReferenceTarget::Name(name) => {
                for handle in languages::all_adapters().into_iter().flatten() {
                    match handle.references.find_target_element(&self.project, target) {
                        Ok(Some(element)) => return Ok(Some((handle, element))),
                        Ok(None) => {}
                        Err(e) => tracing::warn!(
                            adapter = handle.id,
                            name = %name,
                            error = %e,
                            "target lookup failed"
                        ),
                    }
                }
                Ok(None)
            }
        }
    }

    /// Usages of the query's target, grouped by usage type with insights.
    ///
    /// An unresolvable target yields an empty result whose only insight is
    /// "Symbol not found".
    pub fn references(&self, query: &ReferenceQuery) -> Result<GroupedReferencesResult> {
        timed("references", || {
            let _scope = self.project.read_scope();
            let query = query
                .clone()
                .with_defaults(&self.project.config().references);
            let Some((handle, element)) = self.target(&query.target)? else {
                tracing::debug!(target = ?query.target, "reference target not found");
                return Ok(GroupedReferencesResult::not_found());
            };
            let refs = handle
                .references
                .find_references(&self.project, &element, &query)
                .map_err(|e| Error::from_adapter(handle.id, e))?;
            Ok(handle.references.create_grouped_result(refs, &element))
        })
    }

    /// Hover record for whatever is at `offset`.
    pub fn hover_at<P: AsRef<Path>>(&self, path: P, offset: usize) -> Result<Option<HoverInfo>> {
        let path = path.as_ref();
        timed("hover_at", || {
            let _scope = self.project.read_scope();
            let handle = languages::adapter_for_path(path)?;
            let file = self.project.parse_file(path)?;
            handle
                .hover
                .hover_info_at_position(&self.project, &file, offset)
                .map_err(|e| Error::from_adapter(handle.id, e))
        })
    }

    /// Hover record for an element found earlier.
    pub fn hover(&self, element: &Element) -> Result<Option<HoverInfo>> {
        timed("hover", || {
            let _scope = self.project.read_scope();
            let handle = languages::adapter_for_path(&element.file.path)?;
            handle
                .hover
                .hover_info(&self.project, element)
                .map_err(|e| Error::from_adapter(handle.id, e))
        })
    }

    /// Resolve a reference target to its element without searching usages.
    pub fn element(&self, target: &ReferenceTarget) -> Result<Option<Element>> {
        let _scope = self.project.read_scope();
        Ok(self.target(target)?.map(|(_, element)| element))
    }

    pub fn languages(&self) -> Vec<&'static str> {
        languages::list_supported_languages()
    }

    /// Kinds the adapters for `languages` produce; empty means all.
    pub fn supported_kinds(&self, languages: &[&str]) -> Vec<SymbolKind> {
        languages::supported_symbol_kinds(languages)
    }

    /// Drop adapter instances and cached parses.
    pub fn clear_cache(&self) {
        languages::clear_cache();
        self.project.reload();
    }
}
