//! Capability plumbing shared by the adapters.
//!
//! An adapter implements [`Backend`]: parsing, outlining, a scope resolver
//! and hover builders. The four capability traits follow from that through
//! the blanket implementations below, each building a request-scoped
//! workspace and handing it to the generic drivers.

use std::sync::Arc;

use super::definitions;
use super::extraction::{self, ExtractionOptions};
use super::model::{DefinitionLocation, HoverInfo, ReferenceInfo, SymbolInfo, SymbolKind};
use super::outline::Element;
use super::project::Project;
use super::references::{self, ReferenceQuery, ReferenceTarget};
use super::source::SourceFile;
use super::traits::{
    DefinitionFinder, HoverProvider, LanguageAdapter, ReferenceFinder, Resolver, SymbolExtractor,
};
use super::workspace::Workspace;

pub trait Backend: LanguageAdapter + Sized + 'static {
    type Resolver<'w>: Resolver
    where
        Self: 'w;

    /// Resolver over a request's workspace.
    fn resolver<'w>(&'w self, ws: &'w Workspace) -> Self::Resolver<'w>;

    /// Symbol kinds the adapter can produce.
    fn symbol_kinds(&self) -> &'static [SymbolKind];

    /// Hover record for a resolved element.
    fn hover(
        &self,
        project: &Project,
        resolver: &Self::Resolver<'_>,
        element: &Element,
    ) -> anyhow::Result<Option<HoverInfo>>;
}

impl<T: Backend> SymbolExtractor for T {
    fn extract_flat(
        &self,
        file: &Arc<SourceFile>,
        options: &ExtractionOptions,
    ) -> anyhow::Result<Vec<SymbolInfo>> {
        let outline = self.outline(file)?;
        Ok(extraction::flat(&outline, options))
    }

    fn extract_hierarchical(
        &self,
        file: &Arc<SourceFile>,
        options: &ExtractionOptions,
    ) -> anyhow::Result<Vec<SymbolInfo>> {
        let outline = self.outline(file)?;
        Ok(extraction::hierarchical(&outline, options))
    }

    fn supported_kinds(&self) -> &'static [SymbolKind] {
        self.symbol_kinds()
    }
}

impl<T: Backend> DefinitionFinder for T {
    fn find_definition_by_position(
        &self,
        project: &Project,
        file: &Arc<SourceFile>,
        offset: usize,
    ) -> anyhow::Result<Vec<DefinitionLocation>> {
        file.check_offset(offset)?;
        let ws = Workspace::build(project, self, Some(file));
        let resolver = self.resolver(&ws);
        definitions::by_position(project, &resolver, file, offset)
    }

    fn find_definition_by_name(
        &self,
        project: &Project,
        name: &str,
    ) -> anyhow::Result<Vec<DefinitionLocation>> {
        let ws = Workspace::build(project, self, None);
        let resolver = self.resolver(&ws);
        Ok(definitions::by_name(project, &resolver, name))
    }
}

impl<T: Backend> ReferenceFinder for T {
    fn find_target_element(
        &self,
        project: &Project,
        target: &ReferenceTarget,
    ) -> anyhow::Result<Option<Element>> {
        match target {
            ReferenceTarget::Position { path, offset } => {
                let file = project.parse_file(path)?;
                file.check_offset(*offset)?;
                let ws = Workspace::build(project, self, Some(&file));
                let resolver = self.resolver(&ws);
                Ok(references::target_at(&resolver, &file, *offset))
            }
            ReferenceTarget::Name(name) => {
                let ws = Workspace::build(project, self, None);
                Ok(references::target_by_name(project, &ws, name))
            }
        }
    }

    fn find_references(
        &self,
        project: &Project,
        element: &Element,
        query: &ReferenceQuery,
    ) -> anyhow::Result<Vec<ReferenceInfo>> {
        let ws = Workspace::build(project, self, Some(&element.file));
        let resolver = self.resolver(&ws);
        Ok(references::collect(project, &resolver, element, query))
    }
}

impl<T: Backend> HoverProvider for T {
    fn hover_info(&self, project: &Project, element: &Element) -> anyhow::Result<Option<HoverInfo>> {
        let ws = Workspace::build(project, self, Some(&element.file));
        let resolver = self.resolver(&ws);
        self.hover(project, &resolver, element)
    }

    fn hover_info_at_position(
        &self,
        project: &Project,
        file: &Arc<SourceFile>,
        offset: usize,
    ) -> anyhow::Result<Option<HoverInfo>> {
        file.check_offset(offset)?;
        let ws = Workspace::build(project, self, Some(file));
        let resolver = self.resolver(&ws);
        match references::target_at(&resolver, file, offset) {
            Some(element) => self.hover(project, &resolver, &element),
            None => Ok(None),
        }
    }
}
