//! Definition search shared by every adapter.

use std::sync::Arc;

use super::confidence::{
    self, accessibility_warning, disambiguation_hint, Candidate, HintContext, NameQuery,
};
use super::model::{DefinitionLocation, Visibility};
use super::outline::Element;
use super::project::Project;
use super::source::SourceFile;
use super::traits::Resolver;
use super::workspace::{DeclRef, Workspace};

/// Resolve the reference at `offset`, falling back to the nearest enclosing
/// declaration with lower confidence.
pub fn by_position(
    project: &Project,
    resolver: &dyn Resolver,
    file: &Arc<SourceFile>,
    offset: usize,
) -> anyhow::Result<Vec<DefinitionLocation>> {
    file.check_offset(offset)?;
    let ws = resolver.workspace();
    let outline_idx = ws.outline_index(&file.path);
    let on_declared_name = outline_idx
        .and_then(|o| ws.outline(o).declared_name_at(offset))
        .is_some();

    if !on_declared_name {
        if let Some(node) = file.node_at_offset(offset) {
            if let Some(element) = resolver.resolve(file, node) {
                tracing::debug!(target = ?element, "resolved reference");
                return Ok(vec![from_element(
                    project,
                    resolver,
                    &element,
                    confidence::RESOLVED,
                )]);
            }
        }
    }

    let nearest = outline_idx.and_then(|o| {
        ws.outline(o)
            .innermost_at(offset)
            .map(|index| DeclRef { outline: o, index })
    });
    Ok(nearest
        .map(|r| vec![from_decl(project, resolver, r, confidence::NEAREST_DECLARATION)])
        .unwrap_or_default())
}

/// Project-wide search for `name` (`Name` or `Qualifier.member`).
pub fn by_name(
    project: &Project,
    resolver: &dyn Resolver,
    name: &str,
) -> Vec<DefinitionLocation> {
    let Some(query) = NameQuery::parse(name) else {
        return Vec::new();
    };
    let ws = resolver.workspace();

    let mut found = Vec::new();
    for r in ws.all_decls() {
        let decl = ws.decl(r);
        if decl.kind() == super::model::SymbolKind::Import {
            continue;
        }
        let outline = ws.outline(r.outline);
        let container = qualifier_of(ws, r);
        let candidate = Candidate {
            name: decl.name(),
            kind: decl.kind(),
            container: container.as_deref(),
            is_library: project.is_library_path(&outline.file.display_path),
        };
        if let Some(score) = confidence::score(&candidate, &query) {
            found.push(from_decl(project, resolver, r, score));
        }
    }

    tracing::debug!(query = name, candidates = found.len(), "definition search");
    confidence::rank(found, project.config().definitions.max_candidates)
}

/// Name a qualified query must match: the declaring type, or for top-level
/// declarations the last segment of the file's package or module.
pub(super) fn qualifier_of(ws: &Workspace, r: DeclRef) -> Option<String> {
    if let Some(ty) = ws.enclosing_type(r) {
        return Some(ws.decl(ty).name().to_string());
    }
    if ws.decl(r).parent.is_some() {
        return ws.parent(r).map(|p| ws.decl(p).name().to_string());
    }
    ws.outline(r.outline)
        .package
        .as_deref()
        .and_then(|p| p.rsplit(|c| c == '.' || c == '/').next())
        .map(str::to_string)
}

fn module_of(ws: &Workspace, outline: usize) -> String {
    let outline = ws.outline(outline);
    outline
        .package
        .clone()
        .unwrap_or_else(|| outline.file.display_path.clone())
}

/// Build a candidate from an outline declaration.
pub fn from_decl(
    project: &Project,
    resolver: &dyn Resolver,
    r: DeclRef,
    confidence: f64,
) -> DefinitionLocation {
    let ws = resolver.workspace();
    let decl = ws.decl(r);
    let outline = ws.outline(r.outline);
    let module = module_of(ws, r.outline);
    let declaring_type = ws
        .parent(r)
        .filter(|p| ws.decl(*p).kind().is_type())
        .map(|p| ws.decl(p).name().to_string());
    let owner_function = ws
        .parent(r)
        .filter(|p| ws.decl(*p).kind().is_callable())
        .map(|p| ws.decl(p).name().to_string());

    let ctx = HintContext {
        declaring_type: declaring_type.as_deref(),
        owner_function: owner_function.as_deref(),
        module: Some(module.as_str()),
        is_static: decl.is_static(),
        is_local: false,
        is_parameter: false,
    };

    DefinitionLocation {
        name: decl.name().to_string(),
        qualified_name: decl.symbol.qualified_name.clone(),
        kind: decl.kind(),
        file_path: outline.file.display_path.clone(),
        location: decl.symbol.location,
        visibility: decl.symbol.visibility,
        confidence,
        disambiguation_hint: disambiguation_hint(decl.kind(), &ctx),
        is_test_code: is_test_site(project, resolver, r.outline, decl.start()),
        is_library_code: project.is_library_path(&outline.file.display_path),
        accessibility_warning: accessibility_warning(decl.symbol.visibility, &ctx),
    }
}

/// Build a candidate from a resolved element (declaration or local).
pub fn from_element(
    project: &Project,
    resolver: &dyn Resolver,
    element: &Element,
    confidence: f64,
) -> DefinitionLocation {
    let ws = resolver.workspace();
    if let Some(r) = ws.ref_for(element) {
        return from_decl(project, resolver, r, confidence);
    }

    let ctx = HintContext {
        declaring_type: None,
        owner_function: element.container.as_deref(),
        module: None,
        is_static: false,
        is_local: element.is_local,
        is_parameter: element.is_parameter,
    };
    let is_test_code = project.is_test_path(&element.file.display_path)
        || ws
            .outline_index(&element.file.path)
            .map(|o| is_test_site(project, resolver, o, element.start))
            .unwrap_or(false);

    DefinitionLocation {
        name: element.name.clone(),
        qualified_name: None,
        kind: element.kind,
        file_path: element.file.display_path.clone(),
        location: element.location(),
        visibility: if element.is_local {
            Visibility::Unknown
        } else {
            Visibility::Public
        },
        confidence,
        disambiguation_hint: disambiguation_hint(element.kind, &ctx),
        is_test_code,
        is_library_code: project.is_library_path(&element.file.display_path),
        accessibility_warning: None,
    }
}

/// Test code: a test path, or inside a declaration named like a test.
pub fn is_test_site(project: &Project, resolver: &dyn Resolver, outline: usize, offset: usize) -> bool {
    let ws = resolver.workspace();
    let outline = ws.outline(outline);
    if project.is_test_path(&outline.file.display_path) {
        return true;
    }
    let Some(start) = outline.innermost_at(offset) else {
        return false;
    };
    std::iter::once(start)
        .chain(outline.ancestors(start))
        .any(|i| resolver.is_test_decl(&outline.decls[i]))
}
