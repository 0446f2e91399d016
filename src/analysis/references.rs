//! Reference search shared by every adapter.
//!
//! The pipeline is: resolve the target, scan files for identifiers carrying
//! the target's name, keep those that resolve back to the target, classify
//! each survivor, then add overriding declarations for methods.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::confidence::{self, Candidate, NameQuery};
use super::definitions::{is_test_site, qualifier_of};
use super::model::{ReferenceInfo, SymbolKind, UsageType};
use super::outline::Element;
use super::project::Project;
use super::source::SourceFile;
use super::traits::Resolver;
use super::workspace::{DeclRef, Workspace};
use crate::config::ReferencesConfig;

/// What a reference search is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceTarget {
    /// The symbol at a byte offset in a file.
    Position { path: PathBuf, offset: usize },
    /// A project-wide name (`Name` or `Qualifier.member`).
    Name(String),
}

/// One reference search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceQuery {
    pub target: ReferenceTarget,
    pub include_declaration: bool,
    /// Truncate the result list to this many references.
    pub max_results: Option<usize>,
}

impl ReferenceQuery {
    pub fn at_position(path: impl Into<PathBuf>, offset: usize) -> Self {
        Self {
            target: ReferenceTarget::Position {
                path: path.into(),
                offset,
            },
            include_declaration: false,
            max_results: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            target: ReferenceTarget::Name(name.into()),
            include_declaration: false,
            max_results: None,
        }
    }

    /// Apply configured defaults where the request left them unset.
    pub fn with_defaults(mut self, config: &ReferencesConfig) -> Self {
        self.include_declaration |= config.include_declaration;
        if self.max_results.is_none() {
            self.max_results = config.max_results;
        }
        self
    }

    pub fn include_declaration(mut self, include: bool) -> Self {
        self.include_declaration = include;
        self
    }

    pub fn max_results(mut self, max: Option<usize>) -> Self {
        self.max_results = max;
        self
    }
}

/// Target under the cursor: the declaration whose name is at `offset`, or
/// whatever the identifier there resolves to.
pub fn target_at(resolver: &dyn Resolver, file: &Arc<SourceFile>, offset: usize) -> Option<Element> {
    let ws = resolver.workspace();
    if let Some(o) = ws.outline_index(&file.path) {
        if let Some(index) = ws.outline(o).declared_name_at(offset) {
            return Some(ws.outline(o).element(index));
        }
    }
    let node = file.node_at_offset(offset)?;
    resolver.resolve(file, node)
}

/// Best declaration for a name: exact member name (and qualifier, when
/// given), types before members, project before library code.
///
/// A qualifier names the declaring type or, for top-level declarations, the
/// last segment of the file's package or module.
pub fn target_by_name(project: &Project, ws: &Workspace, name: &str) -> Option<Element> {
    let query = NameQuery::parse(name)?;
    let mut best: Option<(f64, DeclRef)> = None;

    for r in ws.all_decls() {
        let decl = ws.decl(r);
        if decl.name() != query.member || decl.kind() == SymbolKind::Import {
            continue;
        }
        let container = qualifier_of(ws, r);
        if let Some(qualifier) = &query.qualifier {
            if container.as_deref() != Some(qualifier.as_str()) {
                continue;
            }
        }
        let candidate = Candidate {
            name: decl.name(),
            kind: decl.kind(),
            container: container.as_deref(),
            is_library: project.is_library_path(&ws.outline(r.outline).file.display_path),
        };
        let score = confidence::score(&candidate, &query).unwrap_or(0.0);
        if best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, r));
        }
    }

    best.map(|(_, r)| ws.element(r))
}

/// Enumerate, filter and classify usages of `target`.
pub fn collect(
    project: &Project,
    resolver: &dyn Resolver,
    target: &Element,
    query: &ReferenceQuery,
) -> Vec<ReferenceInfo> {
    let ws = resolver.workspace();
    let limit = query.max_results.unwrap_or(usize::MAX);
    let target_ref = ws.ref_for(target);

    let search_name = match (target.kind, &target.container) {
        (SymbolKind::Constructor, Some(class)) => class.clone(),
        _ => target.name.clone(),
    };

    let mut refs = Vec::new();
    if query.include_declaration {
        if let Some(o) = ws.outline_index(&target.file.path) {
            refs.push(site(
                project,
                resolver,
                o,
                target.name_start,
                target.name_end,
                UsageType::Declaration,
                None,
            ));
        }
    }

    'files: for (o, outline) in ws.outlines().iter().enumerate() {
        if target.is_local && outline.file.path != target.file.path {
            continue;
        }
        if !outline.file.source_str().contains(search_name.as_str()) {
            continue;
        }
        for node in resolver.usage_nodes(&outline.file, &search_name) {
            if refs.len() >= limit {
                break 'files;
            }
            if outline.file.path == target.file.path && node.start_byte() == target.name_start {
                continue;
            }
            let is_declaration = ws
                .outline(o)
                .decls
                .iter()
                .any(|d| !d.symbol.is_synthetic && d.name_start == node.start_byte());
            if is_declaration {
                continue;
            }
            let Some(resolved) = resolver.resolve(&outline.file, node) else {
                continue;
            };
            if !refers_to(&resolved, target) {
                continue;
            }

            let usage = if overrides_at(ws, target_ref, o, node.start_byte()) {
                UsageType::MethodOverride
            } else {
                resolver.classify(&outline.file, node, target)
            };
            let context = resolver.data_flow_context(&outline.file, node);
            refs.push(site(
                project,
                resolver,
                o,
                node.start_byte(),
                node.end_byte(),
                usage,
                context,
            ));
        }
    }

    if let Some(r) = target_ref {
        for (o, index) in overriding_decls(ws, r) {
            if refs.len() >= limit {
                break;
            }
            let decl = &ws.outline(o).decls[index];
            refs.push(site(
                project,
                resolver,
                o,
                decl.name_start,
                decl.name_end,
                UsageType::MethodOverride,
                None,
            ));
        }
    }

    refs.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.location.start_offset.cmp(&b.location.start_offset))
    });
    refs.dedup_by(|a, b| a.file_path == b.file_path && a.location == b.location);
    refs.truncate(limit);

    tracing::debug!(target = %target.name, references = refs.len(), "reference search");
    refs
}

/// A resolved usage counts for `target` if it is the target itself, or a
/// constructor of the target class.
fn refers_to(resolved: &Element, target: &Element) -> bool {
    if resolved.same_as(target) {
        return true;
    }
    target.kind.is_type()
        && resolved.kind == SymbolKind::Constructor
        && resolved.container.as_deref() == Some(target.name.as_str())
        && resolved.file.path == target.file.path
}

/// True when the usage sits inside a method that overrides the target.
fn overrides_at(ws: &Workspace, target: Option<DeclRef>, outline: usize, offset: usize) -> bool {
    let Some(target) = target else {
        return false;
    };
    let target_decl = ws.decl(target);
    if !matches!(target_decl.kind(), SymbolKind::Method | SymbolKind::Function) {
        return false;
    }
    let Some(target_type) = ws.enclosing_type(target) else {
        return false;
    };
    let Some(method) = ws
        .outline(outline)
        .enclosing_at(offset, |d| d.kind().is_callable())
        .map(|index| DeclRef { outline, index })
    else {
        return false;
    };
    if method == target || ws.decl(method).name() != target_decl.name() {
        return false;
    }
    ws.enclosing_type(method)
        .map(|ty| ws.all_subtypes(target_type).contains(&ty))
        .unwrap_or(false)
}

/// Declarations overriding `target` in transitive subtypes of its type.
pub fn overriding_decls(ws: &Workspace, target: DeclRef) -> Vec<(usize, usize)> {
    let decl = ws.decl(target);
    if !matches!(decl.kind(), SymbolKind::Method | SymbolKind::Function)
        || decl.symbol.has_modifier("private")
        || decl.symbol.has_modifier("static")
    {
        return Vec::new();
    }
    let Some(ty) = ws.enclosing_type(target) else {
        return Vec::new();
    };

    ws.all_subtypes(ty)
        .into_iter()
        .flat_map(|sub| ws.members(sub))
        .filter(|m| {
            let member = ws.decl(*m);
            member.name() == decl.name()
                && member.kind().is_callable()
                && match (member.param_count, decl.param_count) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                }
        })
        .map(|m| (m.outline, m.index))
        .collect()
}

fn site(
    project: &Project,
    resolver: &dyn Resolver,
    outline: usize,
    start: usize,
    end: usize,
    usage_type: UsageType,
    data_flow_context: Option<String>,
) -> ReferenceInfo {
    let ws = resolver.workspace();
    let o = ws.outline(outline);
    let chain: Vec<usize> = o
        .innermost_at(start)
        .map(|i| std::iter::once(i).chain(o.ancestors(i)).collect())
        .unwrap_or_default();

    let containing_method = chain
        .iter()
        .find(|i| o.decls[**i].kind().is_callable())
        .map(|i| o.decls[*i].name().to_string());
    let containing_class = chain
        .iter()
        .find(|i| o.decls[**i].kind().is_type())
        .map(|i| o.decls[*i].name().to_string());
    let is_deprecated_usage = usage_type != UsageType::Declaration
        && chain.iter().any(|i| o.decls[*i].symbol.is_deprecated);

    ReferenceInfo {
        file_path: o.file.display_path.clone(),
        location: o.file.location(start, end),
        usage_type,
        containing_method,
        containing_class,
        data_flow_context,
        is_test_code: is_test_site(project, resolver, outline, start),
        is_deprecated_usage,
        preview: o.file.line_text(start).to_string(),
    }
}

/// Phrase for the syntactic role of a usage, from its parent node kinds.
///
/// Adapters pass the node kinds their grammar uses for each role.
pub fn role_phrase(file: &SourceFile, node: Node, kinds: &RoleKinds) -> Option<String> {
    let mut current = node;
    for ancestor in super::navigation::ancestors(node) {
        let kind = ancestor.kind();
        if kinds.arguments.contains(&kind) {
            return Some("passed as argument".to_string());
        }
        if kinds.returns.contains(&kind) {
            return Some("returned from method".to_string());
        }
        if kinds.conditions.contains(&kind) {
            let is_condition = ancestor
                .child_by_field_name("condition")
                .map(|c| super::navigation::is_within(current, c))
                .unwrap_or(false);
            if is_condition {
                return Some("used in condition".to_string());
            }
        }
        if kinds.loops.contains(&kind) {
            let is_iterable = ["value", "right", "iterable"]
                .iter()
                .filter_map(|f| ancestor.child_by_field_name(f))
                .any(|c| super::navigation::is_within(current, c));
            if is_iterable {
                return Some("iterated over".to_string());
            }
        }
        if kinds.assignments.contains(&kind) {
            let left = ["left", "name", "pattern"]
                .iter()
                .filter_map(|f| ancestor.child_by_field_name(f))
                .next();
            if let Some(left) = left {
                if !super::navigation::is_within(current, left) {
                    return Some(format!("assigned to {}", file.node_text(left).trim()));
                }
            }
        }
        if kinds.statements.contains(&kind) {
            break;
        }
        current = ancestor;
    }
    None
}

/// Grammar node kinds that mark each syntactic role.
#[derive(Debug, Clone, Copy)]
pub struct RoleKinds {
    pub arguments: &'static [&'static str],
    pub returns: &'static [&'static str],
    pub conditions: &'static [&'static str],
    pub loops: &'static [&'static str],
    pub assignments: &'static [&'static str],
    /// Kinds at which the upward search stops.
    pub statements: &'static [&'static str],
}
