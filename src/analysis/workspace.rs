//! Per-request declaration index over a project's files.
//!
//! A workspace is built on demand for one language family, answers type and
//! member lookups for the duration of a request, and is then dropped.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use super::model::SymbolKind;
use super::navigation::simple_type_name;
use super::outline::{Decl, Element, Outline};
use super::project::Project;
use super::source::SourceFile;
use super::traits::LanguageAdapter;

/// Position of a declaration inside a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub outline: usize,
    pub index: usize,
}

/// Outlines of every project file one adapter handles.
pub struct Workspace {
    outlines: Vec<Outline>,
    by_name: HashMap<String, Vec<DeclRef>>,
}

impl Workspace {
    /// Outline every project file of the adapter's languages.
    ///
    /// Files that fail to parse or outline are logged and skipped. `focus`
    /// is always included, even when it lives outside the project root.
    pub fn build(
        project: &Project,
        adapter: &dyn LanguageAdapter,
        focus: Option<&Arc<SourceFile>>,
    ) -> Self {
        let mut outlines = Vec::new();
        let mut seen = HashSet::new();

        if let Some(file) = focus {
            match adapter.outline(file) {
                Ok(outline) => {
                    seen.insert(file.path.clone());
                    outlines.push(outline);
                }
                Err(e) => {
                    tracing::warn!(path = %file.display_path, error = %e, "failed to outline file");
                }
            }
        }

        for path in project.files_with_extensions(adapter.file_extensions()) {
            if seen.contains(&path) {
                continue;
            }
            let file = match project.parse_file(&path) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparsable file");
                    continue;
                }
            };
            match adapter.outline(&file) {
                Ok(outline) => {
                    seen.insert(path);
                    outlines.push(outline);
                }
                Err(e) => {
                    tracing::warn!(path = %file.display_path, error = %e, "failed to outline file");
                }
            }
        }

        tracing::debug!(adapter = adapter.id(), files = outlines.len(), "workspace built");
        Self::from_outlines(outlines)
    }

    pub fn from_outlines(outlines: Vec<Outline>) -> Self {
        let mut by_name: HashMap<String, Vec<DeclRef>> = HashMap::new();
        for (o, outline) in outlines.iter().enumerate() {
            for (index, decl) in outline.decls.iter().enumerate() {
                by_name
                    .entry(decl.name().to_string())
                    .or_default()
                    .push(DeclRef { outline: o, index });
            }
        }
        Self { outlines, by_name }
    }

    pub fn outlines(&self) -> &[Outline] {
        &self.outlines
    }

    pub fn outline(&self, index: usize) -> &Outline {
        &self.outlines[index]
    }

    pub fn outline_index(&self, path: &Path) -> Option<usize> {
        self.outlines.iter().position(|o| o.file.path == path)
    }

    pub fn outline_for(&self, path: &Path) -> Option<&Outline> {
        self.outline_index(path).map(|i| &self.outlines[i])
    }

    pub fn decl(&self, r: DeclRef) -> &Decl {
        &self.outlines[r.outline].decls[r.index]
    }

    pub fn element(&self, r: DeclRef) -> Element {
        self.outlines[r.outline].element(r.index)
    }

    /// Every declaration, in file then document order.
    pub fn all_decls(&self) -> impl Iterator<Item = DeclRef> + '_ {
        self.outlines.iter().enumerate().flat_map(|(o, outline)| {
            (0..outline.decls.len()).map(move |index| DeclRef { outline: o, index })
        })
    }

    /// Declarations named exactly `name`.
    pub fn named(&self, name: &str) -> &[DeclRef] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Type declarations named `name` (qualifiers and generics ignored).
    pub fn types_named(&self, name: &str) -> Vec<DeclRef> {
        let simple = simple_type_name(name);
        self.named(&simple)
            .iter()
            .copied()
            .filter(|r| self.decl(*r).kind().is_type())
            .collect()
    }

    /// Declarations with no enclosing declaration named `name`.
    pub fn top_level_named(&self, name: &str) -> Vec<DeclRef> {
        self.named(name)
            .iter()
            .copied()
            .filter(|r| self.decl(*r).parent.is_none())
            .collect()
    }

    /// Enclosing declaration.
    pub fn parent(&self, r: DeclRef) -> Option<DeclRef> {
        self.decl(r).parent.map(|index| DeclRef {
            outline: r.outline,
            index,
        })
    }

    /// Nearest enclosing type.
    pub fn enclosing_type(&self, r: DeclRef) -> Option<DeclRef> {
        self.outlines[r.outline]
            .enclosing_type(r.index)
            .map(|index| DeclRef {
                outline: r.outline,
                index,
            })
    }

    /// Direct members of a type.
    pub fn members(&self, ty: DeclRef) -> Vec<DeclRef> {
        self.outlines[ty.outline]
            .children(ty.index)
            .map(|index| DeclRef {
                outline: ty.outline,
                index,
            })
            .collect()
    }

    /// Direct supertypes that are declared in the workspace.
    pub fn supertypes(&self, ty: DeclRef) -> Vec<DeclRef> {
        self.decl(ty)
            .super_types
            .iter()
            .flat_map(|name| self.types_named(name))
            .filter(|r| *r != ty)
            .collect()
    }

    /// The type followed by all its transitive supertypes, nearest first.
    pub fn type_hierarchy(&self, ty: DeclRef) -> Vec<DeclRef> {
        let mut order = vec![ty];
        let mut seen: HashSet<DeclRef> = HashSet::from([ty]);
        let mut i = 0;
        while i < order.len() {
            for parent in self.supertypes(order[i]) {
                if seen.insert(parent) {
                    order.push(parent);
                }
            }
            i += 1;
        }
        order
    }

    /// Types that declare `ty` as a direct supertype.
    pub fn subtypes(&self, ty: DeclRef) -> Vec<DeclRef> {
        let name = self.decl(ty).name().to_string();
        self.all_decls()
            .filter(|r| {
                let decl = self.decl(*r);
                decl.kind().is_type() && *r != ty && decl.super_types.iter().any(|s| *s == name)
            })
            .collect()
    }

    /// Transitive subtypes, breadth first.
    pub fn all_subtypes(&self, ty: DeclRef) -> Vec<DeclRef> {
        let mut order = Vec::new();
        let mut seen: HashSet<DeclRef> = HashSet::from([ty]);
        let mut queue = vec![ty];
        while let Some(current) = queue.pop() {
            for sub in self.subtypes(current) {
                if seen.insert(sub) {
                    order.push(sub);
                    queue.insert(0, sub);
                }
            }
        }
        order
    }

    /// Members named `name` of `ty` or its supertypes, nearest type first.
    pub fn find_members(&self, ty: DeclRef, name: &str) -> Vec<DeclRef> {
        self.type_hierarchy(ty)
            .into_iter()
            .flat_map(|t| self.members(t))
            .filter(|m| self.decl(*m).name() == name)
            .collect()
    }

    /// First member named `name` accepted by `pred`, searching supertypes.
    pub fn find_member<P>(&self, ty: DeclRef, name: &str, pred: P) -> Option<DeclRef>
    where
        P: Fn(&Decl) -> bool,
    {
        self.find_members(ty, name)
            .into_iter()
            .find(|m| pred(self.decl(*m)))
    }

    /// Callable member of `ty` (or its supertypes), preferring one taking
    /// `arity` parameters.
    pub fn find_callable(&self, ty: DeclRef, name: &str, arity: Option<usize>) -> Option<DeclRef> {
        let members: Vec<DeclRef> = self
            .find_members(ty, name)
            .into_iter()
            .filter(|m| self.decl(*m).kind().is_callable())
            .collect();
        arity
            .and_then(|n| {
                members
                    .iter()
                    .find(|m| self.decl(**m).param_count == Some(n))
                    .copied()
            })
            .or_else(|| members.first().copied())
    }

    pub fn find_value(&self, ty: DeclRef, name: &str) -> Option<DeclRef> {
        self.find_member(ty, name, |d| d.kind().is_value())
    }

    /// Constructor of `ty` for a creation with `arity` arguments.
    pub fn constructor_of(&self, ty: DeclRef, arity: usize) -> Option<DeclRef> {
        let ctors: Vec<DeclRef> = self
            .members(ty)
            .into_iter()
            .filter(|m| self.decl(*m).kind() == SymbolKind::Constructor)
            .collect();
        ctors
            .iter()
            .find(|c| self.decl(**c).param_count == Some(arity))
            .or_else(|| ctors.first())
            .copied()
    }

    /// The only declaration named `name` accepted by `pred`; when several
    /// qualify, the only one taking `arity` parameters.
    pub fn unique<P>(&self, name: &str, arity: Option<usize>, pred: P) -> Option<DeclRef>
    where
        P: Fn(&Decl) -> bool,
    {
        let candidates: Vec<DeclRef> = self
            .named(name)
            .iter()
            .copied()
            .filter(|r| pred(self.decl(*r)))
            .collect();
        if candidates.len() == 1 {
            return candidates.first().copied();
        }
        let by_arity: Vec<DeclRef> = candidates
            .into_iter()
            .filter(|r| arity.is_some() && self.decl(*r).param_count == arity)
            .collect();
        (by_arity.len() == 1).then(|| by_arity[0])
    }

    /// Locate the declaration behind an element.
    pub fn ref_for(&self, element: &Element) -> Option<DeclRef> {
        let outline = self.outline_index(&element.file.path)?;
        let index = self.outlines[outline].find(element.start, element.end, &element.name)?;
        Some(DeclRef { outline, index })
    }

    /// Type declaration enclosing `offset` in the file at `path`.
    pub fn type_at(&self, path: &Path, offset: usize) -> Option<DeclRef> {
        let outline = self.outline_index(path)?;
        let index = self.outlines[outline].enclosing_at(offset, |d| d.kind().is_type())?;
        Some(DeclRef { outline, index })
    }

    /// Types enclosing `offset` in the file at `path`, innermost first.
    pub fn enclosing_types(&self, path: &Path, offset: usize) -> Vec<DeclRef> {
        let Some(o) = self.outline_index(path) else {
            return Vec::new();
        };
        let outline = &self.outlines[o];
        let Some(start) = outline.innermost_at(offset) else {
            return Vec::new();
        };
        std::iter::once(start)
            .chain(outline.ancestors(start))
            .filter(|i| outline.decls[*i].kind().is_type())
            .map(|index| DeclRef { outline: o, index })
            .collect()
    }

    /// Innermost declaration enclosing `offset` in the file at `path`.
    pub fn decl_at(&self, path: &Path, offset: usize) -> Option<DeclRef> {
        let outline = self.outline_index(path)?;
        let index = self.outlines[outline].innermost_at(offset)?;
        Some(DeclRef { outline, index })
    }

    /// Names of every workspace type that (transitively) extends `ty`.
    pub fn subtype_names(&self, ty: DeclRef) -> Vec<String> {
        self.all_subtypes(ty)
            .into_iter()
            .map(|r| self.decl(r).name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::SymbolKind;
    use std::path::Path;

    fn outline_of(source: &str) -> Outline {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        let file = Arc::new(SourceFile::new(
            tree,
            source.as_bytes().to_vec(),
            Path::new("Shapes.java"),
            "JAVA",
        ));
        let mut outline = Outline::new(Arc::clone(&file), None);
        let root = file.tree.root_node();
        let mut cursor = root.walk();
        for class in root.named_children(&mut cursor) {
            let name_node = class.child_by_field_name("name").unwrap();
            let name = file.node_text(name_node).to_string();
            let mut decl = Decl::new(&file, class, name_node, name, SymbolKind::Class);
            if let Some(sup) = class.child_by_field_name("superclass") {
                let text = file.node_text(sup).trim_start_matches("extends").trim();
                decl.super_types.push(text.to_string());
            }
            let class_idx = outline.push(decl, None);

            let body = class.child_by_field_name("body").unwrap();
            let mut body_cursor = body.walk();
            for method in body.named_children(&mut body_cursor) {
                let name_node = method.child_by_field_name("name").unwrap();
                let name = file.node_text(name_node).to_string();
                let decl = Decl::new(&file, method, name_node, name, SymbolKind::Method);
                outline.push(decl, Some(class_idx));
            }
        }
        outline
    }

    fn workspace() -> Workspace {
        Workspace::from_outlines(vec![outline_of(
            "class Shape { void draw() {} }\n\
             class Circle extends Shape { void draw() {} }\n\
             class Ring extends Circle { void fill() {} }\n",
        )])
    }

    #[test]
    fn test_hierarchy_walks() {
        let ws = workspace();
        let shape = ws.types_named("Shape")[0];
        let ring = ws.types_named("Ring")[0];

        assert_eq!(ws.type_hierarchy(ring).len(), 3);
        assert_eq!(ws.subtype_names(shape), vec!["Circle", "Ring"]);
    }

    #[test]
    fn test_find_member_searches_supertypes() {
        let ws = workspace();
        let ring = ws.types_named("Ring")[0];
        let draw = ws.find_member(ring, "draw", |_| true).unwrap();
        assert_eq!(ws.decl(ws.enclosing_type(draw).unwrap()).name(), "Circle");
        assert!(ws.find_member(ring, "erase", |_| true).is_none());
    }

    #[test]
    fn test_ref_for_element_round_trips() {
        let ws = workspace();
        let circle = ws.types_named("Circle")[0];
        let element = ws.element(circle);
        assert_eq!(ws.ref_for(&element), Some(circle));
    }
}
