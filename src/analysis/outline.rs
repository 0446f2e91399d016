//! Per-file declaration outlines.
//!
//! An adapter walks a parsed file once and records every declaration in
//! document order, each pointing at its enclosing declaration. Symbol trees,
//! definition candidates and hover records are all views over an outline.

use std::fmt;
use std::sync::Arc;

use tree_sitter::Node;

use super::model::{Location, SymbolInfo, SymbolKind};
use super::source::SourceFile;

/// One declaration recorded by an adapter.
#[derive(Debug, Clone)]
pub struct Decl {
    /// Canonical symbol record; `children` is always empty here.
    pub symbol: SymbolInfo,
    /// Index of the enclosing declaration in the same outline.
    pub parent: Option<usize>,
    /// Tree-sitter kind of the declaration node.
    pub node_kind: &'static str,
    /// Byte range of the declared name.
    pub name_start: usize,
    pub name_end: usize,
    /// Declared supertypes (simple names, generics stripped).
    pub super_types: Vec<String>,
    /// Declared type of a value, or return type of a callable.
    pub type_name: Option<String>,
    /// Number of declared parameters for callables.
    pub param_count: Option<usize>,
    /// Raw documentation block.
    pub doc: Option<String>,
    /// Payload of an explicit deprecation marker, if it carried one.
    pub deprecation: Option<String>,
}

impl Decl {
    pub fn new(
        file: &SourceFile,
        node: Node,
        name_node: Node,
        name: impl Into<String>,
        kind: SymbolKind,
    ) -> Self {
        Self {
            symbol: SymbolInfo::new(name, kind, file.location_of(node)),
            parent: None,
            node_kind: node.kind(),
            name_start: name_node.start_byte(),
            name_end: name_node.end_byte(),
            super_types: Vec::new(),
            type_name: None,
            param_count: None,
            doc: None,
            deprecation: None,
        }
    }

    /// Synthetic declaration anchored on an existing node.
    pub fn synthetic(file: &SourceFile, anchor: Node, name: impl Into<String>, kind: SymbolKind) -> Self {
        let mut decl = Decl::new(file, anchor, anchor, name, kind);
        decl.symbol.is_synthetic = true;
        decl
    }

    pub fn name(&self) -> &str {
        &self.symbol.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind
    }

    pub fn start(&self) -> usize {
        self.symbol.location.start_offset
    }

    pub fn end(&self) -> usize {
        self.symbol.location.end_offset
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start() <= offset && offset < self.end()
    }

    pub fn name_contains(&self, offset: usize) -> bool {
        self.name_start <= offset && offset <= self.name_end
    }

    /// Static members, including Python `@staticmethod`/`@classmethod`.
    pub fn is_static(&self) -> bool {
        ["static", "staticmethod", "classmethod"]
            .iter()
            .any(|m| self.symbol.has_modifier(m))
    }
}

/// All declarations of one file.
#[derive(Debug, Clone)]
pub struct Outline {
    pub file: Arc<SourceFile>,
    /// Package or module the file belongs to.
    pub package: Option<String>,
    pub decls: Vec<Decl>,
}

impl Outline {
    pub fn new(file: Arc<SourceFile>, package: Option<String>) -> Self {
        Self {
            file,
            package,
            decls: Vec::new(),
        }
    }

    /// Append a declaration and return its index.
    pub fn push(&mut self, mut decl: Decl, parent: Option<usize>) -> usize {
        decl.parent = parent;
        self.decls.push(decl);
        self.decls.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Decl> {
        self.decls.get(index)
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.decls
            .iter()
            .enumerate()
            .filter(|(_, d)| d.parent.is_none())
            .map(|(i, _)| i)
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.decls
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Enclosing declarations of `index`, innermost first.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.decls.get(index).and_then(|d| d.parent), move |i| {
            self.decls.get(*i).and_then(|d| d.parent)
        })
    }

    /// Nearest enclosing type declaration.
    pub fn enclosing_type(&self, index: usize) -> Option<usize> {
        self.ancestors(index)
            .find(|i| self.decls[*i].kind().is_type())
    }

    /// Name of the declaring type or function, if any.
    pub fn container_name(&self, index: usize) -> Option<&str> {
        self.decls
            .get(index)
            .and_then(|d| d.parent)
            .map(|p| self.decls[p].name())
    }

    /// Innermost declaration whose range contains `offset`.
    pub fn innermost_at(&self, offset: usize) -> Option<usize> {
        self.decls
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.symbol.is_synthetic && d.contains(offset))
            .min_by_key(|(_, d)| d.end() - d.start())
            .map(|(i, _)| i)
    }

    /// Innermost enclosing declaration matching `pred`, starting at `offset`.
    pub fn enclosing_at<P>(&self, offset: usize, pred: P) -> Option<usize>
    where
        P: Fn(&Decl) -> bool,
    {
        let start = self.innermost_at(offset)?;
        std::iter::once(start)
            .chain(self.ancestors(start))
            .find(|i| pred(&self.decls[*i]))
    }

    /// Declaration whose name token sits at `offset`.
    pub fn declared_name_at(&self, offset: usize) -> Option<usize> {
        self.decls
            .iter()
            .position(|d| !d.symbol.is_synthetic && d.name_contains(offset))
    }

    /// Declaration named `name` occupying exactly `start..end`.
    pub fn find(&self, start: usize, end: usize, name: &str) -> Option<usize> {
        self.decls
            .iter()
            .position(|d| d.start() == start && d.end() == end && d.name() == name)
    }

    /// Build the hierarchical symbol tree.
    pub fn to_tree(&self) -> Vec<SymbolInfo> {
        self.roots().map(|i| self.subtree(i)).collect()
    }

    fn subtree(&self, index: usize) -> SymbolInfo {
        let mut symbol = self.decls[index].symbol.clone();
        symbol.children = self.children(index).map(|c| self.subtree(c)).collect();
        symbol
    }

    /// Handle for a declaration.
    pub fn element(&self, index: usize) -> Element {
        let decl = &self.decls[index];
        Element {
            file: Arc::clone(&self.file),
            start: decl.start(),
            end: decl.end(),
            name_start: decl.name_start,
            name_end: decl.name_end,
            node_kind: decl.node_kind,
            name: decl.name().to_string(),
            kind: decl.kind(),
            container: self.container_name(index).map(str::to_string),
            is_local: false,
            is_parameter: false,
            is_deprecated: decl.symbol.is_deprecated,
        }
    }
}

/// A resolved declaration site: a declaration from an outline, or a local
/// variable or parameter found by scope resolution.
#[derive(Clone)]
pub struct Element {
    pub file: Arc<SourceFile>,
    pub start: usize,
    pub end: usize,
    pub name_start: usize,
    pub name_end: usize,
    pub node_kind: &'static str,
    pub name: String,
    pub kind: SymbolKind,
    /// Declaring type, or owning function for locals.
    pub container: Option<String>,
    /// Local variable or parameter, invisible outside its function.
    pub is_local: bool,
    pub is_parameter: bool,
    pub is_deprecated: bool,
}

impl Element {
    /// Local variable or parameter declared by `node`.
    pub fn local(
        file: &Arc<SourceFile>,
        node: Node,
        name_node: Node,
        owner: Option<String>,
        is_parameter: bool,
    ) -> Self {
        Self {
            file: Arc::clone(file),
            start: node.start_byte(),
            end: node.end_byte(),
            name_start: name_node.start_byte(),
            name_end: name_node.end_byte(),
            node_kind: node.kind(),
            name: file.node_text(name_node).to_string(),
            kind: SymbolKind::Variable,
            container: owner,
            is_local: true,
            is_parameter,
            is_deprecated: false,
        }
    }

    /// Re-find the declaration node in the file's tree.
    pub fn node(&self) -> Option<Node<'_>> {
        self.file.find_node(self.start, self.end, self.node_kind)
    }

    pub fn location(&self) -> Location {
        self.file.location(self.start, self.end)
    }

    /// Returns `true` if both handles denote the same declaration.
    pub fn same_as(&self, other: &Element) -> bool {
        self.file.path == other.file.path
            && self.start == other.start
            && self.end == other.end
            && self.name == other.name
    }

    /// Returns `true` if `offset` falls on the declared name.
    pub fn name_contains(&self, offset: usize) -> bool {
        self.name_start <= offset && offset <= self.name_end
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("file", &self.file.display_path)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("range", &(self.start..self.end))
            .field("container", &self.container)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn java_outline(source: &str) -> Outline {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        let file = Arc::new(SourceFile::new(
            tree,
            source.as_bytes().to_vec(),
            Path::new("A.java"),
            "Java",
        ));

        let mut outline = Outline::new(Arc::clone(&file), None);
        let root = file.tree.root_node();
        let class = root.named_child(0).unwrap();
        let class_name = class.child_by_field_name("name").unwrap();
        let decl = Decl::new(&file, class, class_name, "A", SymbolKind::Class);
        let class_idx = outline.push(decl, None);

        let body = class.child_by_field_name("body").unwrap();
        let method = body.named_child(0).unwrap();
        let method_name = method.child_by_field_name("name").unwrap();
        let decl = Decl::new(&file, method, method_name, "run", SymbolKind::Method);
        outline.push(decl, Some(class_idx));
        outline
    }

    #[test]
    fn test_tree_nests_children() {
        let outline = java_outline("class A { void run() { int x = 1; } }");
        let tree = outline.to_tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].name, "run");
    }

    #[test]
    fn test_innermost_and_declared_name() {
        let source = "class A { void run() { int x = 1; } }";
        let outline = java_outline(source);
        let inside_body = source.find("int").unwrap();
        assert_eq!(outline.innermost_at(inside_body), Some(1));
        assert_eq!(outline.enclosing_type(1), Some(0));
        assert_eq!(outline.container_name(1), Some("A"));

        let on_name = source.find("run").unwrap();
        assert_eq!(outline.declared_name_at(on_name), Some(1));
        assert_eq!(outline.declared_name_at(inside_body), None);
    }

    #[test]
    fn test_element_identity() {
        let outline = java_outline("class A { void run() {} }");
        let a = outline.element(1);
        let b = outline.element(1);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&outline.element(0)));
        assert_eq!(a.container.as_deref(), Some("A"));
        assert_eq!(a.node().unwrap().kind(), "method_declaration");
    }
}
