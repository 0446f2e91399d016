//! JavaScript and TypeScript adapter (including JSX and TSX).

use std::path::Path;
use std::sync::Arc;

use tree_sitter::{Language, Node, Parser};

use crate::analysis::backend::Backend;
use crate::analysis::hover::{self, BranchKinds};
use crate::analysis::model::{
    Decorator, DocFormat, Documentation, HoverInfo, SymbolKind, UsageType, Visibility,
};
use crate::analysis::navigation::{
    ancestors, child_of_kind, children_of_kind, collapse_whitespace, descendants_of_kind,
    has_token, is_field_of, named_children, preceding_comments, simple_type_name,
};
use crate::analysis::outline::{Decl, Element, Outline};
use crate::analysis::project::Project;
use crate::analysis::references::{role_phrase, RoleKinds};
use crate::analysis::scan::IdentifierScan;
use crate::analysis::source::SourceFile;
use crate::analysis::traits::{LanguageAdapter, Resolver};
use crate::analysis::workspace::{DeclRef, Workspace};

pub(crate) const ALIASES: &[&str] = &["JavaScript", "TypeScript", "JSX", "TSX", "ECMAScript 6"];
pub(crate) const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

const JAVASCRIPT: &str = "JavaScript";
const JSX: &str = "JSX";
const TYPESCRIPT: &str = "TypeScript";
const TSX: &str = "TSX";

const SUPPORTED_KINDS: &[SymbolKind] = &[
    SymbolKind::Class,
    SymbolKind::Interface,
    SymbolKind::Enum,
    SymbolKind::TypeAlias,
    SymbolKind::Namespace,
    SymbolKind::Field,
    SymbolKind::Constant,
    SymbolKind::Variable,
    SymbolKind::Property,
    SymbolKind::EnumMember,
    SymbolKind::Method,
    SymbolKind::Constructor,
    SymbolKind::Function,
    SymbolKind::AsyncFunction,
    SymbolKind::Generator,
    SymbolKind::Component,
    SymbolKind::Hook,
    SymbolKind::Import,
];

const JS_IDENTIFIERS: &str = r#"[
  (identifier)
  (property_identifier)
  (shorthand_property_identifier)
  (shorthand_property_identifier_pattern)
  (private_property_identifier)
] @name"#;

const TS_IDENTIFIERS: &str = r#"[
  (identifier)
  (property_identifier)
  (shorthand_property_identifier)
  (shorthand_property_identifier_pattern)
  (private_property_identifier)
  (type_identifier)
] @name"#;

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "private_property_identifier",
    "type_identifier",
];

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

const FUNCTION_SCOPES: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const JSX_KINDS: &[&str] = &["jsx_element", "jsx_self_closing_element", "jsx_fragment"];

static BRANCHES: BranchKinds = BranchKinds {
    ifs: &["if_statement"],
    loops: &[
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
    ],
    ternaries: &["ternary_expression"],
    binaries: &["binary_expression"],
    conjunctions: &[],
    disjunctions: &[],
};

static ROLES: RoleKinds = RoleKinds {
    arguments: &["arguments"],
    returns: &["return_statement"],
    conditions: &[
        "if_statement",
        "while_statement",
        "do_statement",
        "ternary_expression",
    ],
    loops: &["for_in_statement"],
    assignments: &[
        "assignment_expression",
        "augmented_assignment_expression",
        "variable_declarator",
    ],
    statements: &["expression_statement", "statement_block", "program", "lexical_declaration"],
};

pub struct WebAdapter {
    javascript: Language,
    typescript: Language,
    tsx: Language,
    js_identifiers: IdentifierScan,
    ts_identifiers: IdentifierScan,
    tsx_identifiers: IdentifierScan,
}

impl WebAdapter {
    pub fn new() -> anyhow::Result<Self> {
        let javascript: Language = tree_sitter_javascript::LANGUAGE.into();
        let typescript: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let tsx: Language = tree_sitter_typescript::LANGUAGE_TSX.into();
        Ok(Self {
            js_identifiers: IdentifierScan::new(&javascript, JS_IDENTIFIERS)?,
            ts_identifiers: IdentifierScan::new(&typescript, TS_IDENTIFIERS)?,
            tsx_identifiers: IdentifierScan::new(&tsx, TS_IDENTIFIERS)?,
            javascript,
            typescript,
            tsx,
        })
    }

    fn create_parser(&self, language: &Language) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(parser)
    }

    fn identifiers_for(&self, language: &str) -> &IdentifierScan {
        match language {
            TYPESCRIPT => &self.ts_identifiers,
            TSX => &self.tsx_identifiers,
            _ => &self.js_identifiers,
        }
    }
}

impl LanguageAdapter for WebAdapter {
    fn id(&self) -> &'static str {
        "web"
    }

    fn display_names(&self) -> &'static [&'static str] {
        &["JavaScript", "TypeScript"]
    }

    fn aliases(&self) -> &'static [&'static str] {
        ALIASES
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn language_for_extension(&self, ext: &str) -> Option<&'static str> {
        match ext {
            "js" | "mjs" | "cjs" => Some(JAVASCRIPT),
            "jsx" => Some(JSX),
            "ts" | "mts" | "cts" => Some(TYPESCRIPT),
            "tsx" => Some(TSX),
            _ => None,
        }
    }

    fn parse(&self, path: &Path, source: Vec<u8>) -> anyhow::Result<SourceFile> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = self
            .language_for_extension(ext)
            .ok_or_else(|| anyhow::anyhow!("not a JavaScript or TypeScript file: {}", path.display()))?;
        let grammar = match language {
            TYPESCRIPT => &self.typescript,
            TSX => &self.tsx,
            _ => &self.javascript,
        };
        let mut parser = self.create_parser(grammar)?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse {}", path.display()))?;
        Ok(SourceFile::new(tree, source, path, language))
    }

    fn outline(&self, file: &Arc<SourceFile>) -> anyhow::Result<Outline> {
        let mut builder = Builder {
            file,
            outline: Outline::new(Arc::clone(file), Some(module_path(&file.display_path))),
        };
        builder.statements(file.tree.root_node(), None);
        Ok(builder.outline)
    }
}

/// File path relative to the project root, without its extension.
pub(crate) fn module_path(display_path: &str) -> String {
    match display_path.rsplit_once('.') {
        Some((stem, ext)) if EXTENSIONS.contains(&ext) && !stem.ends_with('/') => stem.to_string(),
        _ => display_path.to_string(),
    }
}

/// Module path an import source names, relative to the importing file.
/// Bare package specifiers give `None`.
fn resolve_source(importer: &str, source: &str) -> Option<String> {
    if !source.starts_with('.') {
        return None;
    }
    let mut parts: Vec<&str> = importer.split('/').collect();
    parts.pop();
    for segment in source.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(segment),
        }
    }
    Some(module_path(&parts.join("/")))
}

fn is_upper_case(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// `useUser`, `useState`: `use` followed by an uppercase letter.
fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

fn string_value(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

/// Type text of a `type_annotation` node, without the colon.
fn annotation_text(file: &SourceFile, annotation: Node) -> String {
    collapse_whitespace(file.node_text(annotation).trim_start_matches(':').trim())
}

/// Class named by a type annotation: `Promise<User>`, `User | null` and
/// `User[]` give `User`.
fn annotation_type(text: &str) -> String {
    let text = text.trim().trim_start_matches(':').trim();
    let text = text
        .split('|')
        .map(str::trim)
        .find(|p| !matches!(*p, "null" | "undefined" | ""))
        .unwrap_or(text);
    for wrapper in ["Promise<", "Array<", "ReadonlyArray<"] {
        if let Some(inner) = text.strip_prefix(wrapper).and_then(|t| t.strip_suffix('>')) {
            return annotation_type(inner);
        }
    }
    simple_type_name(text.trim_end_matches("[]"))
}

fn visibility_of(file: &SourceFile, node: Node, name: &str) -> Visibility {
    if name.starts_with('#') {
        return Visibility::Private;
    }
    if let Some(modifier) = child_of_kind(node, "accessibility_modifier") {
        return match file.node_text(modifier) {
            "private" => Visibility::Private,
            "protected" => Visibility::Protected,
            _ => Visibility::Public,
        };
    }
    if name.starts_with('_') {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

/// Nearest preceding `/** ... */` block.
fn jsdoc<'t>(file: &'t SourceFile, node: Node) -> Option<&'t str> {
    preceding_comments(node, &["comment"])
        .into_iter()
        .rev()
        .map(|c| file.node_text(c))
        .find(|text| text.starts_with("/**"))
}

/// Decorators written on a declaration, including those TypeScript places
/// as preceding siblings of class members.
fn decorator_nodes<'t>(node: Node<'t>, outer: Node<'t>) -> Vec<Node<'t>> {
    let mut before = Vec::new();
    let mut prev = node.prev_named_sibling();
    while let Some(p) = prev.filter(|p| p.kind() == "decorator") {
        before.push(p);
        prev = p.prev_named_sibling();
    }
    before.reverse();
    if outer.id() != node.id() {
        before.extend(children_of_kind(outer, "decorator"));
    }
    before.extend(children_of_kind(node, "decorator"));
    before
}

/// Start of the declaration text after any decorators.
fn header_start(node: Node) -> usize {
    let mut cursor = node.walk();
    let start = node
        .children(&mut cursor)
        .find(|c| !matches!(c.kind(), "decorator" | "comment"))
        .map(|c| c.start_byte())
        .unwrap_or(node.start_byte());
    start
}

/// Count of declared parameters of a function-like node.
fn param_count(func: Node) -> Option<usize> {
    if let Some(params) = func.child_by_field_name("parameters") {
        return Some(
            named_children(params)
                .into_iter()
                .filter(|p| p.kind() != "comment")
                .count(),
        );
    }
    func.child_by_field_name("parameter").map(|_| 1)
}

/// Identifier bound by a parameter node, when it binds a simple name.
fn parameter_name(param: Node) -> Option<Node> {
    match param.kind() {
        "identifier" => Some(param),
        "required_parameter" | "optional_parameter" => param
            .child_by_field_name("pattern")
            .filter(|p| p.kind() == "identifier"),
        "assignment_pattern" => param.child_by_field_name("left").filter(|p| p.kind() == "identifier"),
        "rest_pattern" => child_of_kind(param, "identifier"),
        _ => None,
    }
}

struct Builder<'a> {
    file: &'a SourceFile,
    outline: Outline,
}

/// Where a declaration sits: the statement carrying its docs and export.
#[derive(Clone, Copy)]
struct Site<'t> {
    outer: Node<'t>,
    exported: bool,
    is_default: bool,
}

impl<'t> Site<'t> {
    fn plain(node: Node<'t>) -> Self {
        Self {
            outer: node,
            exported: false,
            is_default: false,
        }
    }
}

impl Builder<'_> {
    fn qualified(&self, parent: Option<usize>, name: &str) -> String {
        match parent {
            Some(p) => {
                let prefix = self.outline.decls[p]
                    .symbol
                    .qualified_name
                    .clone()
                    .unwrap_or_else(|| self.outline.decls[p].name().to_string());
                format!("{}.{}", prefix, name)
            }
            None => name.to_string(),
        }
    }

    /// A declaration with the fields every web declaration shares.
    fn base(
        &self,
        node: Node,
        name_node: Node,
        name: &str,
        kind: SymbolKind,
        site: Site,
        parent: Option<usize>,
    ) -> Decl {
        let mut decl = Decl::new(self.file, node, name_node, name, kind);
        decl.symbol.visibility = visibility_of(self.file, node, name);
        decl.symbol.qualified_name = Some(self.qualified(parent, name));
        if site.exported {
            decl.symbol.modifiers.insert("export".to_string());
        }
        if site.is_default {
            decl.symbol.modifiers.insert("default".to_string());
        }

        if let Some(raw) = jsdoc(self.file, site.outer) {
            let normalized = hover::normalize_doc(raw);
            decl.symbol.documentation =
                Documentation::new(hover::doc_summary(&normalized), DocFormat::Jsdoc);
            if hover::doc_mentions_deprecation(&normalized) {
                decl.symbol.is_deprecated = true;
                decl.deprecation = hover::parse_doc_tags(&normalized)
                    .deprecated
                    .filter(|d| !d.is_empty());
            }
            decl.doc = Some(raw.to_string());
        }

        for decorator in decorator_nodes(node, site.outer) {
            let Some(expr) = decorator.named_child(0) else {
                continue;
            };
            let callee = if expr.kind() == "call_expression" {
                expr.child_by_field_name("function").unwrap_or(expr)
            } else {
                expr
            };
            let name = collapse_whitespace(self.file.node_text(callee));
            if name.rsplit('.').next().map(|n| n.eq_ignore_ascii_case("deprecated")) == Some(true) {
                decl.symbol.is_deprecated = true;
                decl.deprecation = expr
                    .child_by_field_name("arguments")
                    .and_then(|args| child_of_kind(args, "string"))
                    .map(|s| string_value(self.file.node_text(s)));
            }
            decl.symbol.decorators.push(Decorator {
                name,
                builtin: false,
            });
        }
        decl
    }

    /// Declarations directly inside a program or namespace body.
    fn statements(&mut self, container: Node, parent: Option<usize>) {
        for stmt in named_children(container) {
            self.statement(stmt, Site::plain(stmt), parent);
        }
    }

    fn statement<'t>(&mut self, node: Node<'t>, site: Site<'t>, parent: Option<usize>) {
        match node.kind() {
            "import_statement" => self.import(node),
            "export_statement" => {
                if let Some(declaration) = node.child_by_field_name("declaration") {
                    let site = Site {
                        outer: node,
                        exported: true,
                        is_default: has_token(node, "default"),
                    };
                    self.statement(declaration, site, parent);
                }
            }
            "ambient_declaration" => {
                if let Some(inner) = named_children(node).into_iter().next() {
                    self.statement(inner, Site { outer: node, ..site }, parent);
                }
            }
            "expression_statement" => {
                if let Some(module) = child_of_kind(node, "internal_module") {
                    self.namespace(module, site, parent);
                }
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    let name = self.file.node_text(name_node).to_string();
                    self.function(node, node, name_node, &name, site, parent);
                }
            }
            "class_declaration" | "abstract_class_declaration" => self.class(node, site, parent),
            "lexical_declaration" | "variable_declaration" => self.variables(node, site, parent),
            "interface_declaration" => self.interface(node, site, parent),
            "type_alias_declaration" => self.type_alias(node, site, parent),
            "enum_declaration" => self.enumeration(node, site, parent),
            "internal_module" | "module" => self.namespace(node, site, parent),
            _ => {}
        }
    }

    fn push_import(&mut self, node: Node, name_node: Node, source: &str, imported: &str) {
        let name = self.file.node_text(name_node).to_string();
        let mut decl = Decl::new(self.file, node, name_node, name, SymbolKind::Import);
        decl.symbol.visibility = Visibility::Public;
        decl.symbol.qualified_name = Some(format!("{}.{}", source, imported));
        decl.symbol.signature = Some(collapse_whitespace(self.file.node_text(node)));
        self.outline.push(decl, None);
    }

    fn import(&mut self, node: Node) {
        let Some(source) = node
            .child_by_field_name("source")
            .map(|s| string_value(self.file.node_text(s)))
        else {
            return;
        };
        let Some(clause) = child_of_kind(node, "import_clause") else {
            return;
        };
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => self.push_import(node, part, &source, "default"),
                "namespace_import" => {
                    if let Some(id) = child_of_kind(part, "identifier") {
                        self.push_import(node, id, &source, "*");
                    }
                }
                "named_imports" => {
                    for specifier in children_of_kind(part, "import_specifier") {
                        let Some(imported) = specifier.child_by_field_name("name") else {
                            continue;
                        };
                        let local = specifier.child_by_field_name("alias").unwrap_or(imported);
                        let imported = self.file.node_text(imported).to_string();
                        self.push_import(node, local, &source, &imported);
                    }
                }
                _ => {}
            }
        }
    }

    /// Function-like declaration. `node` is the declaration recorded in the
    /// outline, `func` the node carrying parameters and body.
    fn function(
        &mut self,
        node: Node,
        func: Node,
        name_node: Node,
        name: &str,
        site: Site,
        parent: Option<usize>,
    ) -> usize {
        let is_async = has_token(func, "async");
        let is_generator = matches!(
            func.kind(),
            "generator_function_declaration" | "generator_function"
        ) || has_token(func, "*");
        let body = func.child_by_field_name("body");
        let has_jsx = body
            .map(|b| !descendants_of_kind(b, JSX_KINDS).is_empty())
            .unwrap_or(false);

        let kind = if starts_uppercase(name) && has_jsx {
            SymbolKind::Component
        } else if is_hook_name(name) {
            SymbolKind::Hook
        } else if is_async {
            SymbolKind::AsyncFunction
        } else if is_generator {
            SymbolKind::Generator
        } else {
            SymbolKind::Function
        };

        let mut decl = self.base(node, name_node, name, kind, site, parent);
        decl.symbol.is_async = is_async;
        decl.symbol.is_generator = is_generator;
        if is_async {
            decl.symbol.modifiers.insert("async".to_string());
        }
        decl.param_count = param_count(func);
        decl.type_name = func
            .child_by_field_name("return_type")
            .map(|t| annotation_text(self.file, t));

        let end = body.map(|b| b.start_byte()).unwrap_or(func.end_byte());
        let header = if node.id() == func.id() {
            collapse_whitespace(self.file.slice(header_start(func), end))
        } else {
            let keyword = node
                .parent()
                .and_then(|p| p.child(0))
                .map(|k| self.file.node_text(k))
                .unwrap_or("const");
            format!(
                "{} {} = {}",
                keyword,
                name,
                collapse_whitespace(self.file.slice(func.start_byte(), end))
            )
        };
        decl.symbol.signature = Some(header.trim_end_matches(['{', ';']).trim().to_string());
        self.outline.push(decl, parent)
    }

    fn heritage(&self, class: Node) -> Vec<String> {
        let Some(heritage) = child_of_kind(class, "class_heritage") else {
            return Vec::new();
        };
        let mut names = Vec::new();
        for part in named_children(heritage) {
            match part.kind() {
                "extends_clause" | "implements_clause" => names.extend(
                    named_children(part)
                        .into_iter()
                        .filter(|t| t.kind() != "type_arguments")
                        .map(|t| simple_type_name(self.file.node_text(t))),
                ),
                _ => names.push(simple_type_name(self.file.node_text(part))),
            }
        }
        names
    }

    fn class(&mut self, node: Node, site: Site, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mut decl = self.base(node, name_node, &name, SymbolKind::Class, site, parent);
        if node.kind() == "abstract_class_declaration" {
            decl.symbol.modifiers.insert("abstract".to_string());
        }
        decl.super_types = self.heritage(node);
        decl.type_name = decl.symbol.qualified_name.clone();
        let body = node.child_by_field_name("body");
        let end = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
        decl.symbol.signature = Some(collapse_whitespace(self.file.slice(header_start(node), end)));
        let index = self.outline.push(decl, parent);

        let Some(body) = body else {
            return;
        };
        for member in named_children(body) {
            match member.kind() {
                "method_definition" | "abstract_method_signature" => self.method(member, index),
                "field_definition" | "public_field_definition" => self.field(member, index),
                _ => {}
            }
        }
    }

    fn member_modifiers(&self, node: Node, decl: &mut Decl) {
        let modifiers = &mut decl.symbol.modifiers;
        for token in ["static", "async", "abstract", "readonly", "declare", "get", "set"] {
            if has_token(node, token) {
                modifiers.insert(token.to_string());
            }
        }
        if child_of_kind(node, "override_modifier").is_some() {
            modifiers.insert("override".to_string());
        }
        if let Some(access) = child_of_kind(node, "accessibility_modifier") {
            modifiers.insert(self.file.node_text(access).to_string());
        }
    }

    fn method(&mut self, node: Node, class: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let is_accessor = has_token(node, "get") || has_token(node, "set");
        let kind = if name == "constructor" {
            SymbolKind::Constructor
        } else if is_accessor {
            SymbolKind::Property
        } else {
            SymbolKind::Method
        };

        let mut decl = self.base(node, name_node, &name, kind, Site::plain(node), Some(class));
        self.member_modifiers(node, &mut decl);
        if node.kind() == "abstract_method_signature" {
            decl.symbol.modifiers.insert("abstract".to_string());
        }
        decl.symbol.is_async = has_token(node, "async");
        decl.symbol.is_generator = has_token(node, "*");
        decl.param_count = param_count(node);
        decl.type_name = node
            .child_by_field_name("return_type")
            .map(|t| annotation_text(self.file, t));
        let end = node
            .child_by_field_name("body")
            .map(|b| b.start_byte())
            .unwrap_or(node.end_byte());
        let header = collapse_whitespace(self.file.slice(header_start(node), end));
        decl.symbol.signature = Some(header.trim_end_matches(['{', ';']).trim().to_string());
        self.outline.push(decl, Some(class));

        if kind == SymbolKind::Constructor {
            self.parameter_properties(node, class);
        }
    }

    /// `constructor(private readonly repo: Repo)` declares a field.
    fn parameter_properties(&mut self, ctor: Node, class: usize) {
        let Some(params) = ctor.child_by_field_name("parameters") else {
            return;
        };
        for param in named_children(params) {
            let is_property = child_of_kind(param, "accessibility_modifier").is_some()
                || has_token(param, "readonly");
            let Some(name_node) = parameter_name(param).filter(|_| is_property) else {
                continue;
            };
            let name = self.file.node_text(name_node).to_string();
            let mut decl = self.base(
                param,
                name_node,
                &name,
                SymbolKind::Field,
                Site::plain(param),
                Some(class),
            );
            self.member_modifiers(param, &mut decl);
            decl.type_name = param
                .child_by_field_name("type")
                .map(|t| annotation_text(self.file, t));
            decl.symbol.signature = Some(collapse_whitespace(self.file.node_text(param)));
            self.outline.push(decl, Some(class));
        }
    }

    fn field(&mut self, node: Node, class: usize) {
        let Some(name_node) = node
            .child_by_field_name("property")
            .or_else(|| node.child_by_field_name("name"))
        else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();

        if let Some(value) = node
            .child_by_field_name("value")
            .filter(|v| FUNCTION_VALUES.contains(&v.kind()))
        {
            let mut decl = self.base(node, name_node, &name, SymbolKind::Method, Site::plain(node), Some(class));
            self.member_modifiers(node, &mut decl);
            decl.symbol.is_async = has_token(value, "async");
            decl.param_count = param_count(value);
            decl.type_name = value
                .child_by_field_name("return_type")
                .map(|t| annotation_text(self.file, t));
            let end = value
                .child_by_field_name("body")
                .map(|b| b.start_byte())
                .unwrap_or(value.end_byte());
            decl.symbol.signature = Some(collapse_whitespace(self.file.slice(header_start(node), end)));
            self.outline.push(decl, Some(class));
            return;
        }

        let is_static = has_token(node, "static");
        let is_readonly = has_token(node, "readonly");
        let kind = if is_upper_case(&name) && (is_static || is_readonly) {
            SymbolKind::Constant
        } else {
            SymbolKind::Field
        };
        let mut decl = self.base(node, name_node, &name, kind, Site::plain(node), Some(class));
        self.member_modifiers(node, &mut decl);
        decl.type_name = node
            .child_by_field_name("type")
            .map(|t| annotation_text(self.file, t));
        let text = collapse_whitespace(self.file.slice(header_start(node), node.end_byte()));
        decl.symbol.signature = Some(text.trim_end_matches(';').trim().to_string());
        self.outline.push(decl, Some(class));
    }

    fn variables(&mut self, node: Node, site: Site, parent: Option<usize>) {
        let keyword = node
            .child(0)
            .map(|k| self.file.node_text(k).to_string())
            .unwrap_or_else(|| "var".to_string());

        for declarator in children_of_kind(node, "variable_declarator") {
            let Some(name_node) = declarator
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
            else {
                continue;
            };
            let name = self.file.node_text(name_node).to_string();
            let value = declarator.child_by_field_name("value");

            if let Some(func) = value.filter(|v| FUNCTION_VALUES.contains(&v.kind())) {
                let index = self.function(declarator, func, name_node, &name, site, parent);
                self.outline.decls[index].symbol.modifiers.insert(keyword.clone());
                continue;
            }

            let kind = if keyword == "const" && is_upper_case(&name) {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            let mut decl = self.base(declarator, name_node, &name, kind, site, parent);
            decl.symbol.modifiers.insert(keyword.clone());
            decl.type_name = declarator
                .child_by_field_name("type")
                .map(|t| annotation_text(self.file, t))
                .or_else(|| {
                    value
                        .filter(|v| v.kind() == "new_expression")
                        .and_then(|v| v.child_by_field_name("constructor"))
                        .map(|c| self.file.node_text(c).to_string())
                });
            decl.symbol.signature = Some(format!(
                "{} {}",
                keyword,
                collapse_whitespace(self.file.node_text(declarator))
            ));
            self.outline.push(decl, parent);
        }
    }

    fn interface(&mut self, node: Node, site: Site, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mut decl = self.base(node, name_node, &name, SymbolKind::Interface, site, parent);
        decl.super_types = child_of_kind(node, "extends_type_clause")
            .map(|clause| {
                named_children(clause)
                    .into_iter()
                    .map(|t| simple_type_name(self.file.node_text(t)))
                    .collect()
            })
            .unwrap_or_default();
        decl.type_name = decl.symbol.qualified_name.clone();
        let body = node.child_by_field_name("body");
        let end = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
        decl.symbol.signature = Some(collapse_whitespace(self.file.slice(node.start_byte(), end)));
        let index = self.outline.push(decl, parent);

        let Some(body) = body else {
            return;
        };
        for member in named_children(body) {
            let kind = match member.kind() {
                "property_signature" => SymbolKind::Property,
                "method_signature" => SymbolKind::Method,
                _ => continue,
            };
            let Some(name_node) = member.child_by_field_name("name") else {
                continue;
            };
            let name = self.file.node_text(name_node).to_string();
            let mut decl = self.base(member, name_node, &name, kind, Site::plain(member), Some(index));
            if kind == SymbolKind::Method {
                decl.symbol.modifiers.insert("abstract".to_string());
                decl.param_count = param_count(member);
                decl.type_name = member
                    .child_by_field_name("return_type")
                    .map(|t| annotation_text(self.file, t));
            } else {
                decl.type_name = member
                    .child_by_field_name("type")
                    .map(|t| annotation_text(self.file, t));
                if has_token(member, "readonly") {
                    decl.symbol.modifiers.insert("readonly".to_string());
                }
            }
            let text = collapse_whitespace(self.file.node_text(member));
            decl.symbol.signature = Some(text.trim_end_matches([';', ',']).trim().to_string());
            self.outline.push(decl, Some(index));
        }
    }

    fn type_alias(&mut self, node: Node, site: Site, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mut decl = self.base(node, name_node, &name, SymbolKind::TypeAlias, site, parent);
        decl.type_name = node
            .child_by_field_name("value")
            .map(|v| collapse_whitespace(self.file.node_text(v)));
        let text = collapse_whitespace(self.file.node_text(node));
        decl.symbol.signature = Some(text.trim_end_matches(';').trim().to_string());
        self.outline.push(decl, parent);
    }

    fn enumeration(&mut self, node: Node, site: Site, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mut decl = self.base(node, name_node, &name, SymbolKind::Enum, site, parent);
        if has_token(node, "const") {
            decl.symbol.modifiers.insert("const".to_string());
        }
        decl.type_name = decl.symbol.qualified_name.clone();
        let body = node.child_by_field_name("body");
        let end = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
        decl.symbol.signature = Some(collapse_whitespace(self.file.slice(node.start_byte(), end)));
        let index = self.outline.push(decl, parent);

        let Some(body) = body else {
            return;
        };
        for member in named_children(body) {
            let name_node = match member.kind() {
                "property_identifier" => member,
                "enum_assignment" => match member.child_by_field_name("name") {
                    Some(n) => n,
                    None => continue,
                },
                _ => continue,
            };
            let member_name = self.file.node_text(name_node).to_string();
            let mut decl = self.base(
                member,
                name_node,
                &member_name,
                SymbolKind::EnumMember,
                Site::plain(member),
                Some(index),
            );
            decl.type_name = Some(name.clone());
            decl.symbol.signature = Some(collapse_whitespace(self.file.node_text(member)));
            self.outline.push(decl, Some(index));
        }
    }

    fn namespace(&mut self, node: Node, site: Site, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mut decl = self.base(node, name_node, &name, SymbolKind::Namespace, site, parent);
        let body = node.child_by_field_name("body");
        let end = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
        decl.symbol.signature = Some(collapse_whitespace(self.file.slice(node.start_byte(), end)));
        let index = self.outline.push(decl, parent);
        if let Some(body) = body {
            self.statements(body, Some(index));
        }
    }
}

impl Backend for WebAdapter {
    type Resolver<'w> = WebResolver<'w>;

    fn resolver<'w>(&'w self, ws: &'w Workspace) -> WebResolver<'w> {
        WebResolver { adapter: self, ws }
    }

    fn symbol_kinds(&self) -> &'static [SymbolKind] {
        SUPPORTED_KINDS
    }

    fn hover(
        &self,
        project: &Project,
        resolver: &WebResolver<'_>,
        element: &Element,
    ) -> anyhow::Result<Option<HoverInfo>> {
        let ws = resolver.ws;
        let Some(r) = ws.ref_for(element) else {
            return Ok(Some(local_hover(project, resolver, element)));
        };
        let info = match ws.decl(r).kind() {
            SymbolKind::Component | SymbolKind::Property => callable_hover(project, resolver, r),
            SymbolKind::Namespace => type_hover(ws, r),
            kind if kind.is_type() => type_hover(ws, r),
            kind if kind.is_callable() => callable_hover(project, resolver, r),
            kind if kind.is_value() => value_hover(project, resolver, r),
            kind => hover::from_decl(ws, r, kind.as_str()),
        };
        Ok(Some(info))
    }
}

/// Scope resolution over one request's JavaScript and TypeScript workspace.
pub struct WebResolver<'w> {
    adapter: &'w WebAdapter,
    ws: &'w Workspace,
}

impl Resolver for WebResolver<'_> {
    fn workspace(&self) -> &Workspace {
        self.ws
    }

    fn resolve(&self, file: &Arc<SourceFile>, node: Node<'_>) -> Option<Element> {
        resolve(self.ws, file, node)
    }

    fn usage_nodes<'t>(&self, file: &'t SourceFile, name: &str) -> Vec<Node<'t>> {
        self.adapter.identifiers_for(file.language).matching(file, name)
    }

    fn classify(&self, file: &SourceFile, node: Node<'_>, target: &Element) -> UsageType {
        let decl = self.ws.ref_for(target).map(|r| self.ws.decl(r));
        classify(file, node, target, decl)
    }

    fn data_flow_context(&self, file: &SourceFile, node: Node<'_>) -> Option<String> {
        role_phrase(file, node, &ROLES)
    }

    fn is_test_decl(&self, decl: &Decl) -> bool {
        let name = decl.name();
        if decl.kind().is_type() {
            return name.ends_with("Test") || name.ends_with("Spec");
        }
        name.starts_with("test") || matches!(name, "describe" | "it")
    }
}

/// A local binding found by scope search.
struct Local<'t> {
    node: Node<'t>,
    name: Node<'t>,
    is_parameter: bool,
}

/// Identifiers bound by a destructuring pattern.
fn pattern_identifiers(pattern: Node) -> Vec<Node> {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => vec![pattern],
        "object_pattern" | "array_pattern" | "rest_pattern" => named_children(pattern)
            .into_iter()
            .flat_map(pattern_identifiers)
            .collect(),
        "pair_pattern" => pattern
            .child_by_field_name("value")
            .map(pattern_identifiers)
            .unwrap_or_default(),
        "assignment_pattern" | "object_assignment_pattern" => pattern
            .child_by_field_name("left")
            .map(pattern_identifiers)
            .unwrap_or_default(),
        "required_parameter" | "optional_parameter" => pattern
            .child_by_field_name("pattern")
            .map(pattern_identifiers)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn parameter_local<'t>(file: &SourceFile, func: Node<'t>, name: &str) -> Option<Local<'t>> {
    if let Some(param) = func.child_by_field_name("parameter") {
        if file.node_text(param) == name {
            return Some(Local {
                node: param,
                name: param,
                is_parameter: true,
            });
        }
    }
    let params = func.child_by_field_name("parameters")?;
    named_children(params).into_iter().find_map(|param| {
        pattern_identifiers(param)
            .into_iter()
            .find(|id| file.node_text(*id) == name)
            .map(|id| Local {
                node: param,
                name: id,
                is_parameter: true,
            })
    })
}

/// Binding of `name` declared directly in a block.
fn block_local<'t>(file: &SourceFile, block: Node<'t>, name: &str) -> Option<Local<'t>> {
    for stmt in named_children(block) {
        match stmt.kind() {
            "lexical_declaration" | "variable_declaration" => {
                for declarator in children_of_kind(stmt, "variable_declarator") {
                    let Some(target) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    if let Some(id) = pattern_identifiers(target)
                        .into_iter()
                        .find(|id| file.node_text(*id) == name)
                    {
                        let node = if target.kind() == "identifier" {
                            declarator
                        } else {
                            id
                        };
                        return Some(Local {
                            node,
                            name: id,
                            is_parameter: false,
                        });
                    }
                }
            }
            "function_declaration" | "generator_function_declaration" | "class_declaration" => {
                if let Some(id) = stmt
                    .child_by_field_name("name")
                    .filter(|n| file.node_text(*n) == name)
                {
                    return Some(Local {
                        node: stmt,
                        name: id,
                        is_parameter: false,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

fn find_local<'t>(file: &SourceFile, usage: Node<'t>, name: &str) -> Option<Local<'t>> {
    for scope in ancestors(usage) {
        let kind = scope.kind();
        if FUNCTION_SCOPES.contains(&kind) {
            if let Some(local) = parameter_local(file, scope, name) {
                return Some(local);
            }
            continue;
        }
        match kind {
            "statement_block" | "switch_body" => {
                let is_function_body = scope
                    .parent()
                    .map(|p| FUNCTION_SCOPES.contains(&p.kind()) || p.kind() == "class_static_block")
                    .unwrap_or(false);
                let in_function = is_function_body
                    || ancestors(scope).any(|a| FUNCTION_SCOPES.contains(&a.kind()));
                if in_function {
                    if let Some(local) = block_local(file, scope, name) {
                        return Some(local);
                    }
                }
            }
            "for_statement" => {
                if let Some(local) = scope
                    .child_by_field_name("initializer")
                    .and_then(|init| block_local_single(file, init, name))
                {
                    return Some(local);
                }
            }
            "for_in_statement" => {
                if let Some(id) = scope
                    .child_by_field_name("left")
                    .map(pattern_identifiers)
                    .unwrap_or_default()
                    .into_iter()
                    .find(|id| file.node_text(*id) == name)
                {
                    return Some(Local {
                        node: id,
                        name: id,
                        is_parameter: false,
                    });
                }
            }
            "catch_clause" => {
                if let Some(id) = scope
                    .child_by_field_name("parameter")
                    .map(pattern_identifiers)
                    .unwrap_or_default()
                    .into_iter()
                    .find(|id| file.node_text(*id) == name)
                {
                    return Some(Local {
                        node: id,
                        name: id,
                        is_parameter: false,
                    });
                }
            }
            "program" => return None,
            _ => {}
        }
    }
    None
}

/// Binding in a single declaration statement such as a `for` initializer.
fn block_local_single<'t>(file: &SourceFile, declaration: Node<'t>, name: &str) -> Option<Local<'t>> {
    children_of_kind(declaration, "variable_declarator")
        .into_iter()
        .find_map(|declarator| {
            let target = declarator.child_by_field_name("name")?;
            pattern_identifiers(target)
                .into_iter()
                .find(|id| file.node_text(*id) == name)
                .map(|id| Local {
                    node: declarator,
                    name: id,
                    is_parameter: false,
                })
        })
}

fn owner_name(file: &SourceFile, node: Node) -> Option<String> {
    ancestors(node)
        .find(|n| FUNCTION_SCOPES.contains(&n.kind()))
        .and_then(|f| {
            f.child_by_field_name("name").or_else(|| {
                f.parent()
                    .filter(|p| p.kind() == "variable_declarator")
                    .and_then(|p| p.child_by_field_name("name"))
            })
        })
        .map(|n| file.node_text(n).to_string())
}

/// Declared type text of a local binding.
fn local_type_text(file: &SourceFile, node: Node) -> Option<String> {
    node.child_by_field_name("type")
        .map(|t| annotation_text(file, t))
}

/// Top-level declaration named `name` in the module an import of `file`
/// binds to `name`.
fn imported_decl(ws: &Workspace, file: &SourceFile, name: &str) -> Option<DeclRef> {
    let here = ws.outline_for(&file.path)?;
    let import = here
        .decls
        .iter()
        .find(|d| d.kind() == SymbolKind::Import && d.name() == name)?;
    let (source, imported) = import.symbol.qualified_name.as_deref()?.rsplit_once('.')?;
    let module = resolve_source(&file.display_path, source)?;
    let index_module = format!("{}/index", module);
    let target = ws.outlines().iter().position(|o| {
        o.package
            .as_deref()
            .map(|p| p == module || p == index_module)
            .unwrap_or(false)
    })?;
    let outline = ws.outline(target);
    let index = outline.roots().find(|i| {
        let decl = &outline.decls[*i];
        decl.kind() != SymbolKind::Import
            && if imported == "default" {
                decl.symbol.has_modifier("default")
            } else {
                decl.name() == imported
            }
    })?;
    Some(DeclRef {
        outline: target,
        index,
    })
}

/// Top-level declaration visible under `name` from `file`.
fn module_level(ws: &Workspace, file: &SourceFile, name: &str, arity: Option<usize>) -> Option<DeclRef> {
    let here = ws.outline_index(&file.path);
    ws.top_level_named(name)
        .into_iter()
        .find(|r| Some(r.outline) == here && ws.decl(*r).kind() != SymbolKind::Import)
        .or_else(|| imported_decl(ws, file, name))
        .or_else(|| {
            ws.unique(name, arity, |d| {
                d.parent.is_none() && d.kind() != SymbolKind::Import
            })
        })
}

fn find_type(ws: &Workspace, file: &SourceFile, text: &str) -> Option<DeclRef> {
    let name = annotation_type(text);
    let here = ws.outline_index(&file.path);
    let candidates = ws.types_named(&name);
    candidates
        .iter()
        .find(|r| Some(r.outline) == here)
        .copied()
        .or_else(|| imported_decl(ws, file, &name).filter(|r| ws.decl(*r).kind().is_type()))
        .or_else(|| candidates.first().copied())
}

fn type_of_decl(ws: &Workspace, file: &SourceFile, r: DeclRef) -> Option<DeclRef> {
    let decl = ws.decl(r);
    if decl.kind().is_type() {
        return Some(r);
    }
    if decl.kind() == SymbolKind::Constructor {
        return ws.parent(r);
    }
    find_type(ws, file, decl.type_name.as_deref()?)
}

fn local_type(ws: &Workspace, file: &Arc<SourceFile>, local: &Local) -> Option<DeclRef> {
    if let Some(text) = local_type_text(file, local.node) {
        return find_type(ws, file, &text);
    }
    if local.node.kind() == "variable_declarator" {
        return infer_type(ws, file, local.node.child_by_field_name("value")?);
    }
    None
}

fn infer_type(ws: &Workspace, file: &Arc<SourceFile>, expr: Node) -> Option<DeclRef> {
    match expr.kind() {
        "this" => ws.enclosing_types(&file.path, expr.start_byte()).first().copied(),
        "super" => {
            let ty = ws.enclosing_types(&file.path, expr.start_byte()).first().copied()?;
            ws.supertypes(ty).first().copied()
        }
        "identifier" => {
            let name = file.node_text(expr);
            if let Some(local) = find_local(file, expr, name) {
                return local_type(ws, file, &local);
            }
            let r = module_level(ws, file, name, None)?;
            type_of_decl(ws, file, r)
        }
        "new_expression" => {
            let constructor = expr.child_by_field_name("constructor")?;
            find_type(ws, file, file.node_text(constructor))
        }
        "call_expression" => {
            let function = expr.child_by_field_name("function")?;
            let callee = match function.kind() {
                "member_expression" => function.child_by_field_name("property")?,
                _ => function,
            };
            let target = resolve_reference(ws, file, callee)?;
            type_of_decl(ws, file, target)
        }
        "member_expression" => {
            let receiver = infer_type(ws, file, expr.child_by_field_name("object")?)?;
            let name = file.node_text(expr.child_by_field_name("property")?);
            let member = ws.find_member(receiver, name, |d| d.kind() != SymbolKind::Import)?;
            type_of_decl(ws, file, member)
        }
        "parenthesized_expression" | "await_expression" | "as_expression"
        | "non_null_expression" | "satisfies_expression" => {
            infer_type(ws, file, expr.named_child(0)?)
        }
        _ => None,
    }
}

/// Call or `new` expression invoking `node` (directly or as `obj.node`).
fn call_of(node: Node) -> Option<Node> {
    let parent = node.parent()?;
    let callee = if parent.kind() == "member_expression" && is_field_of(node, parent, "property") {
        parent
    } else {
        node
    };
    let call = callee.parent()?;
    match call.kind() {
        "call_expression" if is_field_of(callee, call, "function") => Some(call),
        "new_expression" if is_field_of(callee, call, "constructor") => Some(call),
        _ => None,
    }
}

fn argument_count(call: Node) -> usize {
    call.child_by_field_name("arguments")
        .map(|args| {
            named_children(args)
                .into_iter()
                .filter(|a| a.kind() != "comment")
                .count()
        })
        .unwrap_or(0)
}

/// Declaration referenced by an identifier-like node, ignoring locals.
fn resolve_reference(ws: &Workspace, file: &Arc<SourceFile>, node: Node) -> Option<DeclRef> {
    let name = file.node_text(node);
    let call = call_of(node);
    let arity = call.map(argument_count);
    let parent = node.parent()?;

    if parent.kind() == "member_expression" && is_field_of(node, parent, "property") {
        let object = parent.child_by_field_name("object")?;
        return match infer_type(ws, file, object) {
            Some(ty) if arity.is_some() => ws
                .find_callable(ty, name, arity)
                .or_else(|| ws.find_member(ty, name, |d| d.kind() != SymbolKind::Import)),
            Some(ty) => ws.find_member(ty, name, |d| d.kind() != SymbolKind::Import),
            None => ws.unique(name, arity, |d| {
                d.parent.is_some() && d.kind() != SymbolKind::Import
            }),
        };
    }

    if node.kind() == "type_identifier" {
        return find_type(ws, file, name);
    }
    if let Some(import) = ancestors(node).find(|a| a.kind() == "import_statement") {
        let source = import
            .child_by_field_name("source")
            .map(|s| string_value(file.node_text(s)))?;
        let module = resolve_source(&file.display_path, &source)?;
        let specifier = ancestors(node).find(|a| a.kind() == "import_specifier");
        let exported = specifier
            .and_then(|s| s.child_by_field_name("name"))
            .map(|n| file.node_text(n))
            .unwrap_or(name);
        return ws.top_level_named(exported).into_iter().find(|r| {
            let package = ws.outline(r.outline).package.as_deref();
            ws.decl(*r).kind() != SymbolKind::Import
                && (package == Some(module.as_str())
                    || package == Some(format!("{}/index", module).as_str()))
        });
    }
    if !matches!(
        node.kind(),
        "identifier" | "shorthand_property_identifier" | "shorthand_property_identifier_pattern"
    ) {
        return None;
    }

    let found = module_level(ws, file, name, arity)?;
    let is_new = call.map(|c| c.kind() == "new_expression").unwrap_or(false);
    match arity {
        Some(n) if is_new && ws.decl(found).kind().is_type() => {
            ws.constructor_of(found, n).or(Some(found))
        }
        _ => Some(found),
    }
}

pub(crate) fn resolve(ws: &Workspace, file: &Arc<SourceFile>, node: Node) -> Option<Element> {
    if !IDENTIFIER_KINDS.contains(&node.kind()) {
        return None;
    }
    let parent = node.parent()?;
    let is_member = parent.kind() == "member_expression" && is_field_of(node, parent, "property");
    if !is_member && matches!(node.kind(), "identifier" | "shorthand_property_identifier") {
        if let Some(local) = find_local(file, node, file.node_text(node)) {
            return Some(Element::local(
                file,
                local.node,
                local.name,
                owner_name(file, local.node),
                local.is_parameter,
            ));
        }
    }
    resolve_reference(ws, file, node).map(|r| ws.element(r))
}

fn write_kind(node: Node) -> Option<UsageType> {
    let parent = node.parent()?;
    let target = if parent.kind() == "member_expression" && is_field_of(node, parent, "property") {
        parent
    } else {
        node
    };
    let holder = target.parent()?;
    match holder.kind() {
        "assignment_expression" if is_field_of(target, holder, "left") => Some(UsageType::FieldWrite),
        "augmented_assignment_expression" if is_field_of(target, holder, "left") => {
            Some(UsageType::FieldIncrement)
        }
        "update_expression" => Some(UsageType::FieldIncrement),
        _ => None,
    }
}

/// `getName`, `isActive`: prefix followed by an uppercase letter.
fn is_accessor(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

fn call_usage(decl: Option<&Decl>, name: &str) -> UsageType {
    let params = decl.and_then(|d| d.param_count);
    if is_accessor(name, "set") && params.map(|p| p == 1).unwrap_or(true) {
        return UsageType::SetterCall;
    }
    let getter = is_accessor(name, "get") || is_accessor(name, "is") || is_accessor(name, "has");
    if getter && params.map(|p| p == 0).unwrap_or(true) {
        return UsageType::GetterCall;
    }
    if decl.map(Decl::is_static).unwrap_or(false) {
        return UsageType::StaticMethodCall;
    }
    UsageType::MethodCall
}

fn classify(_file: &SourceFile, node: Node, target: &Element, decl: Option<&Decl>) -> UsageType {
    let call = call_of(node);
    match target.kind {
        kind if kind == SymbolKind::Constructor || kind.is_type() && kind != SymbolKind::Component => {
            match call {
                Some(c) if c.kind() == "new_expression" => UsageType::ConstructorCall,
                _ => UsageType::TypeReference,
            }
        }
        SymbolKind::Property => match write_kind(node) {
            Some(_) => UsageType::SetterCall,
            None => UsageType::GetterCall,
        },
        kind if kind.is_callable() => match call {
            Some(_) => call_usage(decl, &target.name),
            None => UsageType::Reference,
        },
        kind if kind.is_value() => write_kind(node).unwrap_or(UsageType::FieldRead),
        _ => UsageType::Reference,
    }
}

fn type_hover(ws: &Workspace, r: DeclRef) -> HoverInfo {
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Interface => "interface",
        SymbolKind::Enum => "enum",
        SymbolKind::TypeAlias => "type alias",
        SymbolKind::Namespace => "namespace",
        _ if decl.symbol.has_modifier("abstract") => "abstract class",
        _ => "class",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    info.type_name = decl
        .type_name
        .clone()
        .or_else(|| decl.symbol.qualified_name.clone());
    info.super_types = decl.super_types.clone();
    info.implemented_by = hover::implemented_by(ws, r);
    info
}

/// Classes thrown with `throw new X(...)` in a body.
fn thrown_exceptions(file: &SourceFile, body: Node) -> Vec<String> {
    descendants_of_kind(body, &["throw_statement"])
        .into_iter()
        .filter_map(|stmt| stmt.named_child(0))
        .filter(|expr| expr.kind() == "new_expression")
        .filter_map(|expr| expr.child_by_field_name("constructor"))
        .map(|c| simple_type_name(file.node_text(c)))
        .collect()
}

/// Node carrying the body of a function-like declaration.
fn function_node(node: Node) -> Node {
    match node.kind() {
        "variable_declarator" | "field_definition" | "public_field_definition" => node
            .child_by_field_name("value")
            .filter(|v| FUNCTION_VALUES.contains(&v.kind()))
            .unwrap_or(node),
        _ => node,
    }
}

fn callable_hover(project: &Project, resolver: &WebResolver<'_>, r: DeclRef) -> HoverInfo {
    let ws = resolver.ws;
    let decl = ws.decl(r);
    let modifiers = &decl.symbol.modifiers;
    let element_type = match decl.kind() {
        SymbolKind::Constructor => "constructor",
        SymbolKind::Component => "component",
        SymbolKind::Hook => "hook",
        SymbolKind::AsyncFunction => "async function",
        SymbolKind::Generator => "generator",
        SymbolKind::Function => "function",
        SymbolKind::Property if modifiers.contains("set") => "setter",
        SymbolKind::Property if modifiers.contains("get") => "getter",
        SymbolKind::Property => "property",
        _ if modifiers.contains("static") => "static method",
        _ if decl.symbol.is_async => "async method",
        _ => "method",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    let element = ws.element(r);
    let file = &ws.outline(r.outline).file;

    if let Some(body) = element
        .node()
        .map(function_node)
        .and_then(|f| f.child_by_field_name("body"))
    {
        info.complexity = Some(hover::control_flow(file, body, &BRANCHES).cyclomatic_complexity());
        hover::merge_throws(&mut info, thrown_exceptions(file, body));
    }

    info.overridden_by = hover::overridden_by(ws, r);
    info.called_by_count = hover::usage_count(project, resolver, &element);
    info
}

fn value_hover(project: &Project, resolver: &WebResolver<'_>, r: DeclRef) -> HoverInfo {
    let ws = resolver.ws;
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Constant => "constant",
        SymbolKind::EnumMember => "enum member",
        SymbolKind::Variable => "variable",
        SymbolKind::Property => "property",
        _ if decl.symbol.has_modifier("static") => "static field",
        _ => "field",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    info.called_by_count = hover::usage_count(project, resolver, &ws.element(r));
    info
}

fn local_hover(project: &Project, resolver: &WebResolver<'_>, element: &Element) -> HoverInfo {
    let element_type = if element.is_parameter {
        "parameter"
    } else {
        "local variable"
    };
    let mut info = HoverInfo::new(element.name.clone(), element_type);
    info.type_name = element
        .node()
        .and_then(|node| local_type_text(&element.file, node));
    info.presentable_text = match &info.type_name {
        Some(ty) => format!("{}: {}", element.name, ty),
        None => element.name.clone(),
    };
    info.module = Some(module_path(&element.file.display_path));
    info.called_by_count = hover::usage_count(project, resolver, element);
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_TS: &str = r#"import { User } from './user';
import * as api from '../api';

export const MAX_USERS = 100;

/**
 * Stores users in memory.
 * @deprecated Use UserRepository instead
 */
export class UserService extends BaseService implements Store {
    private users: Map<string, User> = new Map();
    static readonly DEFAULT_LIMIT = 10;
    #secret = 1;

    constructor(private readonly repo: Repo, limit: number) {
        super();
    }

    get count(): number {
        return this.users.size;
    }

    async findUser(id: string): Promise<User | undefined> {
        if (!id || id.length === 0) {
            throw new Error("empty id");
        }
        return this.users.get(id);
    }

    protected _log(message: string): void {}
}

export interface Store {
    readonly size: number;
    clear(): void;
}

export enum Role { Admin = "admin", User = "user" }

export type UserId = string;

export function useUsers(service: UserService) {
    return service.count;
}

export async function loadAll(): Promise<User[]> {
    return [];
}

function* ids() {
    yield 1;
}
"#;

    const CARD_JSX: &str = r#"export function UserCard({ user }) {
    return <div className="card">{user.name}</div>;
}

export const Avatar = (props) => <img src={props.url} />;

const helper = () => 42;
"#;

    fn outline_of(path: &str, source: &str) -> Outline {
        let adapter = WebAdapter::new().unwrap();
        let file = Arc::new(adapter.parse(Path::new(path), source.as_bytes().to_vec()).unwrap());
        adapter.outline(&file).unwrap()
    }

    fn find<'a>(outline: &'a Outline, name: &str) -> &'a Decl {
        outline.decls.iter().find(|d| d.name() == name).unwrap()
    }

    #[test]
    fn test_module_path_and_sources() {
        assert_eq!(module_path("src/services/user.ts"), "src/services/user");
        assert_eq!(module_path("App.tsx"), "App");
        assert_eq!(
            resolve_source("src/services/user.ts", "../models/user").as_deref(),
            Some("src/models/user")
        );
        assert_eq!(
            resolve_source("src/app.js", "./util.js").as_deref(),
            Some("src/util")
        );
        assert_eq!(resolve_source("src/app.js", "react"), None);
    }

    #[test]
    fn test_imports() {
        let outline = outline_of("src/service.ts", SERVICE_TS);
        let user = outline
            .decls
            .iter()
            .find(|d| d.kind() == SymbolKind::Import && d.name() == "User")
            .unwrap();
        assert_eq!(user.symbol.qualified_name.as_deref(), Some("./user.User"));
        let api = find(&outline, "api");
        assert_eq!(api.symbol.qualified_name.as_deref(), Some("../api.*"));
    }

    #[test]
    fn test_class_members() {
        let outline = outline_of("src/service.ts", SERVICE_TS);
        assert_eq!(outline.package.as_deref(), Some("src/service"));

        let service = find(&outline, "UserService");
        assert_eq!(service.kind(), SymbolKind::Class);
        assert_eq!(service.super_types, vec!["BaseService", "Store"]);
        assert!(service.symbol.is_deprecated);
        assert_eq!(service.deprecation.as_deref(), Some("Use UserRepository instead"));
        assert!(service.symbol.has_modifier("export"));
        assert_eq!(service.symbol.documentation.summary.as_deref(), Some("Stores users in memory."));

        let users = find(&outline, "users");
        assert_eq!(users.kind(), SymbolKind::Field);
        assert_eq!(users.symbol.visibility, Visibility::Private);
        assert_eq!(users.type_name.as_deref(), Some("Map<string, User>"));

        assert_eq!(find(&outline, "DEFAULT_LIMIT").kind(), SymbolKind::Constant);
        assert_eq!(find(&outline, "#secret").symbol.visibility, Visibility::Private);

        let ctor = find(&outline, "constructor");
        assert_eq!(ctor.kind(), SymbolKind::Constructor);
        assert_eq!(ctor.param_count, Some(2));
        let repo = find(&outline, "repo");
        assert_eq!(repo.kind(), SymbolKind::Field);
        assert_eq!(repo.symbol.visibility, Visibility::Private);

        assert_eq!(find(&outline, "count").kind(), SymbolKind::Property);

        let find_user = find(&outline, "findUser");
        assert_eq!(find_user.kind(), SymbolKind::Method);
        assert!(find_user.symbol.is_async);
        assert_eq!(find_user.type_name.as_deref(), Some("Promise<User | undefined>"));
        assert_eq!(
            find_user.symbol.qualified_name.as_deref(),
            Some("UserService.findUser")
        );
        assert_eq!(find(&outline, "_log").symbol.visibility, Visibility::Protected);
    }

    #[test]
    fn test_type_declarations() {
        let outline = outline_of("src/service.ts", SERVICE_TS);
        assert_eq!(find(&outline, "Store").kind(), SymbolKind::Interface);
        assert_eq!(find(&outline, "size").kind(), SymbolKind::Property);
        assert_eq!(find(&outline, "clear").kind(), SymbolKind::Method);
        assert_eq!(find(&outline, "Role").kind(), SymbolKind::Enum);
        assert_eq!(find(&outline, "Admin").kind(), SymbolKind::EnumMember);
        assert_eq!(find(&outline, "UserId").kind(), SymbolKind::TypeAlias);
        assert_eq!(find(&outline, "MAX_USERS").kind(), SymbolKind::Constant);
    }

    #[test]
    fn test_function_kinds() {
        let outline = outline_of("src/service.ts", SERVICE_TS);
        assert_eq!(find(&outline, "useUsers").kind(), SymbolKind::Hook);
        let load = find(&outline, "loadAll");
        assert_eq!(load.kind(), SymbolKind::AsyncFunction);
        assert!(load.symbol.has_modifier("async"));
        assert_eq!(find(&outline, "ids").kind(), SymbolKind::Generator);
    }

    #[test]
    fn test_components_need_jsx() {
        let outline = outline_of("src/UserCard.jsx", CARD_JSX);
        assert_eq!(find(&outline, "UserCard").kind(), SymbolKind::Component);
        let avatar = find(&outline, "Avatar");
        assert_eq!(avatar.kind(), SymbolKind::Component);
        assert_eq!(avatar.param_count, Some(1));
        assert!(avatar.symbol.signature.as_deref().unwrap().starts_with("const Avatar = (props) =>"));
        assert_eq!(find(&outline, "helper").kind(), SymbolKind::Function);
    }

    #[test]
    fn test_annotation_type() {
        assert_eq!(annotation_type(": Promise<User | undefined>"), "User");
        assert_eq!(annotation_type("User[]"), "User");
        assert_eq!(annotation_type("Map<string, User>"), "Map");
    }
}
