//! Python adapter using tree-sitter.

use std::path::Path;
use std::sync::Arc;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::backend::Backend;
use crate::analysis::hover::{self, BranchKinds};
use crate::analysis::model::{
    Decorator, DocFormat, Documentation, HoverInfo, SymbolKind, UsageType, Visibility,
};
use crate::analysis::navigation::{
    ancestors, child_of_kind, collapse_whitespace, descendants_of_kind, has_token, is_field_of,
    named_children, simple_type_name, visit,
};
use crate::analysis::outline::{Decl, Element, Outline};
use crate::analysis::project::Project;
use crate::analysis::references::{role_phrase, RoleKinds};
use crate::analysis::scan::IdentifierScan;
use crate::analysis::source::SourceFile;
use crate::analysis::traits::{LanguageAdapter, Resolver};
use crate::analysis::workspace::{DeclRef, Workspace};

pub(crate) const ALIASES: &[&str] = &["Python", "PythonCore"];
pub(crate) const EXTENSIONS: &[&str] = &["py", "pyi"];

const PYTHON: &str = "Python";

const SUPPORTED_KINDS: &[SymbolKind] = &[
    SymbolKind::Class,
    SymbolKind::Interface,
    SymbolKind::Enum,
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
    SymbolKind::Import,
];

/// Tree-sitter query for import statements.
const IMPORT_QUERY: &str = r#"
(import_statement) @import
(import_from_statement) @import_from
(future_import_statement) @import_future
"#;

const BUILTIN_DECORATORS: &[&str] = &[
    "property",
    "staticmethod",
    "classmethod",
    "abstractmethod",
    "abstractproperty",
    "cached_property",
    "dataclass",
    "overload",
    "override",
    "wraps",
    "lru_cache",
    "cache",
    "contextmanager",
    "total_ordering",
    "setter",
    "getter",
    "deleter",
];

/// Special methods treated as possible overrides of `object` protocol methods.
const DUNDER_OVERRIDES: &[&str] = &[
    "__init__",
    "__post_init__",
    "__new__",
    "__del__",
    "__str__",
    "__repr__",
    "__format__",
    "__bytes__",
    "__hash__",
    "__bool__",
    "__eq__",
    "__ne__",
    "__lt__",
    "__le__",
    "__gt__",
    "__ge__",
    "__len__",
    "__iter__",
    "__next__",
    "__contains__",
    "__getitem__",
    "__setitem__",
    "__delitem__",
    "__getattr__",
    "__setattr__",
    "__call__",
    "__enter__",
    "__exit__",
    "__aenter__",
    "__aexit__",
];

const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];

const SCOPE_BOUNDARIES: &[&str] = &["function_definition", "class_definition", "lambda"];

static BRANCHES: BranchKinds = BranchKinds {
    ifs: &["if_statement", "elif_clause"],
    loops: &["for_statement", "while_statement"],
    ternaries: &["conditional_expression"],
    binaries: &["boolean_operator"],
    conjunctions: &[],
    disjunctions: &[],
};

static ROLES: RoleKinds = RoleKinds {
    arguments: &["argument_list"],
    returns: &["return_statement"],
    conditions: &["if_statement", "elif_clause", "while_statement"],
    loops: &["for_statement", "for_in_clause"],
    assignments: &["assignment", "augmented_assignment"],
    statements: &["expression_statement", "block", "module", "lambda"],
};

pub struct PythonAdapter {
    language: Language,
    identifiers: IdentifierScan,
    imports: Query,
}

impl PythonAdapter {
    pub fn new() -> anyhow::Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let identifiers = IdentifierScan::new(&language, "(identifier) @name")?;
        let imports = Query::new(&language, IMPORT_QUERY)?;
        Ok(Self {
            language,
            identifiers,
            imports,
        })
    }

    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    fn extract_imports(&self, builder: &mut Builder) {
        let file = builder.file;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.imports, file.tree.root_node(), &file.source[..]);

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let kind = self.imports.capture_names()[capture.index as usize];
                match kind {
                    "import" => builder.import_statement(capture.node),
                    "import_from" | "import_future" => builder.import_from(capture.node),
                    _ => {}
                }
            }
        }
    }
}

impl LanguageAdapter for PythonAdapter {
    fn id(&self) -> &'static str {
        "python"
    }

    fn display_names(&self) -> &'static [&'static str] {
        &["Python"]
    }

    fn aliases(&self) -> &'static [&'static str] {
        ALIASES
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn language_for_extension(&self, ext: &str) -> Option<&'static str> {
        EXTENSIONS.contains(&ext).then_some(PYTHON)
    }

    fn parse(&self, path: &Path, source: Vec<u8>) -> anyhow::Result<SourceFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Python source: {}", path.display()))?;
        Ok(SourceFile::new(tree, source, path, PYTHON))
    }

    fn outline(&self, file: &Arc<SourceFile>) -> anyhow::Result<Outline> {
        let mut builder = Builder {
            file,
            outline: Outline::new(Arc::clone(file), module_path(&file.display_path)),
        };
        self.extract_imports(&mut builder);
        builder.block(file.tree.root_node(), None);
        Ok(builder.outline)
    }
}

/// Dotted module path of a file relative to the project root.
pub(crate) fn module_path(display_path: &str) -> Option<String> {
    let trimmed = display_path
        .strip_suffix(".pyi")
        .or_else(|| display_path.strip_suffix(".py"))
        .unwrap_or(display_path);
    let mut parts: Vec<&str> = trimmed
        .split(['/', '\\'])
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    if parts.last() == Some(&"__init__") {
        parts.pop();
    }
    (!parts.is_empty()).then(|| parts.join("."))
}

/// Visibility from naming convention.
fn visibility_of(name: &str) -> Visibility {
    if name.is_empty() {
        Visibility::Unknown
    } else if name.starts_with("__") && name.ends_with("__") && name.len() > 4 {
        Visibility::Public
    } else if name.starts_with("__") {
        Visibility::Private
    } else if name.starts_with('_') {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

fn is_upper_case(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Unquoted contents of a string literal.
fn string_value(text: &str) -> String {
    text.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Class named by a type annotation: `Optional['User']` and `User | None` give `User`.
fn annotation_type(text: &str) -> String {
    let text = text.trim().trim_matches(|c| c == '\'' || c == '"');
    let text = text
        .split('|')
        .map(str::trim)
        .find(|p| *p != "None")
        .unwrap_or(text);
    if let Some(inner) = text
        .strip_prefix("Optional[")
        .and_then(|t| t.strip_suffix(']'))
    {
        return annotation_type(inner);
    }
    simple_type_name(text.trim_matches(|c| c == '\'' || c == '"'))
}

/// Docstring of a block: its first statement, when that is a bare string.
fn docstring<'t>(file: &'t SourceFile, block: Node) -> Option<&'t str> {
    let first = block.named_child(0)?;
    string_statement(file, first)
}

fn string_statement<'t>(file: &'t SourceFile, node: Node) -> Option<&'t str> {
    if node.kind() != "expression_statement" || node.named_child_count() != 1 {
        return None;
    }
    let inner = node.named_child(0)?;
    (inner.kind() == "string").then(|| file.node_text(inner))
}

struct Decorators {
    list: Vec<Decorator>,
    deprecated: bool,
    deprecation: Option<String>,
}

impl Decorators {
    fn has(&self, name: &str) -> bool {
        self.list
            .iter()
            .any(|d| d.name == name || d.name.rsplit('.').next() == Some(name))
    }
}

fn decorators_of(file: &SourceFile, definition: Node) -> Decorators {
    let mut decorators = Decorators {
        list: Vec::new(),
        deprecated: false,
        deprecation: None,
    };
    let Some(wrapper) = definition
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
    else {
        return decorators;
    };
    for decorator in named_children(wrapper)
        .into_iter()
        .filter(|d| d.kind() == "decorator")
    {
        let Some(expr) = decorator.named_child(0) else {
            continue;
        };
        let callee = if expr.kind() == "call" {
            expr.child_by_field_name("function").unwrap_or(expr)
        } else {
            expr
        };
        let name = collapse_whitespace(file.node_text(callee));
        let last = name.rsplit('.').next().unwrap_or(&name).to_string();
        if last == "deprecated" {
            decorators.deprecated = true;
            decorators.deprecation = expr
                .child_by_field_name("arguments")
                .and_then(|args| {
                    named_children(args).into_iter().find_map(|a| match a.kind() {
                        "string" => Some(string_value(file.node_text(a))),
                        "keyword_argument" => a
                            .child_by_field_name("value")
                            .filter(|v| v.kind() == "string")
                            .map(|v| string_value(file.node_text(v))),
                        _ => None,
                    })
                })
                .filter(|m| !m.is_empty());
        }
        decorators.list.push(Decorator {
            builtin: BUILTIN_DECORATORS.contains(&last.as_str()),
            name,
        });
    }
    decorators
}

/// The outermost node of a definition, including its decorators.
fn with_decorators(definition: Node) -> Node {
    definition
        .parent()
        .filter(|p| p.kind() == "decorated_definition")
        .unwrap_or(definition)
}

fn contains_yield(body: Node) -> bool {
    let mut found = false;
    visit(body, |n| {
        if n.kind() == "yield" {
            found = true;
        }
        !found && (n.id() == body.id() || !SCOPE_BOUNDARIES.contains(&n.kind()))
    });
    found
}

fn is_parameter_node(node: Node) -> bool {
    matches!(
        node.kind(),
        "identifier"
            | "typed_parameter"
            | "default_parameter"
            | "typed_default_parameter"
            | "list_splat_pattern"
            | "dictionary_splat_pattern"
    )
}

/// Name identifier of a parameter node.
fn parameter_name(param: Node) -> Option<Node> {
    match param.kind() {
        "identifier" => Some(param),
        "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
        _ => named_children(param)
            .into_iter()
            .find(|c| c.kind() == "identifier")
            .or_else(|| {
                named_children(param)
                    .into_iter()
                    .find_map(|c| child_of_kind(c, "identifier"))
            }),
    }
}

struct Builder<'a> {
    file: &'a SourceFile,
    outline: Outline,
}

impl Builder<'_> {
    fn qualified(&self, parent: Option<usize>, name: &str) -> String {
        let prefix = match parent {
            Some(p) => self.outline.decls[p].symbol.qualified_name.clone(),
            None => self.outline.package.clone(),
        };
        match prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.to_string(),
        }
    }

    fn push_import(&mut self, anchor: Node, name_node: Node, name: String, statement: Node) {
        let mut decl = Decl::new(self.file, anchor, name_node, name.clone(), SymbolKind::Import);
        decl.symbol.visibility = Visibility::Public;
        decl.symbol.qualified_name = Some(name);
        decl.symbol.signature = Some(collapse_whitespace(self.file.node_text(statement)));
        self.outline.push(decl, None);
    }

    fn import_statement(&mut self, node: Node) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let path = if name.kind() == "aliased_import" {
                name.child_by_field_name("name").unwrap_or(name)
            } else {
                name
            };
            let text = self.file.node_text(path).to_string();
            self.push_import(name, path, text, node);
        }
    }

    fn import_from(&mut self, node: Node) {
        let module = node
            .child_by_field_name("module_name")
            .map(|m| self.file.node_text(m).to_string())
            .unwrap_or_else(|| "__future__".to_string());
        let join = |name: &str| {
            if module.ends_with('.') {
                format!("{}{}", module, name)
            } else {
                format!("{}.{}", module, name)
            }
        };

        if let Some(wildcard) = child_of_kind(node, "wildcard_import") {
            self.push_import(wildcard, wildcard, join("*"), node);
            return;
        }
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let path = if name.kind() == "aliased_import" {
                name.child_by_field_name("name").unwrap_or(name)
            } else {
                name
            };
            let text = join(self.file.node_text(path));
            self.push_import(name, path, text, node);
        }
    }

    /// Declarations directly inside a module or class block.
    fn block(&mut self, block: Node, parent: Option<usize>) {
        let statements = named_children(block);
        for (i, stmt) in statements.iter().enumerate() {
            match stmt.kind() {
                "decorated_definition" => {
                    if let Some(def) = stmt.child_by_field_name("definition") {
                        self.definition(def, parent);
                    }
                }
                "class_definition" | "function_definition" => self.definition(*stmt, parent),
                "expression_statement" => {
                    let doc = statements
                        .get(i + 1)
                        .and_then(|next| string_statement(self.file, *next));
                    if let Some(assignment) = child_of_kind(*stmt, "assignment") {
                        self.assignment(assignment, parent, doc);
                    }
                }
                _ => {}
            }
        }
    }

    fn definition(&mut self, node: Node, parent: Option<usize>) {
        match node.kind() {
            "class_definition" => self.class(node, parent),
            "function_definition" => self.function(node, parent),
            _ => {}
        }
    }

    fn apply_doc(&self, decl: &mut Decl, raw: Option<&str>) {
        if let Some(raw) = raw {
            let normalized = hover::normalize_doc(raw);
            decl.symbol.documentation =
                Documentation::new(hover::doc_summary(&normalized), DocFormat::Docstring);
            decl.symbol.is_deprecated |= hover::doc_mentions_deprecation(&normalized);
            decl.doc = Some(raw.to_string());
        }
    }

    fn apply_decorators(&self, decl: &mut Decl, decorators: Decorators) {
        decl.symbol.is_deprecated |= decorators.deprecated;
        decl.deprecation = decorators.deprecation;
        decl.symbol.decorators = decorators.list;
    }

    /// Header text from the node start to its body, without the colon.
    fn header(&self, node: Node) -> String {
        let end = node
            .child_by_field_name("body")
            .map(|b| b.start_byte())
            .unwrap_or(node.end_byte());
        let text = collapse_whitespace(self.file.slice(node.start_byte(), end));
        text.trim_end().trim_end_matches(':').trim_end().to_string()
    }

    fn class(&mut self, node: Node, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let super_types: Vec<String> = node
            .child_by_field_name("superclasses")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|b| !matches!(b.kind(), "keyword_argument" | "comment"))
                    .map(|b| simple_type_name(self.file.node_text(b)))
                    .collect()
            })
            .unwrap_or_default();

        let kind = if super_types.iter().any(|s| ENUM_BASES.contains(&s.as_str())) {
            SymbolKind::Enum
        } else if super_types.iter().any(|s| s == "Protocol") {
            SymbolKind::Interface
        } else {
            SymbolKind::Class
        };

        let decorators = decorators_of(self.file, node);
        let is_dataclass = decorators.has("dataclass");
        let mut decl = Decl::new(self.file, with_decorators(node), name_node, name.clone(), kind);
        decl.symbol.visibility = visibility_of(&name);
        if super_types.iter().any(|s| s == "ABC") {
            decl.symbol.modifiers.insert("abstract".to_string());
        }
        let body = node.child_by_field_name("body");
        self.apply_doc(&mut decl, body.and_then(|b| docstring(self.file, b)));
        self.apply_decorators(&mut decl, decorators);
        let qualified = self.qualified(parent, &name);
        decl.symbol.qualified_name = Some(qualified.clone());
        decl.symbol.signature = Some(self.header(node));
        decl.super_types = super_types;
        decl.type_name = Some(qualified);
        let index = self.outline.push(decl, parent);

        if let Some(body) = body {
            self.block(body, Some(index));
        }
        if is_dataclass {
            self.dataclass_init(name_node, index);
        }
    }

    /// Synthetic `__init__` for a dataclass that does not write one.
    fn dataclass_init(&mut self, anchor: Node, class: usize) {
        let members: Vec<usize> = self.outline.children(class).collect();
        let has_init = members
            .iter()
            .any(|m| self.outline.decls[*m].name() == "__init__");
        if has_init {
            return;
        }
        let fields: Vec<String> = members
            .iter()
            .map(|m| &self.outline.decls[*m])
            .filter(|d| d.kind().is_value() && d.node_kind == "assignment")
            .filter(|d| d.type_name.as_deref().map(|t| !t.starts_with("ClassVar")).unwrap_or(false))
            .filter(|d| {
                !self
                    .file
                    .slice(d.start(), d.end())
                    .replace(' ', "")
                    .contains("init=False")
            })
            .map(|d| match &d.type_name {
                Some(ty) => format!("{}: {}", d.name(), ty),
                None => d.name().to_string(),
            })
            .collect();

        let mut init = Decl::synthetic(self.file, anchor, "__init__", SymbolKind::Constructor);
        init.symbol.visibility = Visibility::Public;
        init.symbol.qualified_name = Some(self.qualified(Some(class), "__init__"));
        init.symbol.signature = Some(if fields.is_empty() {
            "def __init__(self)".to_string()
        } else {
            format!("def __init__(self, {})", fields.join(", "))
        });
        init.type_name = Some("None".to_string());
        init.param_count = Some(fields.len());
        self.outline.push(init, Some(class));
    }

    fn function(&mut self, node: Node, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let decorators = decorators_of(self.file, node);
        let body = node.child_by_field_name("body");
        let is_async = has_token(node, "async");
        let is_generator = body.map(contains_yield).unwrap_or(false);
        let in_class = parent
            .map(|p| self.outline.decls[p].kind().is_type())
            .unwrap_or(false);

        let is_property = decorators.has("property")
            || decorators.has("cached_property")
            || decorators.has("setter")
            || decorators.has("deleter");
        let kind = if in_class {
            if name == "__init__" {
                SymbolKind::Constructor
            } else if is_property {
                SymbolKind::Property
            } else {
                SymbolKind::Method
            }
        } else if is_async {
            SymbolKind::AsyncFunction
        } else if is_generator {
            SymbolKind::Generator
        } else {
            SymbolKind::Function
        };

        let mut decl = Decl::new(self.file, with_decorators(node), name_node, name.clone(), kind);
        decl.symbol.visibility = visibility_of(&name);
        decl.symbol.is_async = is_async;
        decl.symbol.is_generator = is_generator;
        let modifiers = &mut decl.symbol.modifiers;
        if is_async {
            modifiers.insert("async".to_string());
        }
        for (decorator, modifier) in [
            ("staticmethod", "staticmethod"),
            ("classmethod", "classmethod"),
            ("abstractmethod", "abstract"),
            ("override", "override"),
            ("setter", "setter"),
        ] {
            if decorators.has(decorator) {
                modifiers.insert(modifier.to_string());
            }
        }
        if in_class && DUNDER_OVERRIDES.contains(&name.as_str()) {
            modifiers.insert("override".to_string());
        }

        let skip_receiver = in_class && !decorators.has("staticmethod");
        decl.param_count = node.child_by_field_name("parameters").map(|params| {
            let count = named_children(params)
                .into_iter()
                .filter(|p| is_parameter_node(*p))
                .filter(|p| !matches!(p.kind(), "list_splat_pattern" | "dictionary_splat_pattern"))
                .count();
            if skip_receiver {
                count.saturating_sub(1)
            } else {
                count
            }
        });

        self.apply_doc(&mut decl, body.and_then(|b| docstring(self.file, b)));
        self.apply_decorators(&mut decl, decorators);
        decl.symbol.qualified_name = Some(self.qualified(parent, &name));
        decl.symbol.signature = Some(self.header(node));
        decl.type_name = node
            .child_by_field_name("return_type")
            .map(|t| self.file.node_text(t).to_string());
        self.outline.push(decl, parent);

        if kind == SymbolKind::Constructor {
            let receiver = node
                .child_by_field_name("parameters")
                .and_then(|p| p.named_child(0))
                .and_then(parameter_name)
                .map(|n| self.file.node_text(n));
            if let (Some(body), Some(class), Some(receiver)) = (body, parent, receiver) {
                self.instance_fields(body, class, receiver);
            }
        }
    }

    /// `self.x = ...` assignments in a constructor become fields of the class.
    fn instance_fields(&mut self, body: Node, class: usize, self_name: &str) {
        let mut found: Vec<(Node, Node)> = Vec::new();
        visit(body, |n| {
            if n.kind() == "assignment" {
                if let Some(left) = n.child_by_field_name("left") {
                    let is_self = left.kind() == "attribute"
                        && left
                            .child_by_field_name("object")
                            .map(|o| self.file.node_text(o) == self_name)
                            .unwrap_or(false);
                    if let (true, Some(attr)) = (is_self, left.child_by_field_name("attribute")) {
                        found.push((n, attr));
                    }
                }
            }
            n.id() == body.id() || !SCOPE_BOUNDARIES.contains(&n.kind())
        });

        for (assignment, attr) in found {
            let name = self.file.node_text(attr).to_string();
            let declared = self
                .outline
                .children(class)
                .any(|m| self.outline.decls[m].name() == name);
            if declared {
                continue;
            }
            let mut decl = Decl::new(self.file, assignment, attr, name.clone(), SymbolKind::Field);
            decl.symbol.visibility = visibility_of(&name);
            decl.symbol.qualified_name = Some(self.qualified(Some(class), &name));
            decl.type_name = assignment
                .child_by_field_name("type")
                .map(|t| self.file.node_text(t).to_string());
            decl.symbol.signature = Some(match &decl.type_name {
                Some(ty) => format!("self.{}: {}", name, ty),
                None => format!("self.{}", name),
            });
            self.outline.push(decl, Some(class));
        }
    }

    fn assignment(&mut self, node: Node, parent: Option<usize>, doc: Option<&str>) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = self.file.node_text(left).to_string();
        let parent_kind = parent.map(|p| self.outline.decls[p].kind());
        let kind = match parent_kind {
            Some(SymbolKind::Enum) if !name.starts_with('_') => SymbolKind::EnumMember,
            _ if is_upper_case(&name) => SymbolKind::Constant,
            Some(_) => SymbolKind::Field,
            None => SymbolKind::Variable,
        };

        let mut decl = Decl::new(self.file, node, left, name.clone(), kind);
        decl.symbol.visibility = visibility_of(&name);
        self.apply_doc(&mut decl, doc);
        decl.symbol.qualified_name = Some(self.qualified(parent, &name));
        decl.type_name = node
            .child_by_field_name("type")
            .map(|t| self.file.node_text(t).to_string());

        let mut signature = name.clone();
        if let Some(ty) = &decl.type_name {
            signature.push_str(": ");
            signature.push_str(ty);
        }
        if matches!(kind, SymbolKind::Constant | SymbolKind::EnumMember) {
            if let Some(value) = node.child_by_field_name("right") {
                signature.push_str(" = ");
                signature.push_str(&collapse_whitespace(self.file.node_text(value)));
            }
        }
        decl.symbol.signature = Some(signature);
        if parent_kind == Some(SymbolKind::Enum) {
            decl.type_name = parent.map(|p| self.outline.decls[p].name().to_string());
        }
        self.outline.push(decl, parent);
    }
}

impl Backend for PythonAdapter {
    type Resolver<'w> = PythonResolver<'w>;

    fn resolver<'w>(&'w self, ws: &'w Workspace) -> PythonResolver<'w> {
        PythonResolver { adapter: self, ws }
    }

    fn symbol_kinds(&self) -> &'static [SymbolKind] {
        SUPPORTED_KINDS
    }

    fn hover(
        &self,
        project: &Project,
        resolver: &PythonResolver<'_>,
        element: &Element,
    ) -> anyhow::Result<Option<HoverInfo>> {
        let ws = resolver.ws;
        let Some(r) = ws.ref_for(element) else {
            return Ok(Some(local_hover(project, resolver, element)));
        };
        let decl = ws.decl(r);
        let info = match decl.kind() {
            kind if kind.is_type() => type_hover(ws, r),
            kind if kind.is_callable() || kind == SymbolKind::Property => {
                callable_hover(project, resolver, r)
            }
            kind if kind.is_value() => value_hover(project, resolver, r),
            kind => hover::from_decl(ws, r, kind.as_str()),
        };
        Ok(Some(info))
    }
}

/// Scope resolution over one request's Python workspace.
pub struct PythonResolver<'w> {
    adapter: &'w PythonAdapter,
    ws: &'w Workspace,
}

impl Resolver for PythonResolver<'_> {
    fn workspace(&self) -> &Workspace {
        self.ws
    }

    fn resolve(&self, file: &Arc<SourceFile>, node: Node<'_>) -> Option<Element> {
        resolve(self.ws, file, node)
    }

    fn usage_nodes<'t>(&self, file: &'t SourceFile, name: &str) -> Vec<Node<'t>> {
        self.adapter.identifiers.matching(file, name)
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
            return name.starts_with("Test") || name.ends_with("Test") || name.ends_with("Tests");
        }
        name.starts_with("test_")
            || name == "test"
            || decl.symbol.decorators.iter().any(|d| d.name.ends_with("fixture"))
    }
}

/// A local name binding found by scope search.
struct Local<'t> {
    node: Node<'t>,
    name: Node<'t>,
    is_parameter: bool,
}

fn parameters_of<'t>(file: &SourceFile, params: Node<'t>, name: &str) -> Option<Local<'t>> {
    named_children(params)
        .into_iter()
        .filter(|p| is_parameter_node(*p))
        .find_map(|p| {
            parameter_name(p)
                .filter(|n| file.node_text(*n) == name)
                .map(|n| Local {
                    node: p,
                    name: n,
                    is_parameter: true,
                })
        })
}

/// Identifiers bound by an assignment target or loop variable.
fn target_identifiers(target: Node) -> Vec<Node> {
    match target.kind() {
        "identifier" => vec![target],
        "pattern_list" | "tuple_pattern" | "list_pattern" | "expression_list" | "tuple"
        | "list" => named_children(target)
            .into_iter()
            .flat_map(target_identifiers)
            .collect(),
        "list_splat_pattern" => named_children(target)
            .into_iter()
            .flat_map(target_identifiers)
            .collect(),
        _ => Vec::new(),
    }
}

/// First binding of `name` in a function body, outside nested scopes.
fn function_binding<'t>(file: &SourceFile, body: Node<'t>, name: &str) -> Option<Local<'t>> {
    let mut declared_global = false;
    let mut found: Option<Local<'t>> = None;
    visit(body, |n| {
        if found.is_some() || declared_global {
            return false;
        }
        match n.kind() {
            "global_statement" | "nonlocal_statement" => {
                declared_global = named_children(n)
                    .into_iter()
                    .any(|i| file.node_text(i) == name);
            }
            "assignment" | "augmented_assignment" => {
                if let Some(left) = n.child_by_field_name("left") {
                    if let Some(id) = target_identifiers(left)
                        .into_iter()
                        .find(|i| file.node_text(*i) == name)
                    {
                        let node = if left.kind() == "identifier" { n } else { id };
                        found = Some(Local {
                            node,
                            name: id,
                            is_parameter: false,
                        });
                    }
                }
            }
            "for_statement" => {
                if let Some(id) = n
                    .child_by_field_name("left")
                    .map(target_identifiers)
                    .unwrap_or_default()
                    .into_iter()
                    .find(|i| file.node_text(*i) == name)
                {
                    found = Some(Local {
                        node: id,
                        name: id,
                        is_parameter: false,
                    });
                }
            }
            "as_pattern_target" | "named_expression" => {
                let id = if n.kind() == "named_expression" {
                    n.child_by_field_name("name")
                } else {
                    descendants_of_kind(n, &["identifier"]).into_iter().next()
                };
                if let Some(id) = id.filter(|i| file.node_text(*i) == name) {
                    found = Some(Local {
                        node: id,
                        name: id,
                        is_parameter: false,
                    });
                }
            }
            "except_clause" => {
                if let Some(id) = named_children(n)
                    .into_iter()
                    .filter(|c| c.kind() == "identifier")
                    .find(|i| file.node_text(*i) == name)
                {
                    found = Some(Local {
                        node: id,
                        name: id,
                        is_parameter: false,
                    });
                }
            }
            _ => {}
        }
        n.id() == body.id() || !SCOPE_BOUNDARIES.contains(&n.kind())
    });
    if declared_global {
        return None;
    }
    found
}

fn find_local<'t>(file: &SourceFile, usage: Node<'t>, name: &str) -> Option<Local<'t>> {
    for scope in ancestors(usage) {
        match scope.kind() {
            "lambda" => {
                if let Some(local) = scope
                    .child_by_field_name("parameters")
                    .and_then(|p| parameters_of(file, p, name))
                {
                    return Some(local);
                }
            }
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
            | "generator_expression" => {
                for clause in named_children(scope)
                    .into_iter()
                    .filter(|c| c.kind() == "for_in_clause")
                {
                    if let Some(id) = clause
                        .child_by_field_name("left")
                        .map(target_identifiers)
                        .unwrap_or_default()
                        .into_iter()
                        .find(|i| file.node_text(*i) == name)
                    {
                        return Some(Local {
                            node: id,
                            name: id,
                            is_parameter: false,
                        });
                    }
                }
            }
            "function_definition" => {
                if let Some(local) = scope
                    .child_by_field_name("parameters")
                    .and_then(|p| parameters_of(file, p, name))
                {
                    return Some(local);
                }
                if let Some(local) = scope
                    .child_by_field_name("body")
                    .and_then(|b| function_binding(file, b, name))
                {
                    return Some(local);
                }
            }
            "module" => return None,
            _ => {}
        }
    }
    None
}

fn owner_name(file: &SourceFile, node: Node) -> Option<String> {
    ancestors(node)
        .find(|n| n.kind() == "function_definition")
        .and_then(|f| f.child_by_field_name("name"))
        .map(|n| file.node_text(n).to_string())
}

/// Type annotation text of a local binding.
fn local_type_text(file: &SourceFile, node: Node) -> Option<String> {
    node.child_by_field_name("type")
        .map(|t| file.node_text(t).to_string())
}

/// Preferred type named `name`: same file, then imported, then first.
fn find_type(ws: &Workspace, file: &SourceFile, name: &str) -> Option<DeclRef> {
    let candidates = ws.types_named(&annotation_type(name));
    let here = ws.outline_index(&file.path);
    candidates
        .iter()
        .find(|r| Some(r.outline) == here)
        .or_else(|| candidates.iter().find(|r| is_imported(ws, file, **r)))
        .or_else(|| candidates.first())
        .copied()
}

/// True when `file` imports the module declaring `r`.
fn is_imported(ws: &Workspace, file: &SourceFile, r: DeclRef) -> bool {
    let Some(here) = ws.outline_for(&file.path) else {
        return false;
    };
    let Some(module) = ws.outline(r.outline).package.as_deref() else {
        return false;
    };
    let name = ws.decl(r).name();
    here.decls
        .iter()
        .filter(|d| d.kind() == SymbolKind::Import)
        .any(|d| match d.name().trim_start_matches('.').rsplit_once('.') {
            Some((from, item)) => {
                (item == name || item == "*")
                    && (module == from || module.ends_with(&format!(".{}", from)))
            }
            None => false,
        })
}

/// Top-level declaration visible under `name` from `file`.
fn module_level(ws: &Workspace, file: &SourceFile, name: &str, arity: Option<usize>) -> Option<DeclRef> {
    let candidates: Vec<DeclRef> = ws
        .top_level_named(name)
        .into_iter()
        .filter(|r| ws.decl(*r).kind() != SymbolKind::Import)
        .collect();
    let here = ws.outline_index(&file.path);
    candidates
        .iter()
        .find(|r| Some(r.outline) == here)
        .or_else(|| candidates.iter().find(|r| is_imported(ws, file, **r)))
        .copied()
        .or_else(|| {
            ws.unique(name, arity, |d| {
                d.parent.is_none() && d.kind() != SymbolKind::Import
            })
        })
}

fn local_type(ws: &Workspace, file: &Arc<SourceFile>, local: &Local) -> Option<DeclRef> {
    if let Some(text) = local_type_text(file, local.node) {
        return find_type(ws, file, &text);
    }
    if local.node.kind() == "assignment" {
        return infer_type(ws, file, local.node.child_by_field_name("right")?);
    }
    None
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

fn infer_type(ws: &Workspace, file: &Arc<SourceFile>, expr: Node) -> Option<DeclRef> {
    match expr.kind() {
        "identifier" => {
            let name = file.node_text(expr);
            if let Some(local) = find_local(file, expr, name) {
                if local.is_parameter && matches!(name, "self" | "cls") {
                    return ws.enclosing_types(&file.path, expr.start_byte()).first().copied();
                }
                return local_type(ws, file, &local);
            }
            if let Some(ty) = find_type(ws, file, name) {
                return Some(ty);
            }
            let value = module_level(ws, file, name, None)?;
            type_of_decl(ws, file, value)
        }
        "call" => {
            let function = expr.child_by_field_name("function")?;
            if function.kind() == "identifier" && file.node_text(function) == "super" {
                let ty = ws.enclosing_types(&file.path, expr.start_byte()).first().copied()?;
                return ws.supertypes(ty).first().copied();
            }
            let target = resolve_reference(ws, file, last_identifier(function)?)?;
            type_of_decl(ws, file, target)
        }
        "attribute" => {
            let receiver = infer_type(ws, file, expr.child_by_field_name("object")?)?;
            let name = file.node_text(expr.child_by_field_name("attribute")?);
            let member = ws.find_member(receiver, name, |d| d.kind() != SymbolKind::Import)?;
            type_of_decl(ws, file, member)
        }
        "parenthesized_expression" => infer_type(ws, file, expr.named_child(0)?),
        _ => None,
    }
}

/// Identifier naming the callee of a call's `function` expression.
fn last_identifier(function: Node) -> Option<Node> {
    match function.kind() {
        "identifier" => Some(function),
        "attribute" => function.child_by_field_name("attribute"),
        _ => None,
    }
}

/// Call expression whose callee is `node` (directly or as `obj.node`).
fn call_of(node: Node) -> Option<Node> {
    let parent = node.parent()?;
    let callee = if parent.kind() == "attribute" && is_field_of(node, parent, "attribute") {
        parent
    } else {
        node
    };
    let call = callee.parent()?;
    (call.kind() == "call" && is_field_of(callee, call, "function")).then_some(call)
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

/// Declaration referenced by an identifier, ignoring local bindings.
fn resolve_reference(ws: &Workspace, file: &Arc<SourceFile>, node: Node) -> Option<DeclRef> {
    let name = file.node_text(node);
    let arity = call_of(node).map(argument_count);
    let parent = node.parent()?;

    if parent.kind() == "attribute" && is_field_of(node, parent, "attribute") {
        let object = parent.child_by_field_name("object")?;
        return match infer_type(ws, file, object) {
            Some(ty) => match arity {
                Some(_) => ws
                    .find_callable(ty, name, arity)
                    .or_else(|| ws.find_member(ty, name, |d| d.kind() != SymbolKind::Import)),
                None => ws.find_member(ty, name, |d| d.kind() != SymbolKind::Import),
            },
            None => ws.unique(name, arity, |d| {
                d.parent.is_some() && d.kind() != SymbolKind::Import
            }),
        };
    }

    let in_class_body = ancestors(node)
        .find(|a| matches!(a.kind(), "function_definition" | "lambda" | "class_definition"))
        .map(|a| a.kind() == "class_definition")
        .unwrap_or(false);
    let class_member = if in_class_body {
        ws.enclosing_types(&file.path, node.start_byte())
            .first()
            .and_then(|ty| ws.find_member(*ty, name, |d| d.kind() != SymbolKind::Import))
    } else {
        None
    };

    let found = class_member.or_else(|| module_level(ws, file, name, arity))?;
    match arity {
        Some(n) if ws.decl(found).kind().is_type() => ws.constructor_of(found, n).or(Some(found)),
        _ => Some(found),
    }
}

pub(crate) fn resolve(ws: &Workspace, file: &Arc<SourceFile>, node: Node) -> Option<Element> {
    if node.kind() != "identifier" {
        return None;
    }
    let parent = node.parent()?;
    if parent.kind() == "keyword_argument" && is_field_of(node, parent, "name") {
        return None;
    }
    let is_member = parent.kind() == "attribute" && is_field_of(node, parent, "attribute");
    if !is_member {
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

fn is_assigned(node: Node) -> Option<&'static str> {
    let parent = node.parent()?;
    let expr = if parent.kind() == "attribute" && is_field_of(node, parent, "attribute") {
        parent
    } else {
        node
    };
    let mut target = expr;
    for ancestor in ancestors(expr) {
        match ancestor.kind() {
            "pattern_list" | "tuple_pattern" | "list_pattern" => target = ancestor,
            "assignment" if is_field_of(target, ancestor, "left") => return Some("="),
            "augmented_assignment" if is_field_of(target, ancestor, "left") => return Some("+="),
            _ => return None,
        }
    }
    None
}

fn call_usage(decl: Option<&Decl>, name: &str) -> UsageType {
    let params = decl.and_then(|d| d.param_count);
    let snake = |prefix: &str| name.starts_with(prefix) && name.len() > prefix.len();
    if snake("set_") && params.map(|p| p == 1).unwrap_or(true) {
        return UsageType::SetterCall;
    }
    if (snake("get_") || snake("is_") || snake("has_")) && params.map(|p| p == 0).unwrap_or(true) {
        return UsageType::GetterCall;
    }
    if decl.map(Decl::is_static).unwrap_or(false) {
        return UsageType::StaticMethodCall;
    }
    UsageType::MethodCall
}

fn classify(_file: &SourceFile, node: Node, target: &Element, decl: Option<&Decl>) -> UsageType {
    match target.kind {
        kind if kind == SymbolKind::Constructor || kind.is_type() => {
            if call_of(node).is_some() {
                UsageType::ConstructorCall
            } else {
                UsageType::TypeReference
            }
        }
        SymbolKind::Property => match is_assigned(node) {
            Some(_) => UsageType::SetterCall,
            None => UsageType::GetterCall,
        },
        kind if kind.is_callable() => {
            if call_of(node).is_some() {
                call_usage(decl, &target.name)
            } else {
                UsageType::Reference
            }
        }
        kind if kind.is_value() => match is_assigned(node) {
            Some("=") => UsageType::FieldWrite,
            Some(_) => UsageType::FieldIncrement,
            None => UsageType::FieldRead,
        },
        _ => UsageType::Reference,
    }
}

fn type_hover(ws: &Workspace, r: DeclRef) -> HoverInfo {
    let decl = ws.decl(r);
    let is_dataclass = decl
        .symbol
        .decorators
        .iter()
        .any(|d| d.name.rsplit('.').next() == Some("dataclass"));
    let element_type = match decl.kind() {
        SymbolKind::Enum => "enum",
        SymbolKind::Interface => "protocol",
        _ if is_dataclass => "dataclass",
        _ if decl.symbol.has_modifier("abstract") => "abstract class",
        _ => "class",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    info.type_name = decl.symbol.qualified_name.clone();
    info.super_types = decl.super_types.clone();
    info.implemented_by = hover::implemented_by(ws, r);
    info
}

/// Exception classes raised directly in a function body.
fn raised_exceptions(file: &SourceFile, body: Node) -> Vec<String> {
    descendants_of_kind(body, &["raise_statement"])
        .into_iter()
        .filter_map(|stmt| stmt.named_child(0))
        .filter_map(|expr| {
            let callee = if expr.kind() == "call" {
                expr.child_by_field_name("function")?
            } else {
                expr
            };
            matches!(callee.kind(), "identifier" | "attribute")
                .then(|| simple_type_name(file.node_text(callee)))
        })
        .collect()
}

fn callable_hover(project: &Project, resolver: &PythonResolver<'_>, r: DeclRef) -> HoverInfo {
    let ws = resolver.ws;
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Constructor => "constructor",
        SymbolKind::Property => "property",
        SymbolKind::AsyncFunction => "async function",
        SymbolKind::Generator => "generator",
        SymbolKind::Function => "function",
        _ if decl.symbol.has_modifier("staticmethod") => "static method",
        _ if decl.symbol.has_modifier("classmethod") => "class method",
        _ if decl.symbol.is_async => "async method",
        _ => "method",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    let element = ws.element(r);
    let file = &ws.outline(r.outline).file;

    let definition = element.node().and_then(|n| {
        if n.kind() == "decorated_definition" {
            n.child_by_field_name("definition")
        } else {
            Some(n)
        }
    });
    if let Some(body) = definition.and_then(|d| d.child_by_field_name("body")) {
        info.complexity = Some(hover::control_flow(file, body, &BRANCHES).cyclomatic_complexity());
        hover::merge_throws(&mut info, raised_exceptions(file, body));
    }

    info.overridden_by = hover::overridden_by(ws, r);
    info.called_by_count = hover::usage_count(project, resolver, &element);
    info
}

fn value_hover(project: &Project, resolver: &PythonResolver<'_>, r: DeclRef) -> HoverInfo {
    let ws = resolver.ws;
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Constant => "constant",
        SymbolKind::EnumMember => "enum member",
        SymbolKind::Variable => "variable",
        _ if decl
            .symbol
            .signature
            .as_deref()
            .is_some_and(|s| s.starts_with("self.")) =>
        {
            "instance variable"
        }
        _ => "class variable",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    info.called_by_count = hover::usage_count(project, resolver, &ws.element(r));
    info
}

fn local_hover(project: &Project, resolver: &PythonResolver<'_>, element: &Element) -> HoverInfo {
    let element_type = if element.is_parameter {
        "parameter"
    } else {
        "variable"
    };
    let mut info = HoverInfo::new(element.name.clone(), element_type);
    info.type_name = element
        .node()
        .and_then(|node| local_type_text(&element.file, node));
    info.presentable_text = match &info.type_name {
        Some(ty) => format!("{}: {}", element.name, ty),
        None => element.name.clone(),
    };
    info.module = module_path(&element.file.display_path);
    info.called_by_count = hover::usage_count(project, resolver, element);
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#""""User service module."""

from dataclasses import dataclass
from enum import Enum
import logging as log

DEFAULT_ROLE = "user"

MAX_USERS = 1000
"""@deprecated Use MAX_ACTIVE_USERS instead."""

_cache_size = 100


class Role(Enum):
    ADMIN = "admin"
    USER = "user"


@dataclass
class User:
    """A registered user."""
    id: str
    name: str
    role: Role = Role.USER

    @property
    def is_admin(self) -> bool:
        return self.role == Role.ADMIN

    def __str__(self) -> str:
        return self.name

    @staticmethod
    def _validate(email: str) -> bool:
        return "@" in email


class UserService:
    def __init__(self, limit: int = 10):
        self.users = {}
        self.__secret = "x"

    def add_user(self, user: User) -> None:
        """Add a user.

        Raises:
            ValueError: when full
        """
        if len(self.users) >= MAX_USERS and user:
            raise ValueError("full")
        self.users[user.id] = user

    async def fetch(self):
        pass


def numbers():
    yield 1


async def load():
    return None
"#;

    fn outline_of(source: &str) -> Outline {
        let adapter = PythonAdapter::new().unwrap();
        let file = Arc::new(
            adapter
                .parse(Path::new("demo/user_service.py"), source.as_bytes().to_vec())
                .unwrap()
                .with_display_path("demo/user_service.py"),
        );
        adapter.outline(&file).unwrap()
    }

    fn find<'a>(outline: &'a Outline, name: &str) -> &'a Decl {
        outline.decls.iter().find(|d| d.name() == name).unwrap()
    }

    #[test]
    fn test_module_path() {
        assert_eq!(module_path("demo/user.py").as_deref(), Some("demo.user"));
        assert_eq!(module_path("demo/__init__.py").as_deref(), Some("demo"));
        assert_eq!(module_path("stubs/api.pyi").as_deref(), Some("stubs.api"));
    }

    #[test]
    fn test_visibility_by_convention() {
        assert_eq!(visibility_of("name"), Visibility::Public);
        assert_eq!(visibility_of("_name"), Visibility::Protected);
        assert_eq!(visibility_of("__name"), Visibility::Private);
        assert_eq!(visibility_of("__init__"), Visibility::Public);
        assert_eq!(visibility_of(""), Visibility::Unknown);
    }

    #[test]
    fn test_imports() {
        let outline = outline_of(SOURCE);
        let imports: Vec<&str> = outline
            .decls
            .iter()
            .filter(|d| d.kind() == SymbolKind::Import)
            .map(|d| d.name())
            .collect();
        assert!(imports.contains(&"dataclasses.dataclass"));
        assert!(imports.contains(&"enum.Enum"));
        assert!(imports.contains(&"logging"));
    }

    #[test]
    fn test_module_values() {
        let outline = outline_of(SOURCE);
        assert_eq!(outline.package.as_deref(), Some("demo.user_service"));
        let role = find(&outline, "DEFAULT_ROLE");
        assert_eq!(role.kind(), SymbolKind::Constant);
        assert_eq!(
            role.symbol.qualified_name.as_deref(),
            Some("demo.user_service.DEFAULT_ROLE")
        );
        let max = find(&outline, "MAX_USERS");
        assert!(max.symbol.is_deprecated);
        assert!(max.symbol.documentation.present);
        let cache = find(&outline, "_cache_size");
        assert_eq!(cache.kind(), SymbolKind::Variable);
        assert_eq!(cache.symbol.visibility, Visibility::Protected);
    }

    #[test]
    fn test_enum_and_dataclass() {
        let outline = outline_of(SOURCE);
        assert_eq!(find(&outline, "Role").kind(), SymbolKind::Enum);
        assert_eq!(find(&outline, "ADMIN").kind(), SymbolKind::EnumMember);

        let user = find(&outline, "User");
        assert_eq!(user.symbol.decorators[0].name, "dataclass");
        assert!(user.symbol.decorators[0].builtin);

        let init = outline
            .decls
            .iter()
            .position(|d| d.kind() == SymbolKind::Constructor && d.symbol.is_synthetic)
            .unwrap();
        assert_eq!(outline.decls[init].param_count, Some(3));
        assert_eq!(outline.container_name(init), Some("User"));
    }

    #[test]
    fn test_methods() {
        let outline = outline_of(SOURCE);
        assert_eq!(find(&outline, "is_admin").kind(), SymbolKind::Property);
        assert!(find(&outline, "__str__").symbol.has_modifier("override"));
        let validate = find(&outline, "_validate");
        assert!(validate.symbol.has_modifier("staticmethod"));
        assert_eq!(validate.param_count, Some(1));
        assert_eq!(validate.symbol.visibility, Visibility::Protected);

        let add = find(&outline, "add_user");
        assert_eq!(add.kind(), SymbolKind::Method);
        assert_eq!(add.param_count, Some(1));
        assert_eq!(
            add.symbol.signature.as_deref(),
            Some("def add_user(self, user: User) -> None")
        );

        let fetch = find(&outline, "fetch");
        assert!(fetch.symbol.is_async);
        assert!(fetch.symbol.has_modifier("async"));
        assert_eq!(find(&outline, "numbers").kind(), SymbolKind::Generator);
        assert_eq!(find(&outline, "load").kind(), SymbolKind::AsyncFunction);
    }

    #[test]
    fn test_instance_fields_from_constructor() {
        let outline = outline_of(SOURCE);
        let ctor = find(&outline, "__init__");
        assert_eq!(ctor.kind(), SymbolKind::Constructor);
        assert_eq!(ctor.param_count, Some(1));
        let users = find(&outline, "users");
        assert_eq!(users.kind(), SymbolKind::Field);
        assert_eq!(outline.decls[users.parent.unwrap()].name(), "UserService");
        assert_eq!(find(&outline, "__secret").symbol.visibility, Visibility::Private);
    }

    #[test]
    fn test_annotation_type() {
        assert_eq!(annotation_type("Optional['User']"), "User");
        assert_eq!(annotation_type("User | None"), "User");
        assert_eq!(annotation_type("\"UserService\""), "UserService");
        assert_eq!(annotation_type("List[User]"), "List");
    }
}
