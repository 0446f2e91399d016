//! Java front end of the JVM adapter.

use std::collections::BTreeSet;
use std::sync::Arc;

use tree_sitter::Node;

use super::{call_usage, find_type, type_of_decl};
use crate::analysis::hover::{self, BranchKinds};
use crate::analysis::model::{Decorator, DocFormat, Documentation, SymbolKind, UsageType, Visibility};
use crate::analysis::navigation::{
    ancestors, child_of_kind, children, children_of_kind, collapse_whitespace, has_token,
    is_field_of, is_within, named_children, preceding_comments, simple_type_name,
};
use crate::analysis::outline::{Decl, Element, Outline};
use crate::analysis::references::{role_phrase, RoleKinds};
use crate::analysis::source::SourceFile;
use crate::analysis::workspace::{DeclRef, Workspace};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const COMMENTS: &[&str] = &["block_comment", "line_comment"];

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "protected",
    "private",
    "abstract",
    "static",
    "final",
    "sealed",
    "non-sealed",
    "strictfp",
    "transient",
    "volatile",
    "synchronized",
    "native",
    "default",
];

const BUILTIN_ANNOTATIONS: &[&str] = &[
    "Override",
    "Deprecated",
    "SuppressWarnings",
    "FunctionalInterface",
    "SafeVarargs",
];

pub(super) static BRANCHES: BranchKinds = BranchKinds {
    ifs: &["if_statement"],
    loops: &[
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "do_statement",
    ],
    ternaries: &["ternary_expression"],
    binaries: &["binary_expression"],
    conjunctions: &[],
    disjunctions: &[],
};

static ROLES: RoleKinds = RoleKinds {
    arguments: &["argument_list"],
    returns: &["return_statement"],
    conditions: &[
        "if_statement",
        "while_statement",
        "do_statement",
        "for_statement",
        "ternary_expression",
    ],
    loops: &["enhanced_for_statement"],
    assignments: &["variable_declarator", "assignment_expression"],
    statements: &[
        "expression_statement",
        "block",
        "constructor_body",
        "class_body",
        "lambda_expression",
        "program",
    ],
};

/// Modifier list of a declaration, keywords in source order.
#[derive(Debug, Clone, Default)]
struct Modifiers {
    keywords: Vec<String>,
    decorators: Vec<Decorator>,
    deprecated: bool,
    deprecation: Option<String>,
    end: Option<usize>,
}

impl Modifiers {
    fn has(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

fn modifiers_of(file: &SourceFile, node: Node) -> Modifiers {
    let mut mods = Modifiers::default();
    let Some(list) = child_of_kind(node, "modifiers") else {
        return mods;
    };
    mods.end = Some(list.end_byte());
    for child in children(list) {
        match child.kind() {
            "marker_annotation" | "annotation" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| simple_type_name(file.node_text(n)))
                    .unwrap_or_default();
                if name == "Deprecated" {
                    mods.deprecated = true;
                    mods.deprecation = child
                        .child_by_field_name("arguments")
                        .map(|a| {
                            file.node_text(a)
                                .trim_start_matches('(')
                                .trim_end_matches(')')
                                .trim()
                                .to_string()
                        })
                        .filter(|a| !a.is_empty());
                }
                mods.decorators.push(Decorator {
                    builtin: BUILTIN_ANNOTATIONS.contains(&name.as_str()),
                    name,
                });
            }
            kind if MODIFIER_KEYWORDS.contains(&kind) => mods.keywords.push(kind.to_string()),
            _ => {}
        }
    }
    mods
}

fn visibility_of(modifiers: &BTreeSet<String>) -> Visibility {
    if modifiers.contains("public") {
        Visibility::Public
    } else if modifiers.contains("protected") {
        Visibility::Protected
    } else if modifiers.contains("private") {
        Visibility::Private
    } else {
        Visibility::PackagePrivate
    }
}

/// Nearest `/** ... */` block above the declaration.
fn javadoc<'t>(file: &'t SourceFile, node: Node) -> Option<&'t str> {
    preceding_comments(node, COMMENTS)
        .into_iter()
        .rev()
        .map(|c| file.node_text(c))
        .find(|text| text.starts_with("/**"))
}

/// Declaration header without annotations or body, keywords first.
fn header(file: &SourceFile, node: Node, mods: &Modifiers, body: Option<Node>) -> String {
    let start = mods.end.unwrap_or(node.start_byte());
    let end = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
    let rest = collapse_whitespace(file.slice(start, end.max(start)));
    let rest = rest.trim_end_matches(|c| c == ';' || c == '{').trim();
    if mods.keywords.is_empty() {
        rest.to_string()
    } else {
        format!("{} {}", mods.keywords.join(" "), rest)
    }
}

fn super_types(file: &SourceFile, node: Node) -> Vec<String> {
    let mut names = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "superclass" => names.extend(
                named_children(child)
                    .into_iter()
                    .map(|t| simple_type_name(file.node_text(t))),
            ),
            "super_interfaces" | "extends_interfaces" => {
                if let Some(list) = child_of_kind(child, "type_list") {
                    names.extend(
                        named_children(list)
                            .into_iter()
                            .map(|t| simple_type_name(file.node_text(t))),
                    );
                }
            }
            _ => {}
        }
    }
    names
}

fn param_count(node: Node) -> Option<usize> {
    let params = node.child_by_field_name("parameters")?;
    Some(
        named_children(params)
            .into_iter()
            .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter"))
            .count(),
    )
}

/// Build the outline of a Java file.
pub(super) fn outline(file: &Arc<SourceFile>) -> Outline {
    let root = file.tree.root_node();
    let package = child_of_kind(root, "package_declaration")
        .and_then(|p| {
            named_children(p)
                .into_iter()
                .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        })
        .map(|n| file.node_text(n).to_string());

    let mut builder = Builder {
        file,
        outline: Outline::new(Arc::clone(file), package),
    };
    for child in named_children(root) {
        match child.kind() {
            "import_declaration" => builder.import(child),
            kind if TYPE_DECLARATIONS.contains(&kind) => builder.type_decl(child, None),
            _ => {}
        }
    }
    builder.outline
}

struct Builder<'a> {
    file: &'a SourceFile,
    outline: Outline,
}

impl Builder<'_> {
    fn qualified(&self, parent: Option<usize>, name: &str) -> String {
        let prefix = match parent {
            Some(p) => {
                let decl = &self.outline.decls[p];
                Some(
                    decl.symbol
                        .qualified_name
                        .clone()
                        .unwrap_or_else(|| decl.name().to_string()),
                )
            }
            None => self.outline.package.clone(),
        };
        match prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.to_string(),
        }
    }

    fn parent_kind(&self, parent: Option<usize>) -> Option<SymbolKind> {
        parent.map(|p| self.outline.decls[p].kind())
    }

    /// Fill modifiers, visibility, annotations, Javadoc and deprecation.
    fn describe(&self, decl: &mut Decl, doc_anchor: Node, mods: &Modifiers, implicit: &[&str]) {
        let mut keywords: BTreeSet<String> = mods.keywords.iter().cloned().collect();
        keywords.extend(implicit.iter().map(|m| m.to_string()));
        if keywords.contains("private") {
            keywords.remove("public");
        }
        decl.symbol.visibility = visibility_of(&keywords);
        decl.symbol.modifiers = keywords;
        decl.symbol.decorators = mods.decorators.clone();

        if let Some(raw) = javadoc(self.file, doc_anchor) {
            let normalized = hover::normalize_doc(raw);
            decl.symbol.documentation =
                Documentation::new(hover::doc_summary(&normalized), DocFormat::Javadoc);
            decl.symbol.is_deprecated |= hover::doc_mentions_deprecation(&normalized);
            decl.doc = Some(raw.to_string());
        }
        decl.symbol.is_deprecated |= mods.deprecated;
        decl.deprecation = mods.deprecation.clone();
    }

    fn import(&mut self, node: Node) {
        let Some(path) = named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        else {
            return;
        };
        let mut name = self.file.node_text(path).to_string();
        if child_of_kind(node, "asterisk").is_some() {
            name.push_str(".*");
        }
        let mut decl = Decl::new(self.file, node, path, name.clone(), SymbolKind::Import);
        decl.symbol.visibility = Visibility::Public;
        decl.symbol.qualified_name = Some(name);
        if has_token(node, "static") {
            decl.symbol.modifiers.insert("static".to_string());
        }
        decl.symbol.signature = Some(collapse_whitespace(self.file.node_text(node)));
        self.outline.push(decl, None);
    }

    fn type_decl(&mut self, node: Node, parent: Option<usize>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let kind = match node.kind() {
            "interface_declaration" | "annotation_type_declaration" => SymbolKind::Interface,
            "enum_declaration" => SymbolKind::Enum,
            _ => SymbolKind::Class,
        };

        let mut implicit: Vec<&str> = Vec::new();
        if self.parent_kind(parent) == Some(SymbolKind::Interface) {
            implicit.extend(["public", "static"]);
        }
        if parent.is_some() && node.kind() != "class_declaration" {
            implicit.push("static");
        }
        if kind == SymbolKind::Enum || node.kind() == "record_declaration" {
            implicit.push("final");
        }

        let mods = modifiers_of(self.file, node);
        let body = node.child_by_field_name("body");
        let mut decl = Decl::new(self.file, node, name_node, name.clone(), kind);
        self.describe(&mut decl, node, &mods, &implicit);
        let qualified = self.qualified(parent, &name);
        decl.symbol.qualified_name = Some(qualified.clone());
        decl.symbol.signature = Some(header(self.file, node, &mods, body));
        decl.super_types = super_types(self.file, node);
        decl.type_name = Some(qualified);
        let index = self.outline.push(decl, parent);

        if node.kind() == "record_declaration" {
            self.record_components(node, index);
        }
        let Some(body) = body else {
            return;
        };
        if kind == SymbolKind::Enum {
            self.enum_body(body, index, name_node, &name);
        } else {
            self.members(body, index);
        }
    }

    fn members(&mut self, body: Node, parent: usize) {
        for child in named_children(body) {
            match child.kind() {
                "field_declaration" | "constant_declaration" => self.field(child, parent),
                "method_declaration" | "annotation_type_element_declaration" => {
                    self.method(child, parent)
                }
                "constructor_declaration" | "compact_constructor_declaration" => {
                    self.constructor(child, parent)
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => self.type_decl(child, Some(parent)),
                _ => {}
            }
        }
    }

    fn enum_body(&mut self, body: Node, parent: usize, name_node: Node, enum_name: &str) {
        for child in named_children(body) {
            match child.kind() {
                "enum_constant" => self.enum_constant(child, parent, enum_name),
                "enum_body_declarations" => self.members(child, parent),
                _ => {}
            }
        }

        let mut values = Decl::synthetic(self.file, name_node, "values", SymbolKind::Method);
        values.symbol.modifiers = public_static();
        values.symbol.visibility = Visibility::Public;
        values.symbol.signature = Some(format!("public static {}[] values()", enum_name));
        values.symbol.qualified_name = Some(self.qualified(Some(parent), "values"));
        values.type_name = Some(format!("{}[]", enum_name));
        values.param_count = Some(0);
        self.outline.push(values, Some(parent));

        let mut value_of = Decl::synthetic(self.file, name_node, "valueOf", SymbolKind::Method);
        value_of.symbol.modifiers = public_static();
        value_of.symbol.visibility = Visibility::Public;
        value_of.symbol.signature = Some(format!("public static {} valueOf(String name)", enum_name));
        value_of.symbol.qualified_name = Some(self.qualified(Some(parent), "valueOf"));
        value_of.type_name = Some(enum_name.to_string());
        value_of.param_count = Some(1);
        self.outline.push(value_of, Some(parent));
    }

    fn enum_constant(&mut self, node: Node, parent: usize, enum_name: &str) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let mut decl = Decl::new(self.file, node, name_node, name.clone(), SymbolKind::EnumMember);
        self.describe(&mut decl, node, &mods, &["public", "static", "final"]);
        decl.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
        let end = node
            .child_by_field_name("body")
            .map(|b| b.start_byte())
            .unwrap_or(node.end_byte());
        decl.symbol.signature = Some(collapse_whitespace(
            self.file.slice(name_node.start_byte(), end),
        ));
        decl.type_name = Some(enum_name.to_string());
        let index = self.outline.push(decl, Some(parent));
        if let Some(body) = node.child_by_field_name("body") {
            self.members(body, index);
        }
    }

    fn record_components(&mut self, node: Node, parent: usize) {
        let Some(params) = node.child_by_field_name("parameters") else {
            return;
        };
        for param in named_children(params) {
            if param.kind() != "formal_parameter" {
                continue;
            }
            let Some(name_node) = param.child_by_field_name("name") else {
                continue;
            };
            let name = self.file.node_text(name_node).to_string();
            let type_text = param
                .child_by_field_name("type")
                .map(|t| self.file.node_text(t).to_string());

            let mut field = Decl::new(self.file, param, name_node, name.clone(), SymbolKind::Field);
            field.symbol.modifiers = ["private", "final"].iter().map(|m| m.to_string()).collect();
            field.symbol.visibility = Visibility::Private;
            field.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
            field.symbol.signature = Some(format!(
                "private final {} {}",
                type_text.as_deref().unwrap_or("var"),
                name
            ));
            field.type_name = type_text.clone();
            self.outline.push(field, Some(parent));

            let mut accessor = Decl::synthetic(self.file, name_node, name.clone(), SymbolKind::Method);
            accessor.symbol.modifiers = ["public"].iter().map(|m| m.to_string()).collect();
            accessor.symbol.visibility = Visibility::Public;
            accessor.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
            accessor.symbol.signature = Some(format!(
                "public {} {}()",
                type_text.as_deref().unwrap_or("Object"),
                name
            ));
            accessor.type_name = type_text;
            accessor.param_count = Some(0);
            self.outline.push(accessor, Some(parent));
        }
    }

    fn field(&mut self, node: Node, parent: usize) {
        let in_interface = self.parent_kind(Some(parent)) == Some(SymbolKind::Interface);
        let implicit: &[&str] = if in_interface {
            &["public", "static", "final"]
        } else {
            &[]
        };
        let mods = modifiers_of(self.file, node);
        let type_text = node
            .child_by_field_name("type")
            .map(|t| self.file.node_text(t).to_string());

        for declarator in children_of_kind(node, "variable_declarator") {
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let name = self.file.node_text(name_node).to_string();
            let mut decl = Decl::new(self.file, declarator, name_node, name.clone(), SymbolKind::Field);
            self.describe(&mut decl, node, &mods, implicit);
            if decl.symbol.has_modifier("static") && decl.symbol.has_modifier("final") {
                decl.symbol.kind = SymbolKind::Constant;
            }
            decl.symbol.qualified_name = Some(self.qualified(Some(parent), &name));

            let mut signature = mods.keywords.join(" ");
            if let Some(ty) = &type_text {
                if !signature.is_empty() {
                    signature.push(' ');
                }
                signature.push_str(ty);
            }
            signature.push(' ');
            signature.push_str(&name);
            if decl.kind() == SymbolKind::Constant {
                if let Some(value) = declarator.child_by_field_name("value") {
                    signature.push_str(" = ");
                    signature.push_str(&collapse_whitespace(self.file.node_text(value)));
                }
            }
            decl.symbol.signature = Some(collapse_whitespace(&signature));
            decl.type_name = type_text.clone();
            self.outline.push(decl, Some(parent));
        }
    }

    fn method(&mut self, node: Node, parent: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let body = node.child_by_field_name("body");

        let in_interface = self.parent_kind(Some(parent)) == Some(SymbolKind::Interface);
        let implicit: &[&str] = if !in_interface || mods.has("private") {
            &[]
        } else if body.is_none() && !mods.has("static") && !mods.has("default") {
            &["public", "abstract"]
        } else {
            &["public"]
        };

        let mut decl = Decl::new(self.file, node, name_node, name.clone(), SymbolKind::Method);
        self.describe(&mut decl, node, &mods, implicit);
        decl.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
        decl.symbol.signature = Some(header(self.file, node, &mods, body));
        decl.type_name = node
            .child_by_field_name("type")
            .map(|t| self.file.node_text(t).to_string());
        decl.param_count = param_count(node).or(Some(0));
        self.outline.push(decl, Some(parent));
    }

    fn constructor(&mut self, node: Node, parent: usize) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let body = node.child_by_field_name("body");

        let mut decl = Decl::new(self.file, node, name_node, name.clone(), SymbolKind::Constructor);
        self.describe(&mut decl, node, &mods, &[]);
        decl.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
        decl.symbol.signature = Some(header(self.file, node, &mods, body));
        decl.type_name = Some(name);
        decl.param_count = match node.kind() {
            "compact_constructor_declaration" => {
                let record = self.outline.decls[parent].start();
                self.file
                    .find_node(record, self.outline.decls[parent].end(), "record_declaration")
                    .and_then(param_count)
            }
            _ => param_count(node).or(Some(0)),
        };
        self.outline.push(decl, Some(parent));
    }
}

fn public_static() -> BTreeSet<String> {
    ["public", "static"].iter().map(|m| m.to_string()).collect()
}

/// A local variable or parameter found by scope search.
struct Local<'t> {
    node: Node<'t>,
    name: Node<'t>,
    is_parameter: bool,
}

fn declares<'t>(file: &SourceFile, node: Node<'t>, name: &str) -> Option<Node<'t>> {
    node.child_by_field_name("name")
        .filter(|n| file.node_text(*n) == name)
}

/// Innermost local or parameter named `name` visible at `usage`.
fn find_local<'t>(file: &SourceFile, usage: Node<'t>, name: &str) -> Option<Local<'t>> {
    let offset = usage.start_byte();
    let mut previous = usage;
    for scope in ancestors(usage) {
        match scope.kind() {
            "method_declaration" | "constructor_declaration" | "lambda_expression" => {
                if let Some(local) = parameter_named(file, scope, name) {
                    return Some(local);
                }
                if scope.kind() != "lambda_expression" {
                    return None;
                }
            }
            "block" | "constructor_body" | "switch_block_statement_group" => {
                let mut found = None;
                for stmt in named_children(scope) {
                    if stmt.start_byte() > offset {
                        break;
                    }
                    if stmt.kind() == "local_variable_declaration" {
                        for declarator in children_of_kind(stmt, "variable_declarator") {
                            if let Some(name_node) = declares(file, declarator, name) {
                                found = Some(Local {
                                    node: declarator,
                                    name: name_node,
                                    is_parameter: false,
                                });
                            }
                        }
                    }
                }
                if found.is_some() {
                    return found;
                }
            }
            "for_statement" => {
                if let Some(init) = scope.child_by_field_name("init") {
                    for declarator in children_of_kind(init, "variable_declarator") {
                        if let Some(name_node) = declares(file, declarator, name) {
                            return Some(Local {
                                node: declarator,
                                name: name_node,
                                is_parameter: false,
                            });
                        }
                    }
                }
            }
            "enhanced_for_statement" => {
                let in_body = scope
                    .child_by_field_name("body")
                    .map(|b| is_within(previous, b))
                    .unwrap_or(false);
                if let (true, Some(name_node)) = (in_body, declares(file, scope, name)) {
                    return Some(Local {
                        node: scope,
                        name: name_node,
                        is_parameter: false,
                    });
                }
            }
            "catch_clause" => {
                if let Some(param) = child_of_kind(scope, "catch_formal_parameter") {
                    if let Some(name_node) = declares(file, param, name) {
                        return Some(Local {
                            node: param,
                            name: name_node,
                            is_parameter: true,
                        });
                    }
                }
            }
            "try_with_resources_statement" => {
                if let Some(spec) = scope.child_by_field_name("resources") {
                    for resource in children_of_kind(spec, "resource") {
                        if resource.start_byte() > offset {
                            break;
                        }
                        if let Some(name_node) = declares(file, resource, name) {
                            return Some(Local {
                                node: resource,
                                name: name_node,
                                is_parameter: false,
                            });
                        }
                    }
                }
            }
            "class_body" | "interface_body" | "enum_body" | "program" => return None,
            _ => {}
        }
        previous = scope;
    }
    None
}

fn parameter_named<'t>(file: &SourceFile, callable: Node<'t>, name: &str) -> Option<Local<'t>> {
    let params = callable.child_by_field_name("parameters")?;
    if params.kind() == "identifier" {
        return (file.node_text(params) == name).then_some(Local {
            node: params,
            name: params,
            is_parameter: true,
        });
    }
    for param in named_children(params) {
        match param.kind() {
            "formal_parameter" | "spread_parameter" => {
                let name_node = param.child_by_field_name("name").or_else(|| {
                    child_of_kind(param, "variable_declarator")
                        .and_then(|d| d.child_by_field_name("name"))
                });
                if let Some(name_node) = name_node.filter(|n| file.node_text(*n) == name) {
                    return Some(Local {
                        node: param,
                        name: name_node,
                        is_parameter: true,
                    });
                }
            }
            "identifier" if file.node_text(param) == name => {
                return Some(Local {
                    node: param,
                    name: param,
                    is_parameter: true,
                });
            }
            _ => {}
        }
    }
    None
}

/// Name of the method or constructor enclosing `node`.
fn owner_name(file: &SourceFile, node: Node) -> Option<String> {
    ancestors(node)
        .find(|n| matches!(n.kind(), "method_declaration" | "constructor_declaration"))
        .and_then(|m| m.child_by_field_name("name"))
        .map(|n| file.node_text(n).to_string())
}

fn local_element(file: &Arc<SourceFile>, local: &Local) -> Element {
    Element::local(
        file,
        local.node,
        local.name,
        owner_name(file, local.node),
        local.is_parameter,
    )
}

/// Declared type text of a local or parameter node.
pub(super) fn local_type_text(file: &SourceFile, node: Node) -> Option<String> {
    let typed = match node.kind() {
        "variable_declarator" => node.parent()?,
        "catch_formal_parameter" => {
            return child_of_kind(node, "catch_type").map(|t| file.node_text(t).to_string())
        }
        _ => node,
    };
    typed
        .child_by_field_name("type")
        .map(|t| file.node_text(t).to_string())
}

fn local_type(ws: &Workspace, file: &Arc<SourceFile>, local: &Local) -> Option<DeclRef> {
    match local_type_text(file, local.node) {
        Some(text) if text != "var" => find_type(ws, file, &text),
        _ => {
            let value = local.node.child_by_field_name("value")?;
            infer_type(ws, file, value)
        }
    }
}

/// Workspace type of an expression, when it can be determined.
fn infer_type(ws: &Workspace, file: &Arc<SourceFile>, expr: Node) -> Option<DeclRef> {
    match expr.kind() {
        "this" => ws.enclosing_types(&file.path, expr.start_byte()).first().copied(),
        "super" => ws.enclosing_types(&file.path, expr.start_byte())
            .first()
            .and_then(|t| ws.supertypes(*t).first().copied()),
        "identifier" => {
            let name = file.node_text(expr);
            if let Some(local) = find_local(file, expr, name) {
                return local_type(ws, file, &local);
            }
            for ty in ws.enclosing_types(&file.path, expr.start_byte()) {
                if let Some(field) = ws.find_value(ty, name) {
                    return type_of_decl(ws, file, field);
                }
            }
            find_type(ws, file, name)
        }
        "field_access" => {
            let object = infer_type(ws, file, expr.child_by_field_name("object")?)?;
            let field = file.node_text(expr.child_by_field_name("field")?);
            let member = ws.find_value(object, field)?;
            type_of_decl(ws, file, member)
        }
        "method_invocation" => {
            let name = file.node_text(expr.child_by_field_name("name")?);
            let method = resolve_call(ws, file, expr, name)?;
            type_of_decl(ws, file, method)
        }
        "object_creation_expression" | "cast_expression" => {
            let ty = expr.child_by_field_name("type")?;
            find_type(ws, file, file.node_text(ty))
        }
        "parenthesized_expression" => infer_type(ws, file, expr.named_child(0)?),
        "type_identifier" | "scoped_type_identifier" | "generic_type" => {
            find_type(ws, file, file.node_text(expr))
        }
        _ => None,
    }
}

fn argument_count(call: Node) -> usize {
    call.child_by_field_name("arguments")
        .map(|args| named_children(args).len())
        .unwrap_or(0)
}

fn resolve_call(ws: &Workspace, file: &Arc<SourceFile>, call: Node, name: &str) -> Option<DeclRef> {
    let arity = Some(argument_count(call));
    match call.child_by_field_name("object") {
        Some(object) => match infer_type(ws, file, object) {
            Some(ty) => ws.find_callable(ty, name, arity),
            None => ws.unique(name, arity, |d| d.kind().is_callable()),
        },
        None => ws.enclosing_types(&file.path, call.start_byte())
            .into_iter()
            .find_map(|ty| ws.find_callable(ty, name, arity))
            .or_else(|| ws.unique(name, arity, |d| d.kind().is_callable())),
    }
}

/// `new T(...)` whose type is (or wraps) `node`.
fn creation_site(node: Node) -> Option<Node> {
    let mut current = node;
    for ancestor in ancestors(node) {
        match ancestor.kind() {
            "object_creation_expression" => {
                return is_field_of(current, ancestor, "type").then_some(ancestor)
            }
            "generic_type" | "scoped_type_identifier" => current = ancestor,
            _ => return None,
        }
    }
    None
}

/// Resolve an identifier-like node to the declaration it names.
pub(super) fn resolve(ws: &Workspace, file: &Arc<SourceFile>, node: Node) -> Option<Element> {
    if !matches!(node.kind(), "identifier" | "type_identifier") {
        return None;
    }
    let name = file.node_text(node);
    let parent = node.parent()?;

    let found = match parent.kind() {
        "method_invocation" if is_field_of(node, parent, "name") => {
            resolve_call(ws, file, parent, name)
        }
        "field_access" if is_field_of(node, parent, "field") => {
            let object = parent.child_by_field_name("object")?;
            match infer_type(ws, file, object) {
                Some(ty) => ws.find_value(ty, name),
                None => ws.unique(name, None, |d| d.kind().is_value()),
            }
        }
        "method_reference" if parent.named_child(0) != Some(node) => {
            let target = parent.named_child(0)?;
            match infer_type(ws, file, target) {
                Some(ty) => ws.find_callable(ty, name, None),
                None => ws.unique(name, None, |d| d.kind().is_callable()),
            }
        }
        _ if node.kind() == "type_identifier" => {
            let ty = find_type(ws, file, name)?;
            match creation_site(node) {
                Some(creation) => ws.constructor_of(ty, argument_count(creation)).or(Some(ty)),
                None => Some(ty),
            }
        }
        _ => {
            if let Some(local) = find_local(file, node, name) {
                return Some(local_element(file, &local));
            }
            ws.enclosing_types(&file.path, node.start_byte())
                .into_iter()
                .find_map(|ty| ws.find_value(ty, name))
                .or_else(|| find_type(ws, file, name))
                .or_else(|| ws.unique(name, None, |d| d.kind().is_value()))
        }
    };
    found.map(|r| ws.element(r))
}

/// Classify a usage already known to refer to `target`.
pub(super) fn classify(
    file: &SourceFile,
    node: Node,
    target: &Element,
    decl: Option<&Decl>,
) -> UsageType {
    if node.parent().map(|p| p.kind()) == Some("method_reference") {
        return UsageType::Reference;
    }
    match target.kind {
        kind if kind == SymbolKind::Constructor || kind.is_type() => {
            if creation_site(node).is_some() {
                UsageType::ConstructorCall
            } else {
                UsageType::TypeReference
            }
        }
        kind if kind.is_callable() => call_usage(decl, &target.name),
        kind if kind.is_value() => value_usage(file, node),
        _ => UsageType::Reference,
    }
}

fn value_usage(file: &SourceFile, node: Node) -> UsageType {
    let mut expr = node;
    if let Some(parent) = node.parent() {
        if parent.kind() == "field_access" && is_field_of(node, parent, "field") {
            expr = parent;
        }
    }
    while let Some(parent) = expr.parent() {
        if parent.kind() != "parenthesized_expression" {
            break;
        }
        expr = parent;
    }
    let Some(parent) = expr.parent() else {
        return UsageType::FieldRead;
    };
    match parent.kind() {
        "update_expression" => UsageType::FieldIncrement,
        "assignment_expression" if is_field_of(expr, parent, "left") => {
            let operator = parent
                .child_by_field_name("operator")
                .map(|op| file.node_text(op))
                .unwrap_or("=");
            if operator == "=" {
                UsageType::FieldWrite
            } else {
                UsageType::FieldIncrement
            }
        }
        _ => UsageType::FieldRead,
    }
}

pub(super) fn data_flow_context(file: &SourceFile, node: Node) -> Option<String> {
    role_phrase(file, node, &ROLES)
}

/// Exception types named in a method's `throws` clause.
pub(super) fn declared_throws(file: &SourceFile, node: Node) -> Vec<String> {
    child_of_kind(node, "throws")
        .map(|clause| {
            named_children(clause)
                .into_iter()
                .map(|t| simple_type_name(file.node_text(t)))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::traits::LanguageAdapter;
    use std::path::Path;

    const USER_SERVICE: &str = r#"package com.example.service;

import java.util.List;
import java.util.concurrent.locks.ReentrantLock;

/**
 * Manages users.
 */
public class UserService extends BaseService implements Auditable {
    public static final String DEFAULT_ROLE = "user";

    /**
     * Maximum number of users.
     * @deprecated Use MAX_CAPACITY instead
     */
    @Deprecated
    public static final int MAX_USERS = 100;

    private final ReentrantLock lock = new ReentrantLock();
    private int count;

    public UserService(int count) {
        this.count = count;
    }

    public void addUser(String name) {
        lock.lock();
        try {
            count++;
        } finally {
            lock.unlock();
        }
    }

    private boolean validate(String name) {
        return name != null && !name.isEmpty();
    }

    public enum Status { ACTIVE, INACTIVE }

    public interface Listener {
        void onAdded(String name);
        int LIMIT = 5;
    }

    public static class Builder {
        public Builder name(String name) { return this; }
    }
}
"#;

    fn outline_of(source: &str) -> Outline {
        let adapter = super::super::JvmAdapter::new().unwrap();
        let file = Arc::new(
            adapter
                .parse(Path::new("UserService.java"), source.as_bytes().to_vec())
                .unwrap(),
        );
        outline(&file)
    }

    fn find<'a>(outline: &'a Outline, name: &str) -> &'a Decl {
        outline.decls.iter().find(|d| d.name() == name).unwrap()
    }

    #[test]
    fn test_package_imports_and_class() {
        let outline = outline_of(USER_SERVICE);
        assert_eq!(outline.package.as_deref(), Some("com.example.service"));

        let imports: Vec<&str> = outline
            .decls
            .iter()
            .filter(|d| d.kind() == SymbolKind::Import)
            .map(|d| d.name())
            .collect();
        assert_eq!(
            imports,
            vec!["java.util.List", "java.util.concurrent.locks.ReentrantLock"]
        );

        let class = find(&outline, "UserService");
        assert_eq!(class.kind(), SymbolKind::Class);
        assert_eq!(
            class.symbol.qualified_name.as_deref(),
            Some("com.example.service.UserService")
        );
        assert_eq!(class.super_types, vec!["BaseService", "Auditable"]);
        assert!(class.symbol.documentation.present);
        assert_eq!(
            class.symbol.documentation.summary.as_deref(),
            Some("Manages users.")
        );
    }

    #[test]
    fn test_constants_and_fields() {
        let outline = outline_of(USER_SERVICE);
        let role = find(&outline, "DEFAULT_ROLE");
        assert_eq!(role.kind(), SymbolKind::Constant);
        let expected: BTreeSet<String> = ["final", "public", "static"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(role.symbol.modifiers, expected);
        assert_eq!(role.symbol.visibility, Visibility::Public);
        assert_eq!(role.type_name.as_deref(), Some("String"));

        let max = find(&outline, "MAX_USERS");
        assert!(max.symbol.is_deprecated);
        assert_eq!(max.symbol.decorators[0].name, "Deprecated");
        assert!(max.symbol.decorators[0].builtin);

        let count = find(&outline, "count");
        assert_eq!(count.kind(), SymbolKind::Field);
        assert_eq!(count.symbol.visibility, Visibility::Private);
    }

    #[test]
    fn test_methods_and_constructor() {
        let outline = outline_of(USER_SERVICE);
        let add = find(&outline, "addUser");
        assert_eq!(add.kind(), SymbolKind::Method);
        assert_eq!(add.symbol.visibility, Visibility::Public);
        assert!(!add.symbol.has_modifier("private"));
        assert_eq!(add.param_count, Some(1));
        assert_eq!(add.type_name.as_deref(), Some("void"));
        assert_eq!(
            add.symbol.signature.as_deref(),
            Some("public void addUser(String name)")
        );

        let ctor = outline
            .decls
            .iter()
            .find(|d| d.kind() == SymbolKind::Constructor)
            .unwrap();
        assert_eq!(ctor.name(), "UserService");
        assert_eq!(ctor.param_count, Some(1));
    }

    #[test]
    fn test_enum_and_interface_implicit_modifiers() {
        let outline = outline_of(USER_SERVICE);
        let active = find(&outline, "ACTIVE");
        assert_eq!(active.kind(), SymbolKind::EnumMember);
        assert!(active.symbol.has_modifier("static"));
        assert_eq!(active.symbol.visibility, Visibility::Public);

        let values = find(&outline, "values");
        assert!(values.symbol.is_synthetic);
        let value_of = find(&outline, "valueOf");
        assert_eq!(value_of.param_count, Some(1));

        let on_added = find(&outline, "onAdded");
        assert!(on_added.symbol.has_modifier("abstract"));
        assert_eq!(on_added.symbol.visibility, Visibility::Public);

        let limit = find(&outline, "LIMIT");
        assert_eq!(limit.kind(), SymbolKind::Constant);

        let builder = find(&outline, "Builder");
        assert!(builder.symbol.has_modifier("static"));
        assert_eq!(
            outline.decls[builder.parent.unwrap()].name(),
            "UserService"
        );
    }

    #[test]
    fn test_record_components() {
        let outline = outline_of("record Point(int x, int y) {}");
        let fields: Vec<&Decl> = outline
            .decls
            .iter()
            .filter(|d| d.kind() == SymbolKind::Field)
            .collect();
        assert_eq!(fields.len(), 2);
        let accessors = outline
            .decls
            .iter()
            .filter(|d| d.kind() == SymbolKind::Method && d.symbol.is_synthetic)
            .count();
        assert_eq!(accessors, 2);
    }
}
