//! Kotlin front end of the JVM adapter.

use std::collections::BTreeSet;
use std::sync::Arc;

use tree_sitter::Node;

use super::{call_usage, find_type, type_of_decl};
use crate::analysis::hover::{self, BranchKinds};
use crate::analysis::model::{Decorator, DocFormat, Documentation, SymbolKind, UsageType, Visibility};
use crate::analysis::navigation::{
    ancestors, child_of_kind, children, children_of_kind, collapse_whitespace, descendants_of_kind,
    has_token, named_children, preceding_comments, simple_type_name,
};
use crate::analysis::outline::{Decl, Element, Outline};
use crate::analysis::references::{role_phrase, RoleKinds};
use crate::analysis::source::SourceFile;
use crate::analysis::workspace::{DeclRef, Workspace};

const COMMENTS: &[&str] = &["block_comment", "line_comment", "multiline_comment", "comment"];

const TYPE_NODES: &[&str] = &["type", "user_type", "nullable_type", "function_type", "type_reference"];

const BUILTIN_ANNOTATIONS: &[&str] = &[
    "Deprecated",
    "Suppress",
    "JvmStatic",
    "JvmField",
    "JvmOverloads",
    "Throws",
];

pub(super) static BRANCHES: BranchKinds = BranchKinds {
    ifs: &["if_expression"],
    loops: &["for_statement", "while_statement", "do_while_statement"],
    ternaries: &["elvis_expression"],
    binaries: &["binary_expression"],
    conjunctions: &["conjunction_expression"],
    disjunctions: &["disjunction_expression"],
};

static ROLES: RoleKinds = RoleKinds {
    arguments: &["value_arguments"],
    returns: &["return_expression", "jump_expression"],
    conditions: &["if_expression", "while_statement", "do_while_statement"],
    loops: &["for_statement"],
    assignments: &["assignment"],
    statements: &[
        "statements",
        "block",
        "function_body",
        "class_body",
        "lambda_literal",
        "source_file",
    ],
};

/// Modifier list of a declaration.
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

/// `(name, first argument)` of an annotation node.
fn annotation_parts(file: &SourceFile, node: Node) -> Option<(String, Option<String>)> {
    let ty = descendants_of_kind(node, &["user_type"]).into_iter().next()?;
    let name = simple_type_name(file.node_text(ty));
    let argument = descendants_of_kind(node, &["value_argument"])
        .into_iter()
        .next()
        .map(|a| file.node_text(a).trim().trim_matches('"').to_string());
    Some((name, argument))
}

fn modifiers_of(file: &SourceFile, node: Node) -> Modifiers {
    let mut mods = Modifiers::default();
    let Some(list) = child_of_kind(node, "modifiers") else {
        return mods;
    };
    mods.end = Some(list.end_byte());
    for child in named_children(list) {
        if child.kind() == "annotation" {
            let Some((name, argument)) = annotation_parts(file, child) else {
                continue;
            };
            if name == "Deprecated" {
                mods.deprecated = true;
                mods.deprecation = argument.filter(|a| !a.is_empty());
            }
            mods.decorators.push(Decorator {
                builtin: BUILTIN_ANNOTATIONS.contains(&name.as_str()),
                name,
            });
        } else {
            mods.keywords
                .extend(file.node_text(child).split_whitespace().map(str::to_string));
        }
    }
    mods
}

fn visibility_of(modifiers: &BTreeSet<String>) -> Visibility {
    if modifiers.contains("private") {
        Visibility::Private
    } else if modifiers.contains("protected") {
        Visibility::Protected
    } else if modifiers.contains("internal") {
        Visibility::PackagePrivate
    } else {
        Visibility::Public
    }
}

fn kdoc<'t>(file: &'t SourceFile, node: Node) -> Option<&'t str> {
    preceding_comments(node, COMMENTS)
        .into_iter()
        .rev()
        .map(|c| file.node_text(c))
        .find(|text| text.starts_with("/**"))
}

/// Declared name: the first direct `identifier` child.
fn name_of(node: Node) -> Option<Node> {
    child_of_kind(node, "identifier")
}

/// Type written after the `:` token of a declaration.
fn declared_type<'t>(file: &'t SourceFile, node: Node) -> Option<&'t str> {
    let mut after_colon = false;
    for child in children(node) {
        if child.kind() == ":" {
            after_colon = true;
        } else if after_colon && TYPE_NODES.contains(&child.kind()) {
            return Some(file.node_text(child));
        } else if after_colon && child.is_named() {
            return None;
        }
    }
    None
}

fn property_name(node: Node) -> Option<Node> {
    child_of_kind(node, "variable_declaration")
        .and_then(name_of)
        .or_else(|| name_of(node))
}

fn property_type<'t>(file: &'t SourceFile, node: Node) -> Option<&'t str> {
    child_of_kind(node, "variable_declaration")
        .and_then(|v| declared_type(file, v))
        .or_else(|| declared_type(file, node))
}

fn is_mutable(node: Node) -> bool {
    has_token(node, "var")
        || child_of_kind(node, "binding_pattern_kind")
            .map(|b| has_token(b, "var"))
            .unwrap_or(false)
}

fn count_params(list: Option<Node>, kind: &str) -> usize {
    list.map(|l| children_of_kind(l, kind).len()).unwrap_or(0)
}

fn super_types(file: &SourceFile, node: Node) -> Vec<String> {
    let specifiers = match child_of_kind(node, "delegation_specifiers") {
        Some(list) => children_of_kind(list, "delegation_specifier"),
        None => children_of_kind(node, "delegation_specifier"),
    };
    specifiers
        .into_iter()
        .filter_map(|d| descendants_of_kind(d, &["user_type"]).into_iter().next())
        .map(|t| simple_type_name(file.node_text(t)))
        .collect()
}

/// Build the outline of a Kotlin file.
pub(super) fn outline(file: &Arc<SourceFile>) -> Outline {
    let root = file.tree.root_node();
    let package = child_of_kind(root, "package_header")
        .and_then(|p| child_of_kind(p, "qualified_identifier").or_else(|| name_of(p)))
        .map(|n| file.node_text(n).to_string());

    let mut builder = Builder {
        file,
        outline: Outline::new(Arc::clone(file), package),
    };
    builder.top_level(root);
    builder.outline
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    TopLevel,
    Type,
    Interface,
}

struct Builder<'a> {
    file: &'a SourceFile,
    outline: Outline,
}

impl Builder<'_> {
    fn top_level(&mut self, node: Node) {
        for child in named_children(node) {
            match child.kind() {
                "import_list" => self.top_level(child),
                "import" | "import_header" => self.import(child),
                _ => self.declaration(child, None, Scope::TopLevel),
            }
        }
    }

    fn declaration(&mut self, node: Node, parent: Option<usize>, scope: Scope) {
        match node.kind() {
            "class_declaration" | "object_declaration" | "companion_object" => {
                self.type_decl(node, parent)
            }
            "function_declaration" => self.function(node, parent, scope),
            "property_declaration" => self.property(node, parent, scope),
            "type_alias" => self.type_alias(node, parent),
            "secondary_constructor" => {
                if let Some(p) = parent {
                    self.secondary_constructor(node, p)
                }
            }
            _ => {}
        }
    }

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

    fn describe(&self, decl: &mut Decl, node: Node, mods: &Modifiers, implicit: &[&str]) {
        let mut keywords: BTreeSet<String> = mods.keywords.iter().cloned().collect();
        keywords.extend(implicit.iter().map(|m| m.to_string()));
        decl.symbol.visibility = visibility_of(&keywords);
        decl.symbol.is_async = keywords.contains("suspend");
        decl.symbol.modifiers = keywords;
        decl.symbol.decorators = mods.decorators.clone();

        if let Some(raw) = kdoc(self.file, node) {
            let normalized = hover::normalize_doc(raw);
            decl.symbol.documentation =
                Documentation::new(hover::doc_summary(&normalized), DocFormat::Kdoc);
            decl.symbol.is_deprecated |= hover::doc_mentions_deprecation(&normalized);
            decl.doc = Some(raw.to_string());
        }
        decl.symbol.is_deprecated |= mods.deprecated;
        decl.deprecation = mods.deprecation.clone();
    }

    /// Source header from after the modifiers up to `end`, keywords first.
    fn header(&self, node: Node, mods: &Modifiers, end: usize) -> String {
        let start = mods.end.unwrap_or(node.start_byte());
        let rest = collapse_whitespace(self.file.slice(start, end.max(start)));
        let rest = rest.trim_end_matches(|c| c == '{' || c == '=').trim();
        if mods.keywords.is_empty() {
            rest.to_string()
        } else {
            format!("{} {}", mods.keywords.join(" "), rest)
        }
    }

    fn import(&mut self, node: Node) {
        let Some(path) = child_of_kind(node, "qualified_identifier")
            .or_else(|| child_of_kind(node, "identifier"))
        else {
            return;
        };
        let mut name = self.file.node_text(path).to_string();
        if has_token(node, "*") || has_token(node, ".*") {
            name.push_str(".*");
        }
        let mut decl = Decl::new(self.file, node, path, name.clone(), SymbolKind::Import);
        decl.symbol.visibility = Visibility::Public;
        decl.symbol.qualified_name = Some(name);
        decl.symbol.signature = Some(collapse_whitespace(self.file.node_text(node)));
        self.outline.push(decl, None);
    }

    fn type_decl(&mut self, node: Node, parent: Option<usize>) {
        let companion = node.kind() == "companion_object";
        let name_node = match name_of(node) {
            Some(n) => n,
            None if companion => match child_of_kind(node, "object") {
                Some(keyword) => keyword,
                None => return,
            },
            None => return,
        };
        let name = if !name_node.is_named() {
            "Companion".to_string()
        } else {
            self.file.node_text(name_node).to_string()
        };

        let mods = modifiers_of(self.file, node);
        let kind = if node.kind() != "class_declaration" {
            SymbolKind::Object
        } else if has_token(node, "interface") {
            SymbolKind::Interface
        } else if mods.has("enum") {
            SymbolKind::Enum
        } else {
            SymbolKind::Class
        };
        let implicit: &[&str] = match kind {
            SymbolKind::Interface => &["abstract"],
            _ if companion => &["companion"],
            _ => &[],
        };

        let body = child_of_kind(node, "class_body").or_else(|| child_of_kind(node, "enum_class_body"));
        let mut decl = Decl::new(self.file, node, name_node, name.clone(), kind);
        self.describe(&mut decl, node, &mods, implicit);
        let qualified = self.qualified(parent, &name);
        decl.symbol.qualified_name = Some(qualified.clone());
        decl.symbol.signature = Some(self.header(
            node,
            &mods,
            body.map(|b| b.start_byte()).unwrap_or(node.end_byte()),
        ));
        decl.super_types = super_types(self.file, node);
        decl.type_name = Some(qualified);
        let index = self.outline.push(decl, parent);

        if let Some(ctor) = child_of_kind(node, "primary_constructor") {
            self.primary_constructor(ctor, name_node, index, &name);
        }
        let scope = if kind == SymbolKind::Interface {
            Scope::Interface
        } else {
            Scope::Type
        };
        if let Some(body) = body {
            self.members(body, index, scope);
        }
        if kind == SymbolKind::Enum {
            self.enum_synthetics(name_node, index, &name);
        }
    }

    fn members(&mut self, body: Node, parent: usize, scope: Scope) {
        for child in named_children(body) {
            match child.kind() {
                "enum_entry" => self.enum_entry(child, parent),
                "class_member_declarations" | "statements" => self.members(child, parent, scope),
                _ => self.declaration(child, Some(parent), scope),
            }
        }
    }

    fn primary_constructor(&mut self, ctor: Node, name_node: Node, parent: usize, class_name: &str) {
        let params = child_of_kind(ctor, "class_parameters");
        let mods = modifiers_of(self.file, ctor);
        let mut decl = Decl::new(self.file, ctor, name_node, class_name, SymbolKind::Constructor);
        self.describe(&mut decl, ctor, &mods, &[]);
        decl.symbol.qualified_name = Some(self.qualified(Some(parent), class_name));
        let params_text = params
            .map(|p| collapse_whitespace(self.file.node_text(p)))
            .unwrap_or_else(|| "()".to_string());
        decl.symbol.signature = Some(if mods.keywords.is_empty() {
            format!("constructor{}", params_text)
        } else {
            format!("{} constructor{}", mods.keywords.join(" "), params_text)
        });
        decl.type_name = Some(class_name.to_string());
        decl.param_count = Some(count_params(params, "class_parameter"));
        self.outline.push(decl, Some(parent));

        let Some(params) = params else {
            return;
        };
        for param in children_of_kind(params, "class_parameter") {
            let declares_property = has_token(param, "val")
                || has_token(param, "var")
                || child_of_kind(param, "binding_pattern_kind").is_some();
            if !declares_property {
                continue;
            }
            let Some(param_name) = name_of(param) else {
                continue;
            };
            let name = self.file.node_text(param_name).to_string();
            let mods = modifiers_of(self.file, param);
            let mut decl = Decl::new(self.file, param, param_name, name.clone(), SymbolKind::Property);
            self.describe(&mut decl, param, &mods, &[]);
            decl.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
            decl.symbol.signature = Some(self.header(param, &mods, param.end_byte()));
            decl.type_name = declared_type(self.file, param).map(str::to_string);
            self.outline.push(decl, Some(parent));
        }
    }

    fn secondary_constructor(&mut self, node: Node, parent: usize) {
        let class_name = self.outline.decls[parent].name().to_string();
        let mods = modifiers_of(self.file, node);
        let params = child_of_kind(node, "function_value_parameters");
        let anchor = params.unwrap_or(node);
        let body = child_of_kind(node, "block");

        let mut decl = Decl::new(self.file, node, anchor, class_name.clone(), SymbolKind::Constructor);
        decl.name_start = node.start_byte();
        decl.name_end = anchor.start_byte();
        self.describe(&mut decl, node, &mods, &[]);
        decl.symbol.qualified_name = Some(self.qualified(Some(parent), &class_name));
        decl.symbol.signature = Some(self.header(
            node,
            &mods,
            body.map(|b| b.start_byte()).unwrap_or(node.end_byte()),
        ));
        decl.type_name = Some(class_name);
        decl.param_count = Some(count_params(params, "parameter"));
        self.outline.push(decl, Some(parent));
    }

    fn enum_entry(&mut self, node: Node, parent: usize) {
        let Some(name_node) = name_of(node) else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let mut decl = Decl::new(self.file, node, name_node, name.clone(), SymbolKind::EnumMember);
        self.describe(&mut decl, node, &mods, &[]);
        decl.symbol.qualified_name = Some(self.qualified(Some(parent), &name));
        let mut signature = name.clone();
        if let Some(args) = child_of_kind(node, "value_arguments") {
            signature.push_str(&collapse_whitespace(self.file.node_text(args)));
        }
        decl.symbol.signature = Some(signature);
        decl.type_name = Some(self.outline.decls[parent].name().to_string());
        let index = self.outline.push(decl, Some(parent));
        if let Some(body) = child_of_kind(node, "class_body") {
            self.members(body, index, Scope::Type);
        }
    }

    fn enum_synthetics(&mut self, anchor: Node, parent: usize, enum_name: &str) {
        let mut values = Decl::synthetic(self.file, anchor, "values", SymbolKind::Method);
        values.symbol.signature = Some(format!("fun values(): Array<{}>", enum_name));
        values.symbol.qualified_name = Some(self.qualified(Some(parent), "values"));
        values.type_name = Some(format!("Array<{}>", enum_name));
        values.param_count = Some(0);
        self.outline.push(values, Some(parent));

        let mut value_of = Decl::synthetic(self.file, anchor, "valueOf", SymbolKind::Method);
        value_of.symbol.signature = Some(format!("fun valueOf(value: String): {}", enum_name));
        value_of.symbol.qualified_name = Some(self.qualified(Some(parent), "valueOf"));
        value_of.type_name = Some(enum_name.to_string());
        value_of.param_count = Some(1);
        self.outline.push(value_of, Some(parent));
    }

    fn function(&mut self, node: Node, parent: Option<usize>, scope: Scope) {
        let Some(name_node) = name_of(node) else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let body = child_of_kind(node, "function_body");

        let kind = if mods.has("operator") {
            SymbolKind::Operator
        } else if scope == Scope::TopLevel {
            SymbolKind::Function
        } else {
            SymbolKind::Method
        };
        let implicit: &[&str] = if scope == Scope::Interface && body.is_none() {
            &["abstract"]
        } else {
            &[]
        };

        let mut decl = Decl::new(self.file, node, name_node, name.clone(), kind);
        self.describe(&mut decl, node, &mods, implicit);
        decl.symbol.qualified_name = Some(self.qualified(parent, &name));
        decl.symbol.signature = Some(self.header(
            node,
            &mods,
            body.map(|b| b.start_byte()).unwrap_or(node.end_byte()),
        ));
        decl.type_name = declared_type(self.file, node).map(str::to_string);
        decl.param_count = Some(count_params(
            child_of_kind(node, "function_value_parameters"),
            "parameter",
        ));
        self.outline.push(decl, parent);
    }

    fn property(&mut self, node: Node, parent: Option<usize>, scope: Scope) {
        let Some(name_node) = property_name(node) else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let kind = if mods.has("const") && !is_mutable(node) {
            SymbolKind::Constant
        } else {
            SymbolKind::Property
        };
        let implicit: &[&str] = if scope == Scope::Interface {
            &["abstract"]
        } else {
            &[]
        };

        let mut decl = Decl::new(self.file, node, name_node, name.clone(), kind);
        self.describe(&mut decl, node, &mods, implicit);
        decl.symbol.qualified_name = Some(self.qualified(parent, &name));

        let end = if kind == SymbolKind::Constant {
            named_children(node)
                .into_iter()
                .filter(|c| !matches!(c.kind(), "getter" | "setter"))
                .map(|c| c.end_byte())
                .max()
                .unwrap_or(node.end_byte())
        } else {
            child_of_kind(node, "property_delegate")
                .or_else(|| child_of_kind(node, "variable_declaration"))
                .map(|c| c.end_byte())
                .unwrap_or(name_node.end_byte())
        };
        decl.symbol.signature = Some(self.header(node, &mods, end));
        decl.type_name = property_type(self.file, node).map(str::to_string);
        self.outline.push(decl, parent);
    }

    fn type_alias(&mut self, node: Node, parent: Option<usize>) {
        let Some(name_node) = name_of(node) else {
            return;
        };
        let name = self.file.node_text(name_node).to_string();
        let mods = modifiers_of(self.file, node);
        let mut decl = Decl::new(self.file, node, name_node, name.clone(), SymbolKind::TypeAlias);
        self.describe(&mut decl, node, &mods, &[]);
        decl.symbol.qualified_name = Some(self.qualified(parent, &name));
        decl.symbol.signature = Some(self.header(node, &mods, node.end_byte()));
        decl.type_name = named_children(node)
            .into_iter()
            .filter(|c| TYPE_NODES.contains(&c.kind()))
            .last()
            .map(|t| self.file.node_text(t).to_string());
        self.outline.push(decl, parent);
    }
}

struct Local<'t> {
    node: Node<'t>,
    name: Node<'t>,
    is_parameter: bool,
}

fn named<'t>(file: &SourceFile, node: Node<'t>, name: &str) -> Option<Node<'t>> {
    name_of(node).filter(|n| file.node_text(*n) == name)
}

/// Statements of a block-like node, looking through `statements` wrappers.
fn statements_of(node: Node) -> Vec<Node> {
    named_children(node)
        .into_iter()
        .flat_map(|c| {
            if c.kind() == "statements" {
                named_children(c)
            } else {
                vec![c]
            }
        })
        .collect()
}

fn find_local<'t>(file: &SourceFile, usage: Node<'t>, name: &str) -> Option<Local<'t>> {
    let offset = usage.start_byte();
    for scope in ancestors(usage) {
        match scope.kind() {
            "function_declaration" | "secondary_constructor" => {
                let params = child_of_kind(scope, "function_value_parameters");
                for param in params.map(|p| children_of_kind(p, "parameter")).unwrap_or_default() {
                    if let Some(name_node) = named(file, param, name) {
                        return Some(Local {
                            node: param,
                            name: name_node,
                            is_parameter: true,
                        });
                    }
                }
            }
            "lambda_literal" => {
                if let Some(params) = child_of_kind(scope, "lambda_parameters") {
                    for param in children_of_kind(params, "variable_declaration") {
                        if let Some(name_node) = named(file, param, name) {
                            return Some(Local {
                                node: param,
                                name: name_node,
                                is_parameter: true,
                            });
                        }
                    }
                }
            }
            "block" | "statements" | "function_body" | "control_structure_body" => {
                let mut found = None;
                for stmt in statements_of(scope) {
                    if stmt.start_byte() > offset {
                        break;
                    }
                    if stmt.kind() == "property_declaration" {
                        if let Some(name_node) = property_name(stmt).filter(|n| file.node_text(*n) == name) {
                            found = Some(Local {
                                node: stmt,
                                name: name_node,
                                is_parameter: false,
                            });
                        }
                    }
                }
                if found.is_some() {
                    return found;
                }
            }
            "for_statement" => {
                let vars = descendants_of_kind(scope, &["variable_declaration"])
                    .into_iter()
                    .filter(|v| {
                        v.parent().map(|p| p.id()) == Some(scope.id())
                            || v.parent().map(|p| p.kind()) == Some("multi_variable_declaration")
                    });
                for var in vars {
                    if var.end_byte() > offset {
                        continue;
                    }
                    if let Some(name_node) = named(file, var, name) {
                        return Some(Local {
                            node: var,
                            name: name_node,
                            is_parameter: false,
                        });
                    }
                }
            }
            "catch_block" => {
                if let Some(name_node) = named(file, scope, name) {
                    return Some(Local {
                        node: scope,
                        name: name_node,
                        is_parameter: true,
                    });
                }
            }
            "class_declaration" => {
                let params = child_of_kind(scope, "primary_constructor")
                    .and_then(|c| child_of_kind(c, "class_parameters"));
                for param in params.map(|p| children_of_kind(p, "class_parameter")).unwrap_or_default() {
                    let Some(name_node) = named(file, param, name) else {
                        continue;
                    };
                    let property = has_token(param, "val")
                        || has_token(param, "var")
                        || child_of_kind(param, "binding_pattern_kind").is_some();
                    return (!property).then_some(Local {
                        node: param,
                        name: name_node,
                        is_parameter: true,
                    });
                }
                return None;
            }
            "object_declaration" | "companion_object" | "source_file" => return None,
            _ => {}
        }
    }
    None
}

fn owner_name(file: &SourceFile, node: Node) -> Option<String> {
    ancestors(node)
        .find(|n| n.kind() == "function_declaration")
        .and_then(name_of)
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

/// Declared type text of a local, parameter or catch variable.
pub(super) fn local_type_text(file: &SourceFile, node: Node) -> Option<String> {
    let text = match node.kind() {
        "property_declaration" => property_type(file, node),
        _ => declared_type(file, node),
    };
    text.map(str::to_string)
}

fn local_type(ws: &Workspace, file: &Arc<SourceFile>, local: &Local) -> Option<DeclRef> {
    if let Some(text) = local_type_text(file, local.node) {
        return find_type(ws, file, &text);
    }
    if local.node.kind() != "property_declaration" {
        return None;
    }
    let mut after_eq = false;
    for child in children(local.node) {
        if child.kind() == "=" {
            after_eq = true;
        } else if after_eq && child.is_named() {
            return infer_type(ws, file, child);
        }
    }
    None
}

/// Callee of a call expression, when `node` is it.
fn call_of(node: Node) -> Option<Node> {
    let parent = node.parent()?;
    (parent.kind() == "call_expression" && parent.named_child(0).map(|c| c.id()) == Some(node.id()))
        .then_some(parent)
}

fn argument_count(call: Node) -> usize {
    named_children(call)
        .into_iter()
        .map(|child| match child.kind() {
            "value_arguments" => children_of_kind(child, "value_argument").len(),
            "annotated_lambda" | "lambda_literal" => 1,
            "call_suffix" => argument_count(child),
            _ => 0,
        })
        .sum()
}

/// Member identifier of a navigation expression, when `node` is it.
fn navigation_of(node: Node) -> Option<Node> {
    let parent = node.parent()?;
    let parent = if parent.kind() == "navigation_suffix" {
        parent.parent()?
    } else {
        parent
    };
    let is_member = parent.kind() == "navigation_expression"
        && parent.named_child(0).map(|c| c.id()) != Some(node.id());
    is_member.then_some(parent)
}

fn infer_type(ws: &Workspace, file: &Arc<SourceFile>, expr: Node) -> Option<DeclRef> {
    match expr.kind() {
        "this_expression" | "this" => ws.enclosing_types(&file.path, expr.start_byte())
            .into_iter()
            .find(|t| !ws.decl(*t).symbol.has_modifier("companion")),
        "identifier" | "simple_identifier" => {
            let name = file.node_text(expr);
            if let Some(local) = find_local(file, expr, name) {
                return local_type(ws, file, &local);
            }
            for ty in ws.enclosing_types(&file.path, expr.start_byte()) {
                if let Some(member) = ws.find_value(ty, name) {
                    return type_of_decl(ws, file, member);
                }
            }
            find_type(ws, file, name).or_else(|| {
                ws.unique(name, None, |d| d.kind().is_value())
                    .and_then(|r| type_of_decl(ws, file, r))
            })
        }
        "navigation_expression" => {
            let receiver = infer_type(ws, file, expr.named_child(0)?)?;
            let member = named_children(expr).into_iter().last()?;
            let member = if member.kind() == "navigation_suffix" {
                named_children(member).into_iter().last()?
            } else {
                member
            };
            let found = ws.find_value(receiver, file.node_text(member))?;
            type_of_decl(ws, file, found)
        }
        "call_expression" => {
            let callee = expr.named_child(0)?;
            let target = resolve_callee(ws, file, callee, argument_count(expr))?;
            type_of_decl(ws, file, target)
        }
        "parenthesized_expression" => infer_type(ws, file, expr.named_child(0)?),
        _ => None,
    }
}

/// Declaration invoked by a call whose callee expression is `callee`.
fn resolve_callee(ws: &Workspace, file: &Arc<SourceFile>, callee: Node, arity: usize) -> Option<DeclRef> {
    match callee.kind() {
        "identifier" | "simple_identifier" => {
            let name = file.node_text(callee);
            ws.enclosing_types(&file.path, callee.start_byte())
                .into_iter()
                .find_map(|ty| ws.find_callable(ty, name, Some(arity)))
                .or_else(|| ws.unique(name, Some(arity), |d| d.kind().is_callable() && d.kind() != SymbolKind::Constructor))
                .or_else(|| {
                    let ty = find_type(ws, file, name)?;
                    ws.constructor_of(ty, arity).or(Some(ty))
                })
        }
        "navigation_expression" => {
            let member = named_children(callee).into_iter().last()?;
            let name = file.node_text(member);
            match infer_type(ws, file, callee.named_child(0)?) {
                Some(ty) => ws.find_callable(ty, name, Some(arity)).or_else(|| {
                    ws.members(ty)
                        .into_iter()
                        .filter(|m| ws.decl(*m).kind() == SymbolKind::Object)
                        .find_map(|companion| ws.find_callable(companion, name, Some(arity)))
                }),
                None => ws.unique(name, Some(arity), |d| d.kind().is_callable()),
            }
        }
        _ => None,
    }
}

/// Resolve an identifier to the declaration it names.
pub(super) fn resolve(ws: &Workspace, file: &Arc<SourceFile>, node: Node) -> Option<Element> {
    if !matches!(node.kind(), "identifier" | "simple_identifier") {
        return None;
    }
    let name = file.node_text(node);
    let parent = node.parent()?;

    if ancestors(node).any(|a| matches!(a.kind(), "import" | "import_header" | "package_header")) {
        let last = parent.named_child(parent.named_child_count().saturating_sub(1));
        if last.map(|l| l.id()) != Some(node.id()) {
            return None;
        }
        return find_type(ws, file, name)
            .or_else(|| ws.unique(name, None, |d| d.parent.is_none()))
            .map(|r| ws.element(r));
    }

    let found = if parent.kind() == "user_type" {
        find_type(ws, file, name)
    } else if let Some(nav) = navigation_of(node) {
        match call_of(nav) {
            Some(call) => resolve_callee(ws, file, nav, argument_count(call)),
            None => {
                let receiver = infer_type(ws, file, nav.named_child(0)?);
                match receiver {
                    Some(ty) => ws.find_value(ty, name).or_else(|| {
                        ws.members(ty)
                            .into_iter()
                            .filter(|m| ws.decl(*m).kind() == SymbolKind::Object)
                            .find_map(|companion| ws.find_value(companion, name))
                    }),
                    None => ws.unique(name, None, |d| d.kind().is_value()),
                }
            }
        }
    } else if let Some(call) = call_of(node) {
        if let Some(local) = find_local(file, node, name) {
            return Some(local_element(file, &local));
        }
        resolve_callee(ws, file, node, argument_count(call))
    } else {
        if let Some(local) = find_local(file, node, name) {
            return Some(local_element(file, &local));
        }
        ws.enclosing_types(&file.path, node.start_byte())
            .into_iter()
            .find_map(|ty| ws.find_value(ty, name))
            .or_else(|| ws.unique(name, None, |d| d.kind().is_value() && d.parent.is_none()))
            .or_else(|| find_type(ws, file, name))
            .or_else(|| ws.unique(name, None, |d| d.kind().is_value()))
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
    if node.parent().map(|p| p.kind()) == Some("callable_reference") {
        return UsageType::Reference;
    }
    match target.kind {
        kind if kind == SymbolKind::Constructor || kind.is_type() => {
            if call_of(node).is_some() {
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
    let mut expr = navigation_of(node).unwrap_or(node);
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
        "unary_expression" if has_token(parent, "++") || has_token(parent, "--") => {
            UsageType::FieldIncrement
        }
        "assignment"
            if parent.child_by_field_name("left").map(|c| c.id()) == Some(expr.id()) =>
        {
            let operator = parent
                .child_by_field_name("operator")
                .map(|c| file.node_text(c))
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

/// Exception types listed by `@Throws(...)`.
pub(super) fn annotated_throws(file: &SourceFile, node: Node) -> Vec<String> {
    let Some(list) = child_of_kind(node, "modifiers") else {
        return Vec::new();
    };
    children_of_kind(list, "annotation")
        .into_iter()
        .filter(|a| annotation_parts(file, *a).map(|(name, _)| name == "Throws").unwrap_or(false))
        .flat_map(|a| descendants_of_kind(a, &["value_argument"]))
        .map(|arg| {
            let text = file.node_text(arg).trim();
            simple_type_name(text.trim_end_matches("::class"))
        })
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::traits::LanguageAdapter;
    use std::path::Path;

    const SOURCE: &str = r#"package com.example.model

import java.io.IOException

/**
 * A registered user.
 */
data class User(val name: String, private var age: Int, note: String) {
    fun greet(other: User): String = "hi " + other.name

    companion object {
        const val DEFAULT_NAME = "anonymous"
    }
}

interface Repository {
    fun save(user: User)
    val size: Int
}

enum class Role { ADMIN, MEMBER }

object Registry {
    @Deprecated("Use register instead")
    fun add(user: User) {}

    @Throws(IOException::class)
    fun load(path: String): User {
        val user = User(path, 1, "")
        return user
    }
}

operator fun User.plus(other: User): User = this

typealias Users = List<User>
"#;

    fn outline_of(source: &str) -> Outline {
        let adapter = super::super::JvmAdapter::new().unwrap();
        let file = Arc::new(
            adapter
                .parse(Path::new("Model.kt"), source.as_bytes().to_vec())
                .unwrap(),
        );
        outline(&file)
    }

    fn find<'a>(outline: &'a Outline, name: &str) -> &'a Decl {
        outline.decls.iter().find(|d| d.name() == name).unwrap()
    }

    #[test]
    fn test_package_and_class() {
        let outline = outline_of(SOURCE);
        assert_eq!(outline.package.as_deref(), Some("com.example.model"));
        assert_eq!(find(&outline, "java.io.IOException").kind(), SymbolKind::Import);

        let user = find(&outline, "User");
        assert_eq!(user.kind(), SymbolKind::Class);
        assert!(user.symbol.has_modifier("data"));
        assert_eq!(
            user.symbol.qualified_name.as_deref(),
            Some("com.example.model.User")
        );
        assert_eq!(
            user.symbol.documentation.summary.as_deref(),
            Some("A registered user.")
        );
    }

    #[test]
    fn test_primary_constructor_properties() {
        let outline = outline_of(SOURCE);
        let ctor = outline
            .decls
            .iter()
            .find(|d| d.kind() == SymbolKind::Constructor)
            .unwrap();
        assert_eq!(ctor.name(), "User");
        assert_eq!(ctor.param_count, Some(3));

        let name = find(&outline, "name");
        assert_eq!(name.kind(), SymbolKind::Property);
        assert_eq!(name.type_name.as_deref(), Some("String"));
        let age = find(&outline, "age");
        assert_eq!(age.symbol.visibility, Visibility::Private);
        assert!(!outline.decls.iter().any(|d| d.name() == "note"));
    }

    #[test]
    fn test_members_and_kinds() {
        let outline = outline_of(SOURCE);
        let greet = find(&outline, "greet");
        assert_eq!(greet.kind(), SymbolKind::Method);
        assert_eq!(greet.param_count, Some(1));
        assert_eq!(greet.type_name.as_deref(), Some("String"));

        assert_eq!(find(&outline, "Companion").kind(), SymbolKind::Object);
        assert_eq!(find(&outline, "DEFAULT_NAME").kind(), SymbolKind::Constant);

        let repo = find(&outline, "Repository");
        assert_eq!(repo.kind(), SymbolKind::Interface);
        assert!(find(&outline, "save").symbol.has_modifier("abstract"));

        assert_eq!(find(&outline, "Role").kind(), SymbolKind::Enum);
        assert_eq!(find(&outline, "ADMIN").kind(), SymbolKind::EnumMember);
        assert_eq!(find(&outline, "Registry").kind(), SymbolKind::Object);
        assert_eq!(find(&outline, "plus").kind(), SymbolKind::Operator);
        assert_eq!(find(&outline, "Users").kind(), SymbolKind::TypeAlias);
    }

    #[test]
    fn test_deprecation_payload() {
        let outline = outline_of(SOURCE);
        let add = find(&outline, "add");
        assert!(add.symbol.is_deprecated);
        assert_eq!(add.deprecation.as_deref(), Some("Use register instead"));
        assert!(add.symbol.decorators[0].builtin);
    }

    #[test]
    fn test_annotated_throws() {
        let adapter = super::super::JvmAdapter::new().unwrap();
        let file = adapter
            .parse(Path::new("Model.kt"), SOURCE.as_bytes().to_vec())
            .unwrap();
        let load = descendants_of_kind(file.tree.root_node(), &["function_declaration"])
            .into_iter()
            .find(|f| name_of(*f).map(|n| file.node_text(n)) == Some("load"))
            .unwrap();
        assert_eq!(annotated_throws(&file, load), vec!["IOException"]);
    }
}
