//! JVM language family: Java and Kotlin behind one adapter.

mod java;
mod kotlin;

use std::path::Path;
use std::sync::Arc;

use tree_sitter::{Language, Node, Parser};

use crate::analysis::backend::Backend;
use crate::analysis::hover::{self, BranchKinds};
use crate::analysis::model::{HoverInfo, SymbolKind, UsageType};
use crate::analysis::navigation::{child_of_kind, simple_type_name};
use crate::analysis::outline::{Decl, Element, Outline};
use crate::analysis::project::Project;
use crate::analysis::scan::IdentifierScan;
use crate::analysis::source::SourceFile;
use crate::analysis::traits::{LanguageAdapter, Resolver};
use crate::analysis::workspace::{DeclRef, Workspace};

pub(crate) const ALIASES: &[&str] = &["JAVA", "kotlin", "Kotlin"];
pub(crate) const EXTENSIONS: &[&str] = &["java", "kt", "kts"];

const JAVA: &str = "JAVA";
const KOTLIN: &str = "Kotlin";

const SUPPORTED_KINDS: &[SymbolKind] = &[
    SymbolKind::Class,
    SymbolKind::Interface,
    SymbolKind::Enum,
    SymbolKind::Object,
    SymbolKind::TypeAlias,
    SymbolKind::Field,
    SymbolKind::Constant,
    SymbolKind::Property,
    SymbolKind::EnumMember,
    SymbolKind::Method,
    SymbolKind::Constructor,
    SymbolKind::Function,
    SymbolKind::Operator,
    SymbolKind::Import,
];

/// Annotations that mark test code.
const TEST_ANNOTATIONS: &[&str] = &["Test", "ParameterizedTest", "RepeatedTest", "TestFactory"];

pub struct JvmAdapter {
    java: Language,
    kotlin: Language,
    java_ids: IdentifierScan,
    kotlin_ids: IdentifierScan,
}

impl JvmAdapter {
    pub fn new() -> anyhow::Result<Self> {
        let java: Language = tree_sitter_java::LANGUAGE.into();
        let kotlin: Language = tree_sitter_kotlin_ng::LANGUAGE.into();
        let java_ids = IdentifierScan::new(&java, "[(identifier) (type_identifier)] @name")?;
        let kotlin_ids = IdentifierScan::new(&kotlin, "(identifier) @name")?;
        Ok(Self {
            java,
            kotlin,
            java_ids,
            kotlin_ids,
        })
    }

    fn create_parser(&self, language: &Language) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(parser)
    }
}

fn is_kotlin(file: &SourceFile) -> bool {
    file.language == KOTLIN
}

impl LanguageAdapter for JvmAdapter {
    fn id(&self) -> &'static str {
        "jvm"
    }

    fn display_names(&self) -> &'static [&'static str] {
        &["Java", "Kotlin"]
    }

    fn aliases(&self) -> &'static [&'static str] {
        ALIASES
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        EXTENSIONS
    }

    fn language_for_extension(&self, ext: &str) -> Option<&'static str> {
        match ext {
            "java" => Some(JAVA),
            "kt" | "kts" => Some(KOTLIN),
            _ => None,
        }
    }

    fn parse(&self, path: &Path, source: Vec<u8>) -> anyhow::Result<SourceFile> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = self
            .language_for_extension(ext)
            .ok_or_else(|| anyhow::anyhow!("not a JVM source file: {}", path.display()))?;
        let grammar = if language == KOTLIN {
            &self.kotlin
        } else {
            &self.java
        };
        let mut parser = self.create_parser(grammar)?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse {}", path.display()))?;
        Ok(SourceFile::new(tree, source, path, language))
    }

    fn outline(&self, file: &Arc<SourceFile>) -> anyhow::Result<Outline> {
        if is_kotlin(file) {
            Ok(kotlin::outline(file))
        } else {
            Ok(java::outline(file))
        }
    }
}

impl Backend for JvmAdapter {
    type Resolver<'w> = JvmResolver<'w>;

    fn resolver<'w>(&'w self, ws: &'w Workspace) -> JvmResolver<'w> {
        JvmResolver { adapter: self, ws }
    }

    fn symbol_kinds(&self) -> &'static [SymbolKind] {
        SUPPORTED_KINDS
    }

    fn hover(
        &self,
        project: &Project,
        resolver: &JvmResolver<'_>,
        element: &Element,
    ) -> anyhow::Result<Option<HoverInfo>> {
        let ws = resolver.ws;
        let Some(r) = ws.ref_for(element) else {
            return Ok(Some(local_hover(project, resolver, element)));
        };
        let kind = ws.decl(r).kind();
        let info = if kind.is_type() {
            type_hover(ws, r)
        } else if kind.is_callable() {
            callable_hover(project, resolver, r)
        } else if kind.is_value() {
            value_hover(project, resolver, r)
        } else {
            hover::from_decl(ws, r, kind.as_str())
        };
        Ok(Some(info))
    }
}

/// Scope resolution over one request's JVM workspace.
pub struct JvmResolver<'w> {
    adapter: &'w JvmAdapter,
    ws: &'w Workspace,
}

impl Resolver for JvmResolver<'_> {
    fn workspace(&self) -> &Workspace {
        self.ws
    }

    fn resolve(&self, file: &Arc<SourceFile>, node: Node<'_>) -> Option<Element> {
        if is_kotlin(file) {
            kotlin::resolve(self.ws, file, node)
        } else {
            java::resolve(self.ws, file, node)
        }
    }

    fn usage_nodes<'t>(&self, file: &'t SourceFile, name: &str) -> Vec<Node<'t>> {
        if is_kotlin(file) {
            self.adapter.kotlin_ids.matching(file, name)
        } else {
            self.adapter.java_ids.matching(file, name)
        }
    }

    fn classify(&self, file: &SourceFile, node: Node<'_>, target: &Element) -> UsageType {
        let decl = self.ws.ref_for(target).map(|r| self.ws.decl(r));
        if is_kotlin(file) {
            kotlin::classify(file, node, target, decl)
        } else {
            java::classify(file, node, target, decl)
        }
    }

    fn data_flow_context(&self, file: &SourceFile, node: Node<'_>) -> Option<String> {
        if is_kotlin(file) {
            kotlin::data_flow_context(file, node)
        } else {
            java::data_flow_context(file, node)
        }
    }

    fn is_test_decl(&self, decl: &Decl) -> bool {
        let annotated = decl
            .symbol
            .decorators
            .iter()
            .any(|d| TEST_ANNOTATIONS.contains(&d.name.as_str()));
        annotated
            || (decl.kind().is_type()
                && (decl.name().ends_with("Test") || decl.name().ends_with("Tests")))
    }
}

/// Call flavour from the callee's name, arity and staticness.
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

/// `getName`, `isActive`: prefix followed by an uppercase letter.
fn is_accessor(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

/// Preferred declaration among same-named types: same file, then same
/// package, then an import naming it, then the first found.
fn pick_type(ws: &Workspace, file: &SourceFile, candidates: Vec<DeclRef>) -> Option<DeclRef> {
    if candidates.len() <= 1 {
        return candidates.first().copied();
    }
    let here = ws.outline_index(&file.path);
    if let Some(r) = candidates.iter().find(|r| Some(r.outline) == here) {
        return Some(*r);
    }
    let package = here.and_then(|o| ws.outline(o).package.clone());
    if let Some(r) = candidates
        .iter()
        .find(|r| package.is_some() && ws.outline(r.outline).package == package)
    {
        return Some(*r);
    }
    if let Some(o) = here {
        let imports: Vec<&str> = ws
            .outline(o)
            .decls
            .iter()
            .filter(|d| d.kind() == SymbolKind::Import)
            .map(|d| d.name())
            .collect();
        if let Some(r) = candidates.iter().find(|r| {
            let decl = ws.decl(**r);
            let qualified = decl.symbol.qualified_name.as_deref().unwrap_or(decl.name());
            imports.contains(&qualified)
        }) {
            return Some(*r);
        }
    }
    candidates.first().copied()
}

/// Workspace type named by `name`; generics, arrays and nullability are ignored.
fn find_type(ws: &Workspace, file: &SourceFile, name: &str) -> Option<DeclRef> {
    pick_type(ws, file, ws.types_named(&simple_type_name(name)))
}

/// Workspace type named by a declared type string.
fn type_of_decl(ws: &Workspace, file: &SourceFile, r: DeclRef) -> Option<DeclRef> {
    let decl = ws.decl(r);
    if decl.kind().is_type() {
        return Some(r);
    }
    let type_name = decl.type_name.as_deref()?;
    find_type(ws, file, type_name)
}

fn branch_kinds(file: &SourceFile) -> &'static BranchKinds {
    if is_kotlin(file) {
        &kotlin::BRANCHES
    } else {
        &java::BRANCHES
    }
}

fn type_hover(ws: &Workspace, r: DeclRef) -> HoverInfo {
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Interface => "interface",
        SymbolKind::Enum => "enum",
        SymbolKind::Object => "object",
        SymbolKind::TypeAlias => "type alias",
        _ if decl.node_kind == "record_declaration" => "record",
        _ if decl.symbol.has_modifier("data") => "data class",
        _ if decl.symbol.has_modifier("abstract") => "abstract class",
        _ => "class",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    info.type_name = decl
        .symbol
        .qualified_name
        .clone()
        .or_else(|| Some(decl.name().to_string()));
    info.super_types = decl.super_types.clone();
    info.implemented_by = hover::implemented_by(ws, r);
    info
}

fn callable_hover(project: &Project, resolver: &JvmResolver<'_>, r: DeclRef) -> HoverInfo {
    let ws = resolver.ws;
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Constructor => "constructor",
        SymbolKind::Function => "function",
        SymbolKind::Operator => "operator",
        _ if decl.is_static() => "static method",
        _ if decl.symbol.has_modifier("abstract") => "abstract method",
        _ => "method",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    let element = ws.element(r);
    let file = &ws.outline(r.outline).file;

    if let Some(node) = element.node() {
        let body = node
            .child_by_field_name("body")
            .or_else(|| child_of_kind(node, "function_body"));
        if let Some(body) = body {
            let flow = hover::control_flow(file, body, branch_kinds(file));
            info.complexity = Some(flow.cyclomatic_complexity());
        }
        let thrown = if is_kotlin(file) {
            kotlin::annotated_throws(file, node)
        } else {
            java::declared_throws(file, node)
        };
        hover::merge_throws(&mut info, thrown);
    }

    info.overridden_by = hover::overridden_by(ws, r);
    info.called_by_count = hover::usage_count(project, resolver, &element);
    info
}

fn value_hover(project: &Project, resolver: &JvmResolver<'_>, r: DeclRef) -> HoverInfo {
    let ws = resolver.ws;
    let decl = ws.decl(r);
    let element_type = match decl.kind() {
        SymbolKind::Constant => "constant",
        SymbolKind::EnumMember => "enum constant",
        SymbolKind::Property => "property",
        _ if decl.is_static() => "static field",
        _ => "field",
    };
    let mut info = hover::from_decl(ws, r, element_type);
    info.called_by_count = hover::usage_count(project, resolver, &ws.element(r));
    info
}

fn local_hover(project: &Project, resolver: &JvmResolver<'_>, element: &Element) -> HoverInfo {
    let element_type = if element.is_parameter {
        "parameter"
    } else {
        "local variable"
    };
    let mut info = HoverInfo::new(element.name.clone(), element_type);
    let file = &element.file;
    info.type_name = element.node().and_then(|node| {
        if is_kotlin(file) {
            kotlin::local_type_text(file, node)
        } else {
            java::local_type_text(file, node)
        }
    });
    info.presentable_text = match &info.type_name {
        Some(ty) if is_kotlin(file) => format!("{}: {}", element.name, ty),
        Some(ty) => format!("{} {}", ty, element.name),
        None => element.name.clone(),
    };
    info.module = resolver
        .ws
        .outline_for(&file.path)
        .and_then(|o| o.package.clone());
    info.called_by_count = hover::usage_count(project, resolver, element);
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_usage_flavours() {
        assert_eq!(call_usage(None, "getName"), UsageType::GetterCall);
        assert_eq!(call_usage(None, "isActive"), UsageType::GetterCall);
        assert_eq!(call_usage(None, "setName"), UsageType::SetterCall);
        assert_eq!(call_usage(None, "settle"), UsageType::MethodCall);
        assert_eq!(call_usage(None, "get"), UsageType::MethodCall);
    }

    #[test]
    fn test_parse_picks_dialect_by_extension() {
        let adapter = JvmAdapter::new().unwrap();
        let java = adapter
            .parse(Path::new("A.java"), b"class A {}".to_vec())
            .unwrap();
        assert_eq!(java.language, "JAVA");
        let kotlin = adapter
            .parse(Path::new("A.kt"), b"class A".to_vec())
            .unwrap();
        assert_eq!(kotlin.language, "Kotlin");
        assert!(adapter
            .parse(Path::new("A.scala"), b"class A".to_vec())
            .is_err());
    }
}
