//! Shared hover synthesis helpers.
//!
//! Adapters dispatch on the declaration kind and call into these helpers
//! for the computations every language shares: complexity, usage counts,
//! documentation tags and deprecation.

use lazy_static::lazy_static;
use regex::Regex;
use tree_sitter::Node;

use super::model::HoverInfo;
use super::navigation::{self, visit};
use super::outline::Element;
use super::project::Project;
use super::references::{self, overriding_decls, ReferenceQuery};
use super::source::SourceFile;
use super::traits::Resolver;
use super::workspace::{DeclRef, Workspace};

/// Usage counts stop here; larger counts report exactly this value.
pub const USAGE_COUNT_CAP: usize = 100;

lazy_static! {
    static ref DOC_OPEN: Regex = Regex::new(r"^\s*/\*\*?").unwrap();
    static ref DOC_CLOSE: Regex = Regex::new(r"\*/\s*$").unwrap();
    static ref DOC_LINE_PREFIX: Regex = Regex::new(r"^\s*(\*|///?|#)\s?").unwrap();
    static ref TAG_LINE: Regex = Regex::new(r"^@(\w+)\s*(.*)$").unwrap();
    static ref INLINE_TAG: Regex = Regex::new(r"\{@(?:link|linkplain|code)\s+([^}]*)\}").unwrap();
    static ref SECTION_HEADER: Regex = Regex::new(r"^[A-Z][A-Za-z ]*:\s*$").unwrap();
    static ref DEPRECATED_WORD: Regex = Regex::new(r"(?i)\bdeprecated\b").unwrap();
}

/// Control flow information for cyclomatic complexity calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFlowInfo {
    /// Number of if statements.
    pub if_count: u32,
    /// Number of for/while/do loops.
    pub loop_count: u32,
    /// Number of ternary/conditional expressions.
    pub ternary_count: u32,
    /// Number of && / and operators.
    pub and_count: u32,
    /// Number of || / or operators.
    pub or_count: u32,
}

impl ControlFlowInfo {
    /// Calculate cyclomatic complexity.
    ///
    /// CC = 1 + decision_points
    /// Decision points: if, for, while, ?:, &&, ||
    pub fn cyclomatic_complexity(&self) -> u32 {
        1 + self.if_count + self.loop_count + self.ternary_count + self.and_count + self.or_count
    }
}

/// Grammar node kinds that count as decision points.
#[derive(Debug, Clone, Copy)]
pub struct BranchKinds {
    pub ifs: &'static [&'static str],
    pub loops: &'static [&'static str],
    pub ternaries: &'static [&'static str],
    /// Binary expression kinds whose `operator` may be `&&`/`||`/`and`/`or`.
    pub binaries: &'static [&'static str],
    /// Node kinds that are always a conjunction.
    pub conjunctions: &'static [&'static str],
    /// Node kinds that are always a disjunction.
    pub disjunctions: &'static [&'static str],
}

/// Count decision points over a full traversal of `body`.
pub fn control_flow(file: &SourceFile, body: Node, kinds: &BranchKinds) -> ControlFlowInfo {
    let mut info = ControlFlowInfo::default();
    visit(body, |node| {
        let kind = node.kind();
        if kinds.ifs.contains(&kind) {
            info.if_count += 1;
        } else if kinds.loops.contains(&kind) {
            info.loop_count += 1;
        } else if kinds.ternaries.contains(&kind) {
            info.ternary_count += 1;
        } else if kinds.conjunctions.contains(&kind) {
            info.and_count += 1;
        } else if kinds.disjunctions.contains(&kind) {
            info.or_count += 1;
        } else if kinds.binaries.contains(&kind) {
            let operator = node
                .child_by_field_name("operator")
                .map(|op| file.node_text(op))
                .unwrap_or("");
            match operator {
                "&&" | "and" => info.and_count += 1,
                "||" | "or" => info.or_count += 1,
                _ => {}
            }
        }
        true
    });
    info
}

/// Documentation block with comment markers removed.
pub fn normalize_doc(raw: &str) -> String {
    let text = raw.trim();
    let text = text
        .strip_prefix("\"\"\"")
        .or_else(|| text.strip_prefix("'''"))
        .map(|t| {
            t.trim_end()
                .trim_end_matches("\"\"\"")
                .trim_end_matches("'''")
        })
        .unwrap_or(text);
    let text = DOC_OPEN.replace(text, "");
    let text = DOC_CLOSE.replace(&text, "");

    let lines: Vec<String> = text
        .lines()
        .map(|line| DOC_LINE_PREFIX.replace(line, "").trim_end().to_string())
        .collect();
    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let lines: Vec<String> = lines
        .into_iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.trim().to_string()
            } else {
                l.chars().skip(common_indent).collect()
            }
        })
        .collect();

    INLINE_TAG
        .replace_all(lines.join("\n").trim(), "$1")
        .to_string()
}

/// First paragraph of a normalized doc, whitespace collapsed.
pub fn doc_summary(normalized: &str) -> Option<String> {
    let paragraph: Vec<&str> = normalized
        .lines()
        .map(str::trim)
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty() && !l.starts_with('@') && !SECTION_HEADER.is_match(l))
        .collect();
    let summary = navigation::collapse_whitespace(&paragraph.join(" "));
    (!summary.is_empty()).then_some(summary)
}

/// Tags parsed from a normalized doc block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTags {
    pub since: Option<String>,
    pub see_also: Vec<String>,
    pub throws: Vec<String>,
    pub deprecated: Option<String>,
}

/// Parse Javadoc/KDoc/JSDoc tags and a docstring `Raises:` section.
pub fn parse_doc_tags(normalized: &str) -> DocTags {
    let mut tags = DocTags::default();
    let mut in_raises = false;

    for line in normalized.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            in_raises = false;
            continue;
        }
        if SECTION_HEADER.is_match(trimmed) {
            in_raises = trimmed.trim_end_matches(':').trim() == "Raises";
            continue;
        }
        if in_raises {
            if let Some(name) = trimmed.split(|c: char| c == ':' || c.is_whitespace()).next() {
                if !name.is_empty() {
                    tags.throws.push(name.to_string());
                }
            }
            continue;
        }
        let Some(caps) = TAG_LINE.captures(trimmed) else {
            continue;
        };
        let value = caps[2].trim().to_string();
        match &caps[1] {
            "since" if !value.is_empty() => tags.since = Some(value),
            "see" if !value.is_empty() => tags.see_also.push(value),
            "throws" | "exception" | "raises" => {
                if let Some(name) = value
                    .trim_start_matches('{')
                    .split(|c: char| c == '}' || c.is_whitespace())
                    .next()
                    .filter(|n| !n.is_empty())
                {
                    tags.throws.push(name.to_string());
                }
            }
            "deprecated" => tags.deprecated = Some(value),
            _ => {}
        }
    }
    tags
}

/// Returns `true` if the doc text mentions deprecation.
pub fn doc_mentions_deprecation(normalized: &str) -> bool {
    DEPRECATED_WORD.is_match(normalized)
}

/// Deprecation message: the explicit marker's payload wins, then the doc
/// line mentioning deprecation, then a bare "Deprecated" for a marker
/// without payload.
pub fn deprecation_message(
    marker_payload: Option<&str>,
    marked: bool,
    normalized_doc: Option<&str>,
) -> Option<String> {
    if let Some(payload) = marker_payload.map(str::trim).filter(|p| !p.is_empty()) {
        return Some(payload.to_string());
    }
    let doc_line = normalized_doc.and_then(|doc| {
        doc.lines()
            .map(str::trim)
            .find(|l| DEPRECATED_WORD.is_match(l))
            .map(str::to_string)
    });
    match doc_line {
        Some(line) => Some(line),
        None if marked => Some("Deprecated".to_string()),
        None => None,
    }
}

/// Hover record for an outline declaration with the fields every language
/// fills the same way. Adapters add relationships and language details.
pub fn from_decl(ws: &Workspace, r: DeclRef, element_type: &str) -> HoverInfo {
    let decl = ws.decl(r);
    let outline = ws.outline(r.outline);
    let mut hover = HoverInfo::new(decl.name(), element_type);

    hover.type_name = decl.type_name.clone();
    hover.signature = decl.symbol.signature.clone();
    if let Some(signature) = &decl.symbol.signature {
        hover.presentable_text = signature.clone();
    }
    hover.modifiers = decl.symbol.modifiers.iter().cloned().collect();
    hover.module = outline.package.clone();

    let doc = decl.doc.as_deref().map(normalize_doc);
    if let Some(doc) = &doc {
        let tags = parse_doc_tags(doc);
        hover.since = tags.since;
        hover.see_also = tags.see_also;
        hover.throws_exceptions = tags.throws;
    }

    let marked = decl.symbol.is_deprecated;
    let doc_flag = doc.as_deref().map(doc_mentions_deprecation).unwrap_or(false);
    hover.is_deprecated = marked || doc_flag;
    if hover.is_deprecated {
        hover.deprecation_message =
            deprecation_message(decl.deprecation.as_deref(), marked, doc.as_deref());
    }
    hover.java_doc = doc.filter(|d| !d.is_empty());
    hover
}

/// Add exception names not already listed.
pub fn merge_throws(hover: &mut HoverInfo, names: impl IntoIterator<Item = String>) {
    for name in names {
        if !hover.throws_exceptions.contains(&name) {
            hover.throws_exceptions.push(name);
        }
    }
}

/// Names of workspace types extending or implementing the type.
pub fn implemented_by(ws: &Workspace, ty: DeclRef) -> Vec<String> {
    ws.subtype_names(ty)
}

/// `Type.method` for every declaration overriding the method.
pub fn overridden_by(ws: &Workspace, method: DeclRef) -> Vec<String> {
    overriding_decls(ws, method)
        .into_iter()
        .map(|(o, index)| {
            let outline = ws.outline(o);
            let decl = &outline.decls[index];
            match outline.container_name(index) {
                Some(ty) => format!("{}.{}", ty, decl.name()),
                None => decl.name().to_string(),
            }
        })
        .collect()
}

/// Number of usages of `element`, capped at [`USAGE_COUNT_CAP`].
pub fn usage_count(project: &Project, resolver: &dyn Resolver, element: &Element) -> usize {
    let query = ReferenceQuery::by_name(element.name.clone()).max_results(Some(USAGE_COUNT_CAP));
    references::collect(project, resolver, element, &query)
        .len()
        .min(USAGE_COUNT_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_javadoc() {
        let raw = "/**\n     * Adds a user.\n     * <p>Thread safe.\n     *\n     * @param user the user\n     * @since 2.0\n     */";
        let doc = normalize_doc(raw);
        assert!(doc.starts_with("Adds a user."));
        assert!(doc.contains("@since 2.0"));
        assert!(!doc.contains("*/"));
        assert_eq!(doc_summary(&doc).as_deref(), Some("Adds a user. <p>Thread safe."));
    }

    #[test]
    fn test_normalize_docstring() {
        let raw = "\"\"\"Validate the email.\n\n        Raises:\n            ValueError: when malformed\n        \"\"\"";
        let doc = normalize_doc(raw);
        assert_eq!(doc_summary(&doc).as_deref(), Some("Validate the email."));
        let tags = parse_doc_tags(&doc);
        assert_eq!(tags.throws, vec!["ValueError"]);
    }

    #[test]
    fn test_parse_tags() {
        let doc = "Finds users.\n@since 1.2\n@see UserRepository\n@throws IllegalStateException if closed\n@exception {IOException} on failure\n@deprecated use findAll";
        let tags = parse_doc_tags(doc);
        assert_eq!(tags.since.as_deref(), Some("1.2"));
        assert_eq!(tags.see_also, vec!["UserRepository"]);
        assert_eq!(tags.throws, vec!["IllegalStateException", "IOException"]);
        assert_eq!(tags.deprecated.as_deref(), Some("use findAll"));
    }

    #[test]
    fn test_deprecation_message_precedence() {
        let doc = "Maximum users.\n@deprecated Use MAX_CAPACITY instead";
        assert_eq!(
            deprecation_message(Some("since 3.0"), true, Some(doc)).as_deref(),
            Some("since 3.0")
        );
        assert_eq!(
            deprecation_message(None, true, Some(doc)).as_deref(),
            Some("@deprecated Use MAX_CAPACITY instead")
        );
        assert_eq!(
            deprecation_message(None, true, None).as_deref(),
            Some("Deprecated")
        );
        assert_eq!(deprecation_message(None, false, Some("Plain.")), None);
    }

    #[test]
    fn test_complexity_counts_branches_and_operators() {
        let source = "class A { int f(int a, int b) { if (a > 0 && b > 0) { return 1; } for (int i = 0; i < a; i++) { b = a > b ? a : b; } while (b > 0 || a > 0) { b--; } return b; } }";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        let file = SourceFile::new(
            tree,
            source.as_bytes().to_vec(),
            std::path::Path::new("A.java"),
            "JAVA",
        );
        let kinds = BranchKinds {
            ifs: &["if_statement"],
            loops: &["for_statement", "while_statement"],
            ternaries: &["ternary_expression"],
            binaries: &["binary_expression"],
            conjunctions: &[],
            disjunctions: &[],
        };
        let info = control_flow(&file, file.tree.root_node(), &kinds);
        assert_eq!(info.if_count, 1);
        assert_eq!(info.loop_count, 2);
        assert_eq!(info.ternary_count, 1);
        assert_eq!(info.and_count, 1);
        assert_eq!(info.or_count, 1);
        assert_eq!(info.cyclomatic_complexity(), 7);
    }
}
