//! Confidence scoring for definition candidates.
//!
//! Every adapter ranks name lookups with the same table; languages differ
//! only in which symbol kinds count as types or members.

use super::model::{DefinitionLocation, SymbolKind, Visibility};

/// Exact name match on a project type.
pub const EXACT_TYPE: f64 = 1.0;
/// Exact name match on a project member.
pub const EXACT_MEMBER: f64 = 0.95;
/// Exact name match in library/dependency code.
pub const LIBRARY: f64 = 0.5;
pub const CASE_INSENSITIVE: f64 = 0.7;
pub const PARTIAL: f64 = 0.3;
/// Anything else still worth listing.
pub const OTHER: f64 = 0.1;

/// A reference resolved through scope resolution.
pub const RESOLVED: f64 = 1.0;
/// Unresolved position mapped to its nearest enclosing declaration.
pub const NEAREST_DECLARATION: f64 = 0.9;

/// Shortest query for which substring matches are attempted.
pub const MIN_PARTIAL_QUERY: usize = 3;

/// A parsed `findDefinitionByName` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    /// `User` in `User.getId`.
    pub qualifier: Option<String>,
    pub member: String,
}

impl NameQuery {
    /// Parse `Name`, `Qualifier.member` or a longer dotted path (last two
    /// segments are kept). Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().trim_end_matches("()");
        let segments: Vec<&str> = input
            .split(|c| c == '.' || c == '#')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            [] => None,
            [member] => Some(Self {
                qualifier: None,
                member: member.to_string(),
            }),
            [.., qualifier, member] => Some(Self {
                qualifier: Some(qualifier.to_string()),
                member: member.to_string(),
            }),
        }
    }
}

/// How a candidate name relates to the queried name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    CaseInsensitive,
    Partial,
    None,
}

pub fn match_name(candidate: &str, query: &str) -> NameMatch {
    if candidate == query {
        NameMatch::Exact
    } else if candidate.eq_ignore_ascii_case(query) {
        NameMatch::CaseInsensitive
    } else if query.chars().count() >= MIN_PARTIAL_QUERY
        && candidate.to_lowercase().contains(&query.to_lowercase())
    {
        NameMatch::Partial
    } else {
        NameMatch::None
    }
}

/// What is known about one candidate declaration.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
    /// Name of the declaring type, when the candidate is a member.
    pub container: Option<&'a str>,
    pub is_library: bool,
}

/// Score a candidate against a query; `None` means "not a candidate".
pub fn score(candidate: &Candidate, query: &NameQuery) -> Option<f64> {
    let name_match = match_name(candidate.name, &query.member);

    if let Some(qualifier) = &query.qualifier {
        let container_match = candidate
            .container
            .map(|c| match_name(c, qualifier))
            .unwrap_or(NameMatch::None);
        return match (name_match, container_match) {
            (NameMatch::Exact, NameMatch::Exact) if candidate.is_library => Some(LIBRARY),
            (NameMatch::Exact, NameMatch::Exact) => Some(EXACT_TYPE),
            (NameMatch::Exact, NameMatch::CaseInsensitive)
            | (NameMatch::CaseInsensitive, NameMatch::Exact | NameMatch::CaseInsensitive) => {
                Some(CASE_INSENSITIVE)
            }
            (NameMatch::Partial, NameMatch::Exact | NameMatch::CaseInsensitive) => Some(PARTIAL),
            (NameMatch::Exact, _) => Some(OTHER),
            _ => None,
        };
    }

    match name_match {
        NameMatch::Exact if candidate.is_library => Some(LIBRARY),
        NameMatch::Exact if candidate.kind.is_type() => Some(EXACT_TYPE),
        NameMatch::Exact => Some(EXACT_MEMBER),
        NameMatch::CaseInsensitive => Some(CASE_INSENSITIVE),
        NameMatch::Partial => Some(PARTIAL),
        NameMatch::None => None,
    }
}

/// Sort descending by confidence, keeping discovery order for ties, then cap.
pub fn rank(mut candidates: Vec<DefinitionLocation>, max: usize) -> Vec<DefinitionLocation> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(max);
    candidates
}

/// Context needed to phrase a disambiguation hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintContext<'a> {
    /// Declaring type, if the declaration is a member.
    pub declaring_type: Option<&'a str>,
    /// Enclosing function, for locals and parameters.
    pub owner_function: Option<&'a str>,
    /// Package or module of the file.
    pub module: Option<&'a str>,
    pub is_static: bool,
    pub is_local: bool,
    pub is_parameter: bool,
}

/// Short phrase telling same-named candidates apart.
pub fn disambiguation_hint(kind: SymbolKind, ctx: &HintContext) -> String {
    let module = ctx.module.unwrap_or("default package");
    if ctx.is_parameter {
        return format!("Parameter of {}", ctx.owner_function.unwrap_or("lambda"));
    }
    if ctx.is_local {
        return format!("Local variable in {}", ctx.owner_function.unwrap_or(module));
    }

    match (kind, ctx.declaring_type) {
        (SymbolKind::Class, _) => format!("Class in {}", module),
        (SymbolKind::Interface, _) => format!("Interface in {}", module),
        (SymbolKind::Enum, _) => format!("Enum in {}", module),
        (SymbolKind::Struct, _) => format!("Struct in {}", module),
        (SymbolKind::Object, _) => format!("Object in {}", module),
        (SymbolKind::TypeAlias, _) => format!("Type alias in {}", module),
        (SymbolKind::Constructor, Some(ty)) => format!("Constructor of {}", ty),
        (SymbolKind::EnumMember, Some(ty)) => format!("Enum member of {}", ty),
        (SymbolKind::Constant, Some(ty)) => format!("Constant in {}", ty),
        (SymbolKind::Constant, None) => format!("Constant in module {}", module),
        (SymbolKind::Field, Some(ty)) if ctx.is_static => format!("Static field in {}", ty),
        (SymbolKind::Field, Some(ty)) => format!("Field in {}", ty),
        (SymbolKind::Property, Some(ty)) => format!("Property in {}", ty),
        (SymbolKind::Variable, Some(ty)) => format!("Field in {}", ty),
        (SymbolKind::Variable, None) => format!("Variable in module {}", module),
        (SymbolKind::Component, None) => format!("Component in module {}", module),
        (SymbolKind::Hook, None) => format!("Hook in module {}", module),
        (SymbolKind::Import, _) => format!("Import in {}", module),
        (kind, Some(ty)) if kind.is_callable() && ctx.is_static => {
            format!("Static method in {}", ty)
        }
        (kind, Some(ty)) if kind.is_callable() => format!("Method in {}", ty),
        (kind, None) if kind.is_callable() => format!("Function in module {}", module),
        (kind, Some(ty)) => format!("{} in {}", capitalize(kind.as_str()), ty),
        (kind, None) => format!("{} in {}", capitalize(kind.as_str()), module),
    }
}

/// Warning for candidates the caller may not be able to reach.
pub fn accessibility_warning(visibility: Visibility, ctx: &HintContext) -> Option<String> {
    match visibility {
        Visibility::Private => Some(match ctx.declaring_type {
            Some(ty) => format!("Private member - only accessible within {}", ty),
            None => "Private - only accessible within its module".to_string(),
        }),
        Visibility::Protected => {
            Some("Protected member - accessible from subclasses only".to_string())
        }
        Visibility::PackagePrivate => Some(match ctx.module {
            Some(module) => format!("Package-private - only accessible within {}", module),
            None => "Package-private - only accessible within its package".to_string(),
        }),
        Visibility::Public | Visibility::Unknown => None,
    }
}

fn capitalize(text: &str) -> String {
    let text = text.replace('_', " ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::Location;

    fn candidate<'a>(name: &'a str, kind: SymbolKind, container: Option<&'a str>) -> Candidate<'a> {
        Candidate {
            name,
            kind,
            container,
            is_library: false,
        }
    }

    fn query(input: &str) -> NameQuery {
        NameQuery::parse(input).unwrap()
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(query("User").qualifier, None);
        let q = query("User.getId");
        assert_eq!(q.qualifier.as_deref(), Some("User"));
        assert_eq!(q.member, "getId");
        let q = query("com.example.User.getId()");
        assert_eq!(q.qualifier.as_deref(), Some("User"));
        assert_eq!(q.member, "getId");
        assert!(NameQuery::parse("  ").is_none());
    }

    #[test]
    fn test_confidence_table() {
        let q = query("User");
        assert_eq!(score(&candidate("User", SymbolKind::Class, None), &q), Some(1.0));
        assert_eq!(
            score(&candidate("User", SymbolKind::Method, Some("Factory")), &q),
            Some(0.95)
        );
        assert_eq!(score(&candidate("user", SymbolKind::Field, Some("A")), &q), Some(0.7));
        assert_eq!(score(&candidate("UserService", SymbolKind::Class, None), &q), Some(0.3));
        assert_eq!(score(&candidate("Role", SymbolKind::Enum, None), &q), None);

        let mut lib = candidate("User", SymbolKind::Class, None);
        lib.is_library = true;
        assert_eq!(score(&lib, &q), Some(0.5));
    }

    #[test]
    fn test_partial_needs_three_characters() {
        assert_eq!(match_name("getId", "Id"), NameMatch::None);
        assert_eq!(match_name("getUserId", "user"), NameMatch::Partial);
    }

    #[test]
    fn test_qualified_scores() {
        let q = query("User.getId");
        assert_eq!(
            score(&candidate("getId", SymbolKind::Method, Some("User")), &q),
            Some(1.0)
        );
        assert_eq!(
            score(&candidate("getId", SymbolKind::Method, Some("Order")), &q),
            Some(0.1)
        );
        assert_eq!(
            score(&candidate("getName", SymbolKind::Method, Some("User")), &q),
            None
        );
    }

    #[test]
    fn test_rank_is_stable_and_descending() {
        let def = |name: &str, confidence: f64| DefinitionLocation {
            name: name.to_string(),
            qualified_name: None,
            kind: SymbolKind::Method,
            file_path: "A.java".to_string(),
            location: Location {
                start_offset: 0,
                end_offset: 1,
                line_number: 1,
            },
            visibility: Visibility::Public,
            confidence,
            disambiguation_hint: String::new(),
            is_test_code: false,
            is_library_code: false,
            accessibility_warning: None,
        };
        let ranked = rank(
            vec![def("a", 0.3), def("b", 0.95), def("c", 0.3), def("d", 1.0)],
            3,
        );
        let names: Vec<_> = ranked.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["d", "b", "a"]);
    }

    #[test]
    fn test_hints() {
        let ctx = HintContext {
            declaring_type: Some("User"),
            ..HintContext::default()
        };
        assert_eq!(disambiguation_hint(SymbolKind::Method, &ctx), "Method in User");
        let static_ctx = HintContext {
            is_static: true,
            ..ctx
        };
        assert_eq!(
            disambiguation_hint(SymbolKind::Method, &static_ctx),
            "Static method in User"
        );
        assert_eq!(
            disambiguation_hint(SymbolKind::Constructor, &ctx),
            "Constructor of User"
        );

        let module_ctx = HintContext {
            module: Some("app.models"),
            ..HintContext::default()
        };
        assert_eq!(
            disambiguation_hint(SymbolKind::Function, &module_ctx),
            "Function in module app.models"
        );
        assert_eq!(
            disambiguation_hint(SymbolKind::Class, &module_ctx),
            "Class in app.models"
        );
    }

    #[test]
    fn test_accessibility_warning() {
        let ctx = HintContext {
            declaring_type: Some("UserService"),
            ..HintContext::default()
        };
        let warning = accessibility_warning(Visibility::Private, &ctx).unwrap();
        assert!(warning.contains("UserService"));
        assert!(accessibility_warning(Visibility::Public, &ctx).is_none());
    }
}
