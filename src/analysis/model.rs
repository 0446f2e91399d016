//! Canonical records every language adapter populates.
//!
//! These are the JSON-serializable views returned to callers. They are built
//! fresh for every request and never mutated after being returned.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of declaration. The vocabulary is shared; adapters use the subset
/// that exists in their language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Interface,
    Enum,
    Struct,
    Object,
    TypeAlias,
    Field,
    Constant,
    Variable,
    Property,
    EnumMember,
    Method,
    Constructor,
    Function,
    Event,
    Operator,
    Module,
    Namespace,
    Package,
    TypeParameter,
    Component,
    Hook,
    AsyncFunction,
    Generator,
    Decorator,
    Import,
}

impl SymbolKind {
    /// All kinds, in declaration order.
    pub const ALL: &'static [SymbolKind] = &[
        SymbolKind::Class,
        SymbolKind::Interface,
        SymbolKind::Enum,
        SymbolKind::Struct,
        SymbolKind::Object,
        SymbolKind::TypeAlias,
        SymbolKind::Field,
        SymbolKind::Constant,
        SymbolKind::Variable,
        SymbolKind::Property,
        SymbolKind::EnumMember,
        SymbolKind::Method,
        SymbolKind::Constructor,
        SymbolKind::Function,
        SymbolKind::Event,
        SymbolKind::Operator,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Package,
        SymbolKind::TypeParameter,
        SymbolKind::Component,
        SymbolKind::Hook,
        SymbolKind::AsyncFunction,
        SymbolKind::Generator,
        SymbolKind::Decorator,
        SymbolKind::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Struct => "struct",
            SymbolKind::Object => "object",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Field => "field",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Property => "property",
            SymbolKind::EnumMember => "enum_member",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Function => "function",
            SymbolKind::Event => "event",
            SymbolKind::Operator => "operator",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Package => "package",
            SymbolKind::TypeParameter => "type_parameter",
            SymbolKind::Component => "component",
            SymbolKind::Hook => "hook",
            SymbolKind::AsyncFunction => "async_function",
            SymbolKind::Generator => "generator",
            SymbolKind::Decorator => "decorator",
            SymbolKind::Import => "import",
        }
    }

    /// Type-like declarations (confidence table treats these as "class").
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Struct
                | SymbolKind::Object
                | SymbolKind::TypeAlias
                | SymbolKind::Component
        )
    }

    /// Callable declarations.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Method
                | SymbolKind::Constructor
                | SymbolKind::Function
                | SymbolKind::Operator
                | SymbolKind::Hook
                | SymbolKind::AsyncFunction
                | SymbolKind::Generator
                | SymbolKind::Component
        )
    }

    /// Value-holding declarations (fields, variables, constants, ...).
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            SymbolKind::Field
                | SymbolKind::Constant
                | SymbolKind::Variable
                | SymbolKind::Property
                | SymbolKind::EnumMember
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown symbol kind: {}", s))
    }
}

/// Visibility, normalized across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    PackagePrivate,
    Unknown,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::PackagePrivate => "package-private",
            Visibility::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a declaration or usage in its file.
///
/// Offsets are byte offsets into the file text with
/// `start_offset <= end_offset <= file length`; `line_number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub start_offset: usize,
    pub end_offset: usize,
    pub line_number: usize,
}

/// Source format of a documentation block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    Javadoc,
    Kdoc,
    Docstring,
    Jsdoc,
}

/// Documentation attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DocFormat>,
}

impl Documentation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(summary: Option<String>, format: DocFormat) -> Self {
        Self {
            present: true,
            summary,
            format: Some(format),
        }
    }
}

/// An annotation or decorator applied to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorator {
    pub name: String,
    pub builtin: bool,
}

/// One declaration site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub name: String,
    pub qualified_name: Option<String>,
    pub kind: SymbolKind,
    #[serde(flatten)]
    pub location: Location,
    pub modifiers: BTreeSet<String>,
    pub visibility: Visibility,
    pub documentation: Documentation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<Decorator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SymbolInfo>,
    pub is_synthetic: bool,
    pub is_deprecated: bool,
    pub is_async: bool,
    pub is_generator: bool,
}

impl SymbolInfo {
    /// Create a symbol with empty metadata; adapters fill in the rest.
    pub fn new(name: impl Into<String>, kind: SymbolKind, location: Location) -> Self {
        Self {
            name: name.into(),
            qualified_name: None,
            kind,
            location,
            modifiers: BTreeSet::new(),
            visibility: Visibility::Unknown,
            documentation: Documentation::none(),
            decorators: Vec::new(),
            signature: None,
            children: Vec::new(),
            is_synthetic: false,
            is_deprecated: false,
            is_async: false,
            is_generator: false,
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.contains(modifier)
    }

    /// Total number of symbols in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }

    /// Depth of the subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

/// A candidate definition for a name or reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionLocation {
    pub name: String,
    pub qualified_name: Option<String>,
    pub kind: SymbolKind,
    pub file_path: String,
    #[serde(flatten)]
    pub location: Location,
    pub visibility: Visibility,
    pub confidence: f64,
    pub disambiguation_hint: String,
    pub is_test_code: bool,
    pub is_library_code: bool,
    pub accessibility_warning: Option<String>,
}

/// How a usage site uses its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    MethodCall,
    StaticMethodCall,
    GetterCall,
    SetterCall,
    FieldRead,
    FieldWrite,
    FieldIncrement,
    ConstructorCall,
    TypeReference,
    MethodOverride,
    Declaration,
    Reference,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::MethodCall => "method_call",
            UsageType::StaticMethodCall => "static_method_call",
            UsageType::GetterCall => "getter_call",
            UsageType::SetterCall => "setter_call",
            UsageType::FieldRead => "field_read",
            UsageType::FieldWrite => "field_write",
            UsageType::FieldIncrement => "field_increment",
            UsageType::ConstructorCall => "constructor_call",
            UsageType::TypeReference => "type_reference",
            UsageType::MethodOverride => "method_override",
            UsageType::Declaration => "declaration",
            UsageType::Reference => "reference",
        }
    }

    /// Calls of any flavour.
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            UsageType::MethodCall
                | UsageType::StaticMethodCall
                | UsageType::GetterCall
                | UsageType::SetterCall
                | UsageType::ConstructorCall
        )
    }

    /// Writes of any flavour.
    pub fn is_write(&self) -> bool {
        matches!(self, UsageType::FieldWrite | UsageType::FieldIncrement)
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One usage site of a resolved symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInfo {
    pub file_path: String,
    #[serde(flatten)]
    pub location: Location,
    pub usage_type: UsageType,
    pub containing_method: Option<String>,
    pub containing_class: Option<String>,
    pub data_flow_context: Option<String>,
    pub is_test_code: bool,
    pub is_deprecated_usage: bool,
    /// Trimmed source line of the usage.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preview: String,
}

/// Aggregate counters for a reference search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSummary {
    pub total_references: usize,
    pub file_count: usize,
    pub has_test_usages: bool,
}

/// Grouped view of a reference search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedReferencesResult {
    pub summary: ReferenceSummary,
    pub usages_by_type: BTreeMap<UsageType, Vec<ReferenceInfo>>,
    pub insights: Vec<String>,
    pub all_references: Vec<ReferenceInfo>,
}

impl GroupedReferencesResult {
    /// Insight emitted when the target cannot be resolved.
    pub const NOT_FOUND: &'static str = "Symbol not found";

    /// Empty result for an unresolvable target.
    pub fn not_found() -> Self {
        Self {
            insights: vec![Self::NOT_FOUND.to_string()],
            ..Self::default()
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.summary.total_references == 0
            && self.insights.len() == 1
            && self.insights[0] == Self::NOT_FOUND
    }

    /// Distinct file paths touched by the references.
    pub fn files(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.all_references
            .iter()
            .map(|r| r.file_path.as_str())
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

/// Synthesized description of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverInfo {
    pub element_name: String,
    pub element_type: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub presentable_text: String,
    #[serde(rename = "javaDoc")]
    pub java_doc: Option<String>,
    pub signature: Option<String>,
    pub modifiers: Vec<String>,
    pub super_types: Vec<String>,
    pub implemented_by: Vec<String>,
    pub overridden_by: Vec<String>,
    pub called_by_count: usize,
    pub complexity: Option<u32>,
    pub throws_exceptions: Vec<String>,
    pub deprecation_message: Option<String>,
    pub since: Option<String>,
    pub see_also: Vec<String>,
    pub is_deprecated: bool,
    pub module: Option<String>,
}

impl HoverInfo {
    /// Hover record with every optional field at its documented default.
    pub fn new(element_name: impl Into<String>, element_type: impl Into<String>) -> Self {
        let element_name = element_name.into();
        Self {
            presentable_text: element_name.clone(),
            element_name,
            element_type: element_type.into(),
            type_name: None,
            java_doc: None,
            signature: None,
            modifiers: Vec::new(),
            super_types: Vec::new(),
            implemented_by: Vec::new(),
            overridden_by: Vec::new(),
            called_by_count: 0,
            complexity: None,
            throws_exceptions: Vec::new(),
            deprecation_message: None,
            since: None,
            see_also: Vec::new(),
            is_deprecated: false,
            module: None,
        }
    }
}
