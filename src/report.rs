//! Output formatting for crosslens results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: the serde form of the result records, wrapped in a small envelope

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{
    DefinitionLocation, GroupedReferencesResult, HoverInfo, ReferenceInfo, SymbolInfo, SymbolKind,
};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Format::Pretty),
            "json" => Ok(Format::Json),
            other => Err(format!(
                "invalid format {:?}, must be 'pretty' or 'json'",
                other
            )),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Envelope around every JSON result.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<T> {
    pub version: String,
    pub command: String,
    pub root: String,
    pub result: T,
}

impl<T: Serialize> JsonReport<T> {
    pub fn new(command: &str, root: &str, result: T) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            command: command.to_string(),
            root: root.to_string(),
            result,
        }
    }
}

/// Render a result as pretty-printed JSON.
pub fn to_json<T: Serialize>(command: &str, root: &str, result: T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::new(
        command, root, result,
    ))?)
}

/// Write a result as JSON to stdout.
pub fn write_json<T: Serialize>(command: &str, root: &str, result: T) -> anyhow::Result<()> {
    println!("{}", to_json(command, root, result)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn header(title: &str, subject: &str) {
    println!();
    print!("  ");
    print!("{}", "crosslens".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", format!("{}: ", title).dimmed());
    println!("{}", subject);
    println!();
}

fn kind_tag(kind: SymbolKind) -> ColoredString {
    let label = format!("{:<14}", kind.as_str());
    if kind.is_type() {
        label.magenta()
    } else if kind.is_callable() {
        label.green()
    } else if kind.is_value() {
        label.yellow()
    } else {
        label.dimmed()
    }
}

/// Write extracted symbols, indenting children.
pub fn write_symbols(path: &str, symbols: &[SymbolInfo]) {
    header("Symbols", path);
    if symbols.is_empty() {
        println!("  {}", "(no symbols)".dimmed());
        println!();
        return;
    }
    for symbol in symbols {
        write_symbol(symbol, 0);
    }
    println!();
    let total: usize = symbols.iter().map(|s| s.subtree_len()).sum();
    println!("  {}", format!("{} symbols", total).dimmed());
    println!();
}

fn write_symbol(symbol: &SymbolInfo, depth: usize) {
    let indent = "  ".repeat(depth + 2);
    print!("{}{} ", indent, kind_tag(symbol.kind));
    print!("{}", symbol.name.bold());
    if let Some(signature) = &symbol.signature {
        print!("  {}", signature.dimmed());
    }
    print!("{}", format!("  :{}", symbol.location.line_number).dimmed());
    if symbol.is_deprecated {
        print!("  {}", "deprecated".red());
    }
    println!();
    for child in &symbol.children {
        write_symbol(child, depth + 1);
    }
}

/// Write definition candidates, best first.
pub fn write_definitions(subject: &str, definitions: &[DefinitionLocation]) {
    header("Definitions", subject);
    if definitions.is_empty() {
        println!("  {}", "(no definitions found)".dimmed());
        println!();
        return;
    }
    for d in definitions {
        print!("    {} ", confidence_tag(d.confidence));
        print!("{} ", kind_tag(d.kind));
        print!("{}", d.qualified_name.as_deref().unwrap_or(&d.name).bold());
        println!();
        print!("            {}", d.file_path.blue());
        print!("{}", format!(":{}", d.location.line_number).dimmed());
        print!("  {}", d.disambiguation_hint.dimmed());
        if d.is_test_code {
            print!("  {}", "test".yellow());
        }
        if d.is_library_code {
            print!("  {}", "library".dimmed());
        }
        println!();
        if let Some(warning) = &d.accessibility_warning {
            println!("            {}", warning.red());
        }
    }
    println!();
}

fn confidence_tag(confidence: f64) -> ColoredString {
    let label = format!("{:.2}", confidence);
    match confidence {
        c if c >= 0.9 => label.green().bold(),
        c if c >= 0.5 => label.green(),
        c if c >= 0.3 => label.yellow(),
        _ => label.red(),
    }
}

/// Write grouped references with their insights.
pub fn write_references(subject: &str, result: &GroupedReferencesResult) {
    header("References", subject);

    let summary = &result.summary;
    print!("  {}", summary.total_references.to_string().bold());
    print!(" references in ");
    print!("{}", summary.file_count.to_string().bold());
    print!(" files");
    if summary.has_test_usages {
        print!("  {}", "(used from tests)".dimmed());
    }
    println!();
    println!();

    if !result.insights.is_empty() {
        println!("  {}", "Insights:".bold());
        for insight in &result.insights {
            println!("    - {}", insight);
        }
        println!();
    }

    for (usage, refs) in &result.usages_by_type {
        println!("  {} ({}):", usage.as_str().bold(), refs.len());
        for r in refs {
            write_reference(r);
        }
        println!();
    }
}

fn write_reference(r: &ReferenceInfo) {
    print!("    {}", r.file_path.blue());
    print!("{}", format!(":{}", r.location.line_number).dimmed());
    if let Some(method) = &r.containing_method {
        let owner = r
            .containing_class
            .as_deref()
            .map(|c| format!("{}.", c))
            .unwrap_or_default();
        print!("  {}", format!("in {}{}", owner, method).dimmed());
    }
    if let Some(context) = &r.data_flow_context {
        print!("  {}", format!("[{}]", context).dimmed());
    }
    if r.is_deprecated_usage {
        print!("  {}", "deprecated".red());
    }
    println!();
    if !r.preview.is_empty() {
        println!("            {}", r.preview);
    }
}

/// Write a hover record.
pub fn write_hover(subject: &str, hover: &HoverInfo) {
    header("Hover", subject);

    print!("  {} ", hover.element_type.magenta());
    println!("{}", hover.presentable_text.bold());
    if let Some(signature) = &hover.signature {
        println!("  {}", signature);
    }
    println!();

    let field = |label: &str, value: &str| {
        println!("    {:<16}{}", format!("{}:", label).dimmed(), value);
    };
    let list = |label: &str, values: &[String]| {
        if !values.is_empty() {
            field(label, &values.join(", "));
        }
    };

    if let Some(type_name) = &hover.type_name {
        field("Type", type_name);
    }
    if let Some(module) = &hover.module {
        field("Module", module);
    }
    list("Modifiers", &hover.modifiers);
    list("Extends", &hover.super_types);
    list("Implemented by", &hover.implemented_by);
    list("Overridden by", &hover.overridden_by);
    list("Throws", &hover.throws_exceptions);
    if let Some(complexity) = hover.complexity {
        field("Complexity", &complexity.to_string());
    }
    if hover.called_by_count > 0 {
        field("Used", &format!("{} times", hover.called_by_count));
    }
    if let Some(since) = &hover.since {
        field("Since", since);
    }
    list("See also", &hover.see_also);
    if hover.is_deprecated {
        let message = hover.deprecation_message.as_deref().unwrap_or("deprecated");
        println!("    {}", format!("Deprecated: {}", message).red());
    }
    if let Some(doc) = &hover.java_doc {
        println!();
        for line in doc.lines() {
            println!("    {}", line);
        }
    }
    println!();
}

/// Write a plain list of names (languages, kinds).
pub fn write_list(title: &str, items: &[&str]) {
    println!("{}:", title);
    println!();
    for item in items {
        println!("  {}", item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Location, SymbolKind};

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!("pretty".parse::<Format>(), Ok(Format::Pretty));
        assert!("sarif".parse::<Format>().is_err());
    }

    #[test]
    fn test_json_envelope() {
        let symbol = SymbolInfo::new(
            "User",
            SymbolKind::Class,
            Location {
                start_offset: 0,
                end_offset: 20,
                line_number: 1,
            },
        );
        let json = to_json("symbols", "/work", vec![symbol]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["command"], "symbols");
        assert_eq!(value["root"], "/work");
        assert_eq!(value["result"][0]["name"], "User");
        assert_eq!(value["result"][0]["kind"], "class");
    }

    #[test]
    fn test_json_not_found_references() {
        let json = to_json("references", ".", GroupedReferencesResult::not_found()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"]["insights"][0], "Symbol not found");
        assert_eq!(value["result"]["summary"]["totalReferences"], 0);
    }
}
