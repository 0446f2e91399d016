//! Command-line interface for crosslens.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::analysis::{ReferenceQuery, SymbolKind};
use crate::config::Config;
use crate::index::{CodeIndex, Position};
use crate::report::{self, Format};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_NOT_FOUND: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Code intelligence for Java, Kotlin, Python, JavaScript and TypeScript.
///
/// Extracts symbols, finds definitions and references, and describes
/// declarations, using tree-sitter grammars and no compiler or build setup.
#[derive(Parser)]
#[command(name = "crosslens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Project root (default: current directory)
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Path to config YAML file (default: auto-discover at the root)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: String,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the declarations of a file
    Symbols(SymbolsArgs),
    /// Go to the definition of the reference at a position
    Definition(DefinitionArgs),
    /// Search the project for declarations by name
    Find(FindArgs),
    /// Find usages of a symbol
    #[command(visible_alias = "refs")]
    References(ReferencesArgs),
    /// Describe the symbol at a position
    Hover(HoverArgs),
    /// List supported languages
    Languages,
    /// List symbol kinds the adapters produce
    Kinds(KindsArgs),
}

/// A position in a file: `--offset`, or `--line` with `--column`.
#[derive(Args, Debug, Clone)]
pub struct PositionArgs {
    /// Byte offset into the file
    #[arg(long, conflicts_with_all = ["line", "column"])]
    pub offset: Option<usize>,

    /// 1-based line number
    #[arg(long, requires = "column")]
    pub line: Option<usize>,

    /// 1-based column
    #[arg(long, requires = "line")]
    pub column: Option<usize>,
}

impl PositionArgs {
    fn position(&self) -> anyhow::Result<Position> {
        match (self.offset, self.line, self.column) {
            (Some(offset), _, _) => Ok(Position::Offset(offset)),
            (None, Some(line), Some(column)) => Ok(Position::LineColumn { line, column }),
            _ => anyhow::bail!("a position is required: --offset or --line/--column"),
        }
    }

    fn is_set(&self) -> bool {
        self.offset.is_some() || self.line.is_some()
    }
}

/// Arguments for the symbols command.
#[derive(Parser)]
pub struct SymbolsArgs {
    /// File to outline
    pub file: PathBuf,

    /// Print a flat list instead of a tree
    #[arg(long)]
    pub flat: bool,

    /// Only keep these kinds (comma-separated, e.g. class,method)
    #[arg(short, long, value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Include private declarations
    #[arg(long)]
    pub include_private: bool,

    /// Include generated members (enum values(), dataclass __init__, ...)
    #[arg(long)]
    pub include_generated: bool,

    /// Include import declarations
    #[arg(long)]
    pub include_imports: bool,

    /// Maximum tree depth
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Arguments for the definition command.
#[derive(Parser)]
pub struct DefinitionArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub position: PositionArgs,
}

/// Arguments for the find command.
#[derive(Parser)]
pub struct FindArgs {
    /// Name to search for (`Name` or `Type.member`)
    pub name: String,
}

/// Arguments for the references command.
#[derive(Parser)]
pub struct ReferencesArgs {
    /// File containing the symbol
    #[arg(required_unless_present = "name", conflicts_with = "name")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub position: PositionArgs,

    /// Search by name instead of position
    #[arg(short, long)]
    pub name: Option<String>,

    /// Count the declaration itself as a reference
    #[arg(long)]
    pub include_declaration: bool,

    /// Keep at most this many references
    #[arg(long)]
    pub max_results: Option<usize>,
}

/// Arguments for the hover command.
#[derive(Parser)]
pub struct HoverArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub position: PositionArgs,
}

/// Arguments for the kinds command.
#[derive(Parser)]
pub struct KindsArgs {
    /// Restrict to these languages (e.g. JAVA, Python, TypeScript)
    #[arg(short, long)]
    pub language: Vec<String>,
}

/// Open the index for the global options.
fn open_index(global: &GlobalArgs) -> anyhow::Result<CodeIndex> {
    let config = Config::load(&global.root, global.config.as_deref())?;
    Ok(CodeIndex::with_config(&global.root, config)?)
}

fn format_of(global: &GlobalArgs) -> anyhow::Result<Format> {
    global.format.parse::<Format>().map_err(anyhow::Error::msg)
}

fn root_str(index: &CodeIndex) -> String {
    index.project().root().to_string_lossy().to_string()
}

fn subject(file: &Path, position: Position) -> String {
    match position {
        Position::Offset(offset) => format!("{}@{}", file.display(), offset),
        Position::LineColumn { line, column } => {
            format!("{}:{}:{}", file.display(), line, column)
        }
    }
}

fn found(any: bool) -> i32 {
    if any {
        EXIT_SUCCESS
    } else {
        EXIT_NOT_FOUND
    }
}

/// Run the symbols command.
pub fn run_symbols(global: &GlobalArgs, args: &SymbolsArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let index = open_index(global)?;

    let mut options = index.default_extraction();
    options.include_private |= args.include_private;
    options.include_generated |= args.include_generated;
    options.include_imports |= args.include_imports;
    if args.max_depth.is_some() {
        options.max_depth = args.max_depth;
    }
    if !args.kinds.is_empty() {
        let kinds = args
            .kinds
            .iter()
            .map(|k| k.parse::<SymbolKind>().map_err(anyhow::Error::msg))
            .collect::<anyhow::Result<Vec<_>>>()?;
        options = options.with_kinds(kinds);
    }

    let symbols = index.symbols(&args.file, &options, !args.flat)?;
    tracing::info!(file = %args.file.display(), count = symbols.len(), "symbols extracted");

    match format {
        Format::Json => report::write_json("symbols", &root_str(&index), &symbols)?,
        Format::Pretty => report::write_symbols(&args.file.to_string_lossy(), &symbols),
    }
    Ok(found(!symbols.is_empty()))
}

/// Run the definition command.
pub fn run_definition(global: &GlobalArgs, args: &DefinitionArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let position = args.position.position()?;
    let index = open_index(global)?;

    let offset = index.offset_of(&args.file, position)?;
    let definitions = index.definition_at(&args.file, offset)?;

    match format {
        Format::Json => report::write_json("definition", &root_str(&index), &definitions)?,
        Format::Pretty => {
            report::write_definitions(&subject(&args.file, position), &definitions)
        }
    }
    Ok(found(!definitions.is_empty()))
}

/// Run the find command.
pub fn run_find(global: &GlobalArgs, args: &FindArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let index = open_index(global)?;

    let definitions = index.definitions_by_name(&args.name)?;

    match format {
        Format::Json => report::write_json("find", &root_str(&index), &definitions)?,
        Format::Pretty => report::write_definitions(&args.name, &definitions),
    }
    Ok(found(!definitions.is_empty()))
}

/// Run the references command.
pub fn run_references(global: &GlobalArgs, args: &ReferencesArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let index = open_index(global)?;

    let (query, subject) = match (&args.name, &args.file) {
        (Some(name), _) => (ReferenceQuery::by_name(name.clone()), name.clone()),
        (None, Some(file)) => {
            if !args.position.is_set() {
                anyhow::bail!("a position is required: --offset or --line/--column");
            }
            let position = args.position.position()?;
            let offset = index.offset_of(file, position)?;
            (
                ReferenceQuery::at_position(index.project().resolve_path(file), offset),
                subject(file, position),
            )
        }
        (None, None) => anyhow::bail!("either a file or --name is required"),
    };
    let query = query
        .include_declaration(args.include_declaration)
        .max_results(args.max_results);

    let result = index.references(&query)?;

    match format {
        Format::Json => report::write_json("references", &root_str(&index), &result)?,
        Format::Pretty => report::write_references(&subject, &result),
    }
    Ok(found(!result.is_not_found()))
}

/// Run the hover command.
pub fn run_hover(global: &GlobalArgs, args: &HoverArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let position = args.position.position()?;
    let index = open_index(global)?;

    let offset = index.offset_of(&args.file, position)?;
    let hover = index.hover_at(&args.file, offset)?;

    match (format, &hover) {
        (Format::Json, _) => report::write_json("hover", &root_str(&index), &hover)?,
        (Format::Pretty, Some(info)) => report::write_hover(&subject(&args.file, position), info),
        (Format::Pretty, None) => println!("No symbol at {}", subject(&args.file, position)),
    }
    Ok(found(hover.is_some()))
}

/// Run the languages command.
pub fn run_languages(global: &GlobalArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let languages = crate::analysis::list_supported_languages();
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&languages)?),
        Format::Pretty => report::write_list("Supported languages", &languages),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the kinds command.
pub fn run_kinds(global: &GlobalArgs, args: &KindsArgs) -> anyhow::Result<i32> {
    let format = format_of(global)?;
    let languages: Vec<&str> = args.language.iter().map(String::as_str).collect();
    let kinds = crate::analysis::supported_symbol_kinds(&languages);
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&kinds)?),
        Format::Pretty => {
            let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            report::write_list("Symbol kinds", &names);
        }
    }
    Ok(found(!kinds.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_position_from_line_column() {
        let cli = Cli::parse_from([
            "crosslens", "hover", "A.java", "--line", "3", "--column", "5",
        ]);
        match cli.command {
            Commands::Hover(args) => assert_eq!(
                args.position.position().unwrap(),
                Position::LineColumn { line: 3, column: 5 }
            ),
            _ => panic!("expected hover"),
        }
    }

    #[test]
    fn test_offset_conflicts_with_line() {
        let result = Cli::try_parse_from([
            "crosslens", "definition", "A.java", "--offset", "10", "--line", "2", "--column", "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_references_by_name_with_global_options() {
        let cli = Cli::parse_from([
            "crosslens", "references", "--name", "UserService.addUser", "--format", "json",
        ]);
        assert_eq!(cli.global.format, "json");
        match cli.command {
            Commands::References(args) => {
                assert_eq!(args.name.as_deref(), Some("UserService.addUser"));
                assert!(args.file.is_none());
            }
            _ => panic!("expected references"),
        }
    }

    #[test]
    fn test_missing_position_is_an_error() {
        let args = PositionArgs {
            offset: None,
            line: None,
            column: None,
        };
        assert!(args.position().is_err());
    }
}
