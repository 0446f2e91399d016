//! Adapter registry.
//!
//! Adapters are registered in a static table mapping language identifier
//! sets to constructors. Instances are built lazily on first use, cached in
//! a concurrent map and shared by every request until [`clear_cache`].

mod jvm;
mod python;
mod web;

pub use jvm::JvmAdapter;
pub use python::PythonAdapter;
pub use web::WebAdapter;

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use phf::phf_map;

use super::model::SymbolKind;
use super::traits::{
    DefinitionFinder, HoverProvider, LanguageAdapter, ReferenceFinder, SymbolExtractor,
};
use crate::error::{Error, Result};

/// The four capabilities of one adapter, plus its parsing front end.
#[derive(Clone)]
pub struct AdapterHandle {
    pub id: &'static str,
    pub adapter: Arc<dyn LanguageAdapter>,
    pub extractor: Arc<dyn SymbolExtractor>,
    pub definitions: Arc<dyn DefinitionFinder>,
    pub references: Arc<dyn ReferenceFinder>,
    pub hover: Arc<dyn HoverProvider>,
}

impl AdapterHandle {
    fn of<T>(adapter: T) -> Self
    where
        T: LanguageAdapter
            + SymbolExtractor
            + DefinitionFinder
            + ReferenceFinder
            + HoverProvider
            + 'static,
    {
        let shared = Arc::new(adapter);
        Self {
            id: shared.id(),
            adapter: shared.clone(),
            extractor: shared.clone(),
            definitions: shared.clone(),
            references: shared.clone(),
            hover: shared,
        }
    }
}

impl std::fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterHandle").field("id", &self.id).finish()
    }
}

/// One row of the registration table.
struct Registration {
    id: &'static str,
    aliases: &'static [&'static str],
    extensions: &'static [&'static str],
    build: fn() -> anyhow::Result<AdapterHandle>,
}

fn build_jvm() -> anyhow::Result<AdapterHandle> {
    Ok(AdapterHandle::of(JvmAdapter::new()?))
}

fn build_python() -> anyhow::Result<AdapterHandle> {
    Ok(AdapterHandle::of(PythonAdapter::new()?))
}

fn build_web() -> anyhow::Result<AdapterHandle> {
    Ok(AdapterHandle::of(WebAdapter::new()?))
}

static REGISTRATIONS: &[Registration] = &[
    Registration {
        id: "jvm",
        aliases: jvm::ALIASES,
        extensions: jvm::EXTENSIONS,
        build: build_jvm,
    },
    Registration {
        id: "python",
        aliases: python::ALIASES,
        extensions: python::EXTENSIONS,
        build: build_python,
    },
    Registration {
        id: "web",
        aliases: web::ALIASES,
        extensions: web::EXTENSIONS,
        build: build_web,
    },
];

/// Display names for `list_supported_languages`.
const SUPPORTED_LANGUAGES: &[&str] = &["Java", "Kotlin", "Python", "JavaScript", "TypeScript"];

/// Languages we know about but ship no adapter for, with the grammar that
/// would add support.
static UNSUPPORTED_HINTS: phf::Map<&'static str, &'static str> = phf_map! {
    "Go" => "the tree-sitter-go grammar",
    "Rust" => "the tree-sitter-rust grammar",
    "C#" => "the tree-sitter-c-sharp grammar",
    "C" => "the tree-sitter-c grammar",
    "C++" => "the tree-sitter-cpp grammar",
    "Ruby" => "the tree-sitter-ruby grammar",
    "PHP" => "the tree-sitter-php grammar",
    "Swift" => "the tree-sitter-swift grammar",
    "Scala" => "the tree-sitter-scala grammar",
};

/// Extensions of the languages above, so a file reports its language.
static UNSUPPORTED_EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "go" => "Go",
    "rs" => "Rust",
    "cs" => "C#",
    "c" => "C",
    "h" => "C",
    "cpp" => "C++",
    "cc" => "C++",
    "cxx" => "C++",
    "hpp" => "C++",
    "rb" => "Ruby",
    "php" => "PHP",
    "swift" => "Swift",
    "scala" => "Scala",
    "sc" => "Scala",
};

/// Live adapter instances, keyed by adapter id.
static ADAPTERS: Lazy<DashMap<&'static str, AdapterHandle>> = Lazy::new(DashMap::new);

/// Aggregated symbol kinds, keyed by the sorted language list.
static KIND_CACHE: Lazy<DashMap<Vec<String>, Vec<SymbolKind>>> = Lazy::new(DashMap::new);

fn instance(registration: &Registration) -> Result<AdapterHandle> {
    if let Some(handle) = ADAPTERS.get(registration.id) {
        return Ok(handle.clone());
    }
    let handle = (registration.build)().map_err(|e| Error::AdapterInternal {
        language: registration.id.to_string(),
        message: format!("{:#}", e),
    })?;
    tracing::debug!(adapter = registration.id, "adapter initialized");
    Ok(ADAPTERS
        .entry(registration.id)
        .or_insert(handle)
        .value()
        .clone())
}

fn unsupported(language: &str) -> Error {
    Error::UnsupportedLanguage {
        language: language.to_string(),
        hint: UNSUPPORTED_HINTS.get(language).map(|h| h.to_string()),
    }
}

/// Adapter claiming `language` (case-sensitive alias match).
pub fn resolve(language: &str) -> Result<AdapterHandle> {
    REGISTRATIONS
        .iter()
        .find(|r| r.aliases.contains(&language))
        .ok_or_else(|| unsupported(language))
        .and_then(instance)
}

/// Adapter for a file, chosen by extension.
pub fn adapter_for_path(path: &Path) -> Result<AdapterHandle> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match REGISTRATIONS.iter().find(|r| r.extensions.contains(&ext)) {
        Some(registration) => instance(registration),
        None => {
            let language = UNSUPPORTED_EXTENSIONS
                .get(ext)
                .copied()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if ext.is_empty() {
                        "unknown".to_string()
                    } else {
                        format!(".{}", ext)
                    }
                });
            Err(unsupported(&language))
        }
    }
}

/// Language identifier of a file, if a registered adapter handles it.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    match ext {
        "java" => Some("JAVA"),
        "kt" | "kts" => Some("Kotlin"),
        "py" | "pyi" => Some("Python"),
        "js" | "mjs" | "cjs" => Some("JavaScript"),
        "jsx" => Some("JSX"),
        "ts" | "mts" | "cts" => Some("TypeScript"),
        "tsx" => Some("TSX"),
        _ => None,
    }
}

/// Languages available for display in help text.
pub fn list_supported_languages() -> Vec<&'static str> {
    SUPPORTED_LANGUAGES.to_vec()
}

/// Every registered adapter, building them as needed.
pub fn all_adapters() -> Vec<Result<AdapterHandle>> {
    REGISTRATIONS.iter().map(instance).collect()
}

/// Union of the symbol kinds the adapters for `languages` can produce.
///
/// An empty list means every registered adapter. Unknown languages are
/// skipped.
pub fn supported_symbol_kinds(languages: &[&str]) -> Vec<SymbolKind> {
    let mut key: Vec<String> = languages.iter().map(|l| l.to_string()).collect();
    key.sort();
    key.dedup();
    if let Some(cached) = KIND_CACHE.get(&key) {
        return cached.clone();
    }

    let handles: Vec<AdapterHandle> = if key.is_empty() {
        all_adapters().into_iter().filter_map(|h| h.ok()).collect()
    } else {
        key.iter()
            .filter_map(|language| match resolve(language) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::debug!(language = %language, error = %e, "skipping language");
                    None
                }
            })
            .collect()
    };

    let mut kinds: Vec<SymbolKind> = handles
        .iter()
        .flat_map(|h| h.extractor.supported_kinds().iter().copied())
        .collect();
    kinds.sort();
    kinds.dedup();

    KIND_CACHE.insert(key, kinds.clone());
    kinds
}

/// Drop cached adapter instances and aggregated kinds.
pub fn clear_cache() {
    ADAPTERS.clear();
    KIND_CACHE.clear();
    tracing::debug!("adapter caches cleared");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_aliases_case_sensitive() {
        assert_eq!(resolve("JAVA").unwrap().id, "jvm");
        assert_eq!(resolve("kotlin").unwrap().id, "jvm");
        assert_eq!(resolve("Kotlin").unwrap().id, "jvm");
        assert_eq!(resolve("PythonCore").unwrap().id, "python");
        assert_eq!(resolve("ECMAScript 6").unwrap().id, "web");
        assert_eq!(resolve("TSX").unwrap().id, "web");

        assert!(matches!(
            resolve("java"),
            Err(Error::UnsupportedLanguage { .. })
        ));
        assert!(matches!(
            resolve("python"),
            Err(Error::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn test_unsupported_language_hint() {
        match resolve("Go") {
            Err(Error::UnsupportedLanguage { language, hint }) => {
                assert_eq!(language, "Go");
                assert!(hint.unwrap().contains("tree-sitter-go"));
            }
            other => panic!("expected unsupported language, got {:?}", other),
        }
        match resolve("Brainfuck") {
            Err(Error::UnsupportedLanguage { hint, .. }) => assert!(hint.is_none()),
            other => panic!("expected unsupported language, got {:?}", other),
        }
    }

    #[test]
    fn test_adapter_for_path() {
        assert_eq!(adapter_for_path(Path::new("A.java")).unwrap().id, "jvm");
        assert_eq!(adapter_for_path(Path::new("build.kts")).unwrap().id, "jvm");
        assert_eq!(adapter_for_path(Path::new("m.pyi")).unwrap().id, "python");
        assert_eq!(adapter_for_path(Path::new("App.tsx")).unwrap().id, "web");
        match adapter_for_path(Path::new("lib.rs")) {
            Err(Error::UnsupportedLanguage { language, hint }) => {
                assert_eq!(language, "Rust");
                assert!(hint.is_some());
            }
            other => panic!("expected unsupported language, got {:?}", other),
        }
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("A.java")), Some("JAVA"));
        assert_eq!(language_for_path(Path::new("a.mjs")), Some("JavaScript"));
        assert_eq!(language_for_path(Path::new("a.jsx")), Some("JSX"));
        assert_eq!(language_for_path(Path::new("README.md")), None);
    }

    #[test]
    fn test_instances_are_reused() {
        let a = resolve("JAVA").unwrap();
        let b = resolve("Kotlin").unwrap();
        assert!(Arc::ptr_eq(&a.adapter, &b.adapter));
    }

    #[test]
    fn test_supported_kinds_union() {
        let jvm = supported_symbol_kinds(&["JAVA"]);
        assert!(jvm.contains(&SymbolKind::Class));
        assert!(!jvm.contains(&SymbolKind::Hook));

        let web = supported_symbol_kinds(&["TypeScript", "JavaScript"]);
        assert!(web.contains(&SymbolKind::Hook));
        assert!(web.contains(&SymbolKind::Component));

        let all = supported_symbol_kinds(&[]);
        assert!(all.contains(&SymbolKind::Hook));
        assert!(all.contains(&SymbolKind::Constructor));
        assert_eq!(supported_symbol_kinds(&["Nope"]), Vec::<SymbolKind>::new());
    }
}
