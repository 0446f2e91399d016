//! Configuration schema for crosslens.
//!
//! A project may carry a `crosslens.yaml` (or `.crosslens.yaml`) at its root.
//! Every section is optional; an absent file means defaults everywhere.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// File names looked up at the project root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["crosslens.yaml", ".crosslens.yaml"];

/// Paths treated as test code when `test_paths` is empty.
pub const DEFAULT_TEST_PATHS: &[&str] = &[
    "**/test/**",
    "**/tests/**",
    "**/__tests__/**",
    "**/*Test.java",
    "**/*Tests.java",
    "**/*IT.java",
    "**/*Test.kt",
    "**/test_*.py",
    "**/*_test.py",
    "**/conftest.py",
    "**/*.test.js",
    "**/*.test.jsx",
    "**/*.test.ts",
    "**/*.test.tsx",
    "**/*.spec.js",
    "**/*.spec.ts",
    "**/*.spec.tsx",
];

/// Paths treated as library (dependency) code when `library_paths` is empty.
pub const DEFAULT_LIBRARY_PATHS: &[&str] = &[
    "**/lib/**",
    "**/libs/**",
    "**/vendor/**",
    "**/third_party/**",
    "**/site-packages/**",
    "**/node_modules/**",
];

/// Paths never indexed when `excluded_paths` is empty.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "**/.git/**",
    "**/target/**",
    "**/build/**",
    "**/dist/**",
    "**/out/**",
    "**/.gradle/**",
    "**/node_modules/**",
    "**/__pycache__/**",
    "**/.venv/**",
    "**/venv/**",
];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub references: ReferencesConfig,
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    /// Glob patterns for test code (relative to the project root).
    #[serde(default)]
    pub test_paths: Vec<String>,
    /// Glob patterns for library/dependency code.
    #[serde(default)]
    pub library_paths: Vec<String>,
    /// Glob patterns for paths to skip entirely (e.g. "**/generated/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Locate a config file at the project root.
    pub fn discover<P: AsRef<Path>>(root: P) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.as_ref().join(name))
            .find(|p| p.is_file())
    }

    /// Load the config for a project root: an explicit file wins, then a
    /// discovered one, then defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config = match explicit {
            Some(path) => Self::parse_file(path)?,
            None => match Self::discover(root) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "using discovered config");
                    Self::parse_file(&path)?
                }
                None => Config::default(),
            },
        };
        validate(&config)?;
        Ok(config)
    }

    pub fn test_patterns(&self) -> Vec<String> {
        patterns_or_default(&self.test_paths, DEFAULT_TEST_PATHS)
    }

    pub fn library_patterns(&self) -> Vec<String> {
        patterns_or_default(&self.library_paths, DEFAULT_LIBRARY_PATHS)
    }

    pub fn excluded_patterns(&self) -> Vec<String> {
        patterns_or_default(&self.excluded_paths, DEFAULT_EXCLUDED_PATHS)
    }
}

/// Defaults for symbol extraction requests.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub include_private: bool,
    #[serde(default)]
    pub include_generated: bool,
    #[serde(default)]
    pub include_imports: bool,
    /// Maximum depth of hierarchical trees (unbounded when absent).
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Defaults for reference searches.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ReferencesConfig {
    #[serde(default)]
    pub include_declaration: bool,
    /// Truncate the reference list to this many entries.
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Settings for name-based definition search.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefinitionsConfig {
    /// Candidates kept after ranking (default: 50).
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
        }
    }
}

fn default_max_candidates() -> usize {
    50
}

fn patterns_or_default(patterns: &[String], defaults: &[&str]) -> Vec<String> {
    if patterns.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        patterns.to_vec()
    }
}

/// Compile glob patterns into one matcher.
pub fn build_glob_set(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid glob pattern {:?}: {}", pattern, e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if !config.version.is_empty() && config.version != "1" && config.version != "1.0" {
        anyhow::bail!("unsupported config version {:?}, expected \"1\"", config.version);
    }

    if config.definitions.max_candidates == 0 {
        anyhow::bail!("definitions.max_candidates must be at least 1");
    }

    if config.references.max_results == Some(0) {
        anyhow::bail!("references.max_results must be at least 1 when set");
    }

    for (field, patterns) in [
        ("test_paths", &config.test_paths),
        ("library_paths", &config.library_paths),
        ("excluded_paths", &config.excluded_paths),
    ] {
        for pattern in patterns {
            Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid {} pattern {:?}: {}", field, pattern, e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
extraction:
  include_private: true
  max_depth: 2
references:
  max_results: 20
definitions:
  max_candidates: 10
test_paths:
  - "**/spec/**"
excluded_paths:
  - "**/generated/**"
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert!(config.extraction.include_private);
        assert_eq!(config.extraction.max_depth, Some(2));
        assert_eq!(config.references.max_results, Some(20));
        assert_eq!(config.definitions.max_candidates, 10);
        assert_eq!(config.test_patterns(), vec!["**/spec/**".to_string()]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_str("").unwrap();
        assert_eq!(config.definitions.max_candidates, 50);
        assert!(!config.extraction.include_private);
        assert_eq!(config.test_patterns().len(), DEFAULT_TEST_PATHS.len());
        assert!(config
            .excluded_patterns()
            .contains(&"**/node_modules/**".to_string()));
    }

    #[test]
    fn test_validate_rejects_bad_glob() {
        let config = Config {
            library_paths: vec!["**/[lib".to_string()],
            ..Config::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("library_paths"));
    }

    #[test]
    fn test_validate_rejects_zero_candidates() {
        let yaml = "definitions:\n  max_candidates: 0\n";
        let config = Config::parse_str(yaml).unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_default_test_globs_match() {
        let set = build_glob_set(&Config::default().test_patterns()).unwrap();
        assert!(set.is_match("src/test/java/UserTest.java"));
        assert!(set.is_match("pkg/test_user.py"));
        assert!(set.is_match("web/app.spec.ts"));
        assert!(!set.is_match("src/main/java/User.java"));
    }
}
