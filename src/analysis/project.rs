//! Project context: file enumeration and the parse cache.
//!
//! The `Project` plays the role of the host platform. It owns the files on
//! disk, hands out parsed trees, and guards tree inspection with a read scope
//! that a reload must wait for.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::SystemTime;

use dashmap::DashMap;
use globset::GlobSet;
use walkdir::WalkDir;

use super::languages;
use super::source::SourceFile;
use crate::config::{build_glob_set, Config};
use crate::error::{Error, Result};

/// Cached parse, valid while the file's length and mtime are unchanged.
struct CachedFile {
    len: u64,
    modified: Option<SystemTime>,
    file: Arc<SourceFile>,
}

/// A source tree being indexed.
pub struct Project {
    root: PathBuf,
    config: Config,
    tests: GlobSet,
    libraries: GlobSet,
    excluded: GlobSet,
    files: DashMap<PathBuf, CachedFile>,
    guard: RwLock<()>,
}

impl Project {
    /// Open a project, loading `crosslens.yaml` from the root when present.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let config = Config::load(root, None).map_err(|e| Error::Config(format!("{:#}", e)))?;
        Self::with_config(root, config)
    }

    /// Open a project with an explicit configuration.
    pub fn with_config<P: AsRef<Path>>(root: P, config: Config) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(Error::FileNotFound(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let compile = |patterns: Vec<String>| {
            build_glob_set(&patterns).map_err(|e| Error::Config(format!("{:#}", e)))
        };

        Ok(Self {
            tests: compile(config.test_patterns())?,
            libraries: compile(config.library_patterns())?,
            excluded: compile(config.excluded_patterns())?,
            root,
            config,
            files: DashMap::new(),
            guard: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hold this guard for the duration of one request.
    ///
    /// The guard is released when dropped, on every exit path.
    pub fn read_scope(&self) -> RwLockReadGuard<'_, ()> {
        self.guard.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop every cached parse. Waits for in-flight requests to finish.
    pub fn reload(&self) {
        let _write = self
            .guard
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dropped = self.files.len();
        self.files.clear();
        tracing::debug!(dropped, "project parse cache cleared");
    }

    /// Absolute path for `path`, resolving relative paths against the root.
    pub fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn file_exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.resolve_path(path).is_file()
    }

    /// Path relative to the project root, `/`-separated.
    pub fn relative_path(&self, path: &Path) -> String {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        canonical
            .strip_prefix(&self.root)
            .unwrap_or(&canonical)
            .to_string_lossy()
            .replace('\\', "/")
    }

    pub fn is_test_path(&self, display_path: &str) -> bool {
        self.tests.is_match(display_path)
    }

    pub fn is_library_path(&self, display_path: &str) -> bool {
        self.libraries.is_match(display_path)
    }

    pub fn is_excluded(&self, display_path: &str) -> bool {
        self.excluded.is_match(display_path)
    }

    /// Parse a file through the adapter registered for its extension.
    ///
    /// Parses are cached and reused until the file changes on disk.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Arc<SourceFile>> {
        let path = self.resolve_path(path);
        let metadata = fs::metadata(&path).map_err(|_| Error::FileNotFound(path.clone()))?;
        if !metadata.is_file() {
            return Err(Error::FileNotFound(path));
        }
        let modified = metadata.modified().ok();

        if let Some(cached) = self.files.get(&path) {
            if cached.len == metadata.len() && cached.modified == modified {
                return Ok(Arc::clone(&cached.file));
            }
        }

        let adapter = languages::adapter_for_path(&path)?;
        let source = fs::read(&path)?;
        if std::str::from_utf8(&source).is_err() {
            return Err(Error::ParseFailure {
                path,
                message: "file is not valid UTF-8".to_string(),
            });
        }

        let display_path = self.relative_path(&path);
        let parsed = adapter
            .adapter
            .parse(&path, source)
            .map_err(|e| match e.downcast::<Error>() {
                Ok(typed) => typed,
                Err(other) => Error::ParseFailure {
                    path: path.clone(),
                    message: format!("{:#}", other),
                },
            })?
            .with_display_path(display_path);

        if parsed.has_errors() {
            tracing::debug!(path = %parsed.display_path, "parsed with syntax errors");
        }

        let file = Arc::new(parsed);
        self.files.insert(
            path,
            CachedFile {
                len: metadata.len(),
                modified,
                file: Arc::clone(&file),
            },
        );
        Ok(file)
    }

    /// All indexable files under the root, sorted, exclusions applied.
    pub fn all_files(&self) -> Vec<PathBuf> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let rel = self.relative_path(entry.path());
                !self.excluded.is_match(format!("{}/_", rel))
            });

        walker
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| !self.is_excluded(&self.relative_path(p)))
            .filter(|p| languages::language_for_path(p).is_some())
            .collect()
    }

    /// Indexable files whose extension is in `extensions`.
    pub fn files_with_extensions(&self, extensions: &[&str]) -> Vec<PathBuf> {
        self.all_files()
            .into_iter()
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| extensions.contains(&e))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Number of parses currently cached.
    pub fn cached_files(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with(files: &[(&str, &str)]) -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let project = Project::with_config(dir.path(), Config::default()).unwrap();
        (dir, project)
    }

    #[test]
    fn test_all_files_skips_excluded_and_unknown() {
        let (_dir, project) = project_with(&[
            ("src/A.java", "class A {}"),
            ("src/notes.txt", "hello"),
            ("node_modules/x/index.js", "var x;"),
            ("app/main.py", "x = 1\n"),
        ]);
        let files: Vec<String> = project
            .all_files()
            .iter()
            .map(|p| project.relative_path(p))
            .collect();
        assert_eq!(files, vec!["app/main.py", "src/A.java"]);
    }

    #[test]
    fn test_parse_file_is_cached() {
        let (_dir, project) = project_with(&[("A.java", "class A {}")]);
        let first = project.parse_file("A.java").unwrap();
        let second = project.parse_file("A.java").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.display_path, "A.java");

        project.reload();
        assert_eq!(project.cached_files(), 0);
    }

    #[test]
    fn test_parse_missing_file() {
        let (_dir, project) = project_with(&[]);
        assert!(matches!(
            project.parse_file("Missing.java"),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_parse_unsupported_extension() {
        let (_dir, project) = project_with(&[("main.go", "package main")]);
        match project.parse_file("main.go") {
            Err(Error::UnsupportedLanguage { language, hint }) => {
                assert_eq!(language, "Go");
                assert!(hint.unwrap().contains("tree-sitter-go"));
            }
            other => panic!("unexpected: {:?}", other.map(|f| f.display_path.clone())),
        }
    }

    #[test]
    fn test_test_and_library_paths() {
        let (_dir, project) = project_with(&[]);
        assert!(project.is_test_path("src/test/java/UserTest.java"));
        assert!(!project.is_test_path("src/main/java/User.java"));
        assert!(project.is_library_path("vendor/lib.py"));
    }
}
