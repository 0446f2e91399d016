//! Parsed source files.

use std::fmt;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Tree};

use super::model::Location;
use crate::error::{Error, Result};

/// Holds a parsed tree-sitter tree together with its text and line index.
///
/// Offsets handed to and returned from the index are byte offsets into
/// `source`.
pub struct SourceFile {
    /// The tree-sitter parse tree.
    pub tree: Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated.
    pub display_path: String,
    /// Display name of the dialect ("Java", "Kotlin", "TypeScript", ...).
    pub language: &'static str,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(tree: Tree, source: Vec<u8>, path: &Path, language: &'static str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            tree,
            source,
            path: path.to_path_buf(),
            display_path: path.to_string_lossy().replace('\\', "/"),
            language,
            line_starts,
        }
    }

    /// Replace the path shown in results.
    pub fn with_display_path(mut self, display_path: impl Into<String>) -> Self {
        self.display_path = display_path.into();
        self
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Get the source code as a string slice.
    pub fn source_str(&self) -> &str {
        std::str::from_utf8(&self.source).unwrap_or("")
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Text between two byte offsets, clamped to the file.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.source.len());
        let start = start.min(end);
        std::str::from_utf8(&self.source[start..end]).unwrap_or("")
    }

    /// 1-based line number containing `offset`.
    pub fn line_number_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(next) => next,
        }
    }

    /// Byte offset of a 1-based line and column.
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        let offset = self.unchecked_offset_of(line, column);
        (offset < self.source.len()).then_some(offset)
    }

    /// Offset a line and column would have, without a bounds check. Lines
    /// past the end map to the file length.
    pub fn unchecked_offset_of(&self, line: usize, column: usize) -> usize {
        line.checked_sub(1)
            .and_then(|l| self.line_starts.get(l))
            .map(|start| start + column.saturating_sub(1))
            .unwrap_or(self.source.len())
    }

    /// Trimmed text of the line containing `offset`.
    pub fn line_text(&self, offset: usize) -> &str {
        let line = self.line_number_of(offset);
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len());
        self.slice(start, end).trim()
    }

    pub fn text_range_of(&self, node: Node) -> (usize, usize) {
        (node.start_byte(), node.end_byte())
    }

    pub fn location_of(&self, node: Node) -> Location {
        self.location(node.start_byte(), node.end_byte())
    }

    pub fn location(&self, start: usize, end: usize) -> Location {
        let end = end.min(self.source.len());
        let start = start.min(end);
        Location {
            start_offset: start,
            end_offset: end,
            line_number: self.line_number_of(start),
        }
    }

    /// Fails with `PositionOutOfBounds` unless `offset` is inside the file.
    pub fn check_offset(&self, offset: usize) -> Result<()> {
        if offset >= self.source.len() {
            return Err(Error::PositionOutOfBounds {
                path: self.path.clone(),
                offset,
                length: self.source.len(),
            });
        }
        Ok(())
    }

    /// Smallest named node covering `offset`.
    ///
    /// When the offset sits on whitespace or punctuation right after a token
    /// (a cursor at the end of an identifier), the token before it is used.
    pub fn node_at_offset(&self, offset: usize) -> Option<Node<'_>> {
        let root = self.tree.root_node();
        let node = root.named_descendant_for_byte_range(offset, offset)?;
        if node.child_count() == 0 || offset == 0 {
            return Some(node);
        }
        let before = root.named_descendant_for_byte_range(offset - 1, offset - 1)?;
        if before.child_count() == 0 && before.end_byte() == offset {
            return Some(before);
        }
        Some(node)
    }

    /// Node of `kind` spanning exactly `start..end`.
    pub fn find_node(&self, start: usize, end: usize, kind: &str) -> Option<Node<'_>> {
        let mut node = self
            .tree
            .root_node()
            .descendant_for_byte_range(start, end)?;
        loop {
            if node.kind() == kind && node.start_byte() == start && node.end_byte() == end {
                return Some(node);
            }
            if node.start_byte() < start || node.end_byte() > end {
                return None;
            }
            node = node.parent()?;
        }
    }

    /// Returns `true` if the tree contains syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.display_path)
            .field("language", &self.language)
            .field("len", &self.source.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_java(source: &str) -> SourceFile {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        SourceFile::new(tree, source.as_bytes().to_vec(), Path::new("A.java"), "Java")
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let file = parse_java("class A {\n  int x;\n}\n");
        assert_eq!(file.line_number_of(0), 1);
        assert_eq!(file.line_number_of(10), 2);
        assert_eq!(file.line_number_of(12), 2);
        assert_eq!(file.line_number_of(19), 3);
    }

    #[test]
    fn test_offset_of_line_and_column() {
        let file = parse_java("class A {\n  int x;\n}\n");
        assert_eq!(file.offset_of(2, 7), Some(16));
        assert_eq!(file.offset_of(9, 1), None);
        assert_eq!(file.line_text(16), "int x;");
    }

    #[test]
    fn test_check_offset_bounds() {
        let file = parse_java("class A {}");
        assert!(file.check_offset(0).is_ok());
        assert!(file.check_offset(9).is_ok());
        match file.check_offset(10) {
            Err(Error::PositionOutOfBounds { offset, length, .. }) => {
                assert_eq!(offset, 10);
                assert_eq!(length, 10);
            }
            other => panic!("expected out of bounds, got {:?}", other),
        }
    }

    #[test]
    fn test_node_at_offset_prefers_identifier() {
        let file = parse_java("class Alpha { }");
        let node = file.node_at_offset(7).unwrap();
        assert_eq!(node.kind(), "identifier");
        assert_eq!(file.node_text(node), "Alpha");

        // cursor right after the identifier
        let node = file.node_at_offset(11).unwrap();
        assert_eq!(file.node_text(node), "Alpha");
    }

    #[test]
    fn test_find_node_by_range_and_kind() {
        let file = parse_java("class A { void m() {} }");
        let root = file.tree.root_node();
        let class = root.named_child(0).unwrap();
        let found = file
            .find_node(class.start_byte(), class.end_byte(), "class_declaration")
            .unwrap();
        assert_eq!(found.id(), class.id());
        assert!(file
            .find_node(class.start_byte(), class.end_byte(), "method_declaration")
            .is_none());
    }
}
