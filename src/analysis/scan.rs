//! Query-driven identifier scans.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

use super::source::SourceFile;

/// Compiled query capturing every identifier-like node of one grammar.
pub struct IdentifierScan {
    query: Query,
}

impl IdentifierScan {
    /// Compile `pattern`; every capture in it counts as an identifier.
    pub fn new(language: &Language, pattern: &str) -> anyhow::Result<Self> {
        let query = Query::new(language, pattern)?;
        Ok(Self { query })
    }

    /// Identifier nodes in `file` whose text is exactly `name`, in document order.
    pub fn matching<'t>(&self, file: &'t SourceFile, name: &str) -> Vec<Node<'t>> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, file.tree.root_node(), &file.source[..]);

        let mut found: Vec<Node<'t>> = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                if file.node_text(capture.node) == name {
                    found.push(capture.node);
                }
            }
        }
        found.sort_by_key(|n| n.start_byte());
        found.dedup_by_key(|n| n.id());
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_matching_finds_exact_names() {
        let language: Language = tree_sitter_java::LANGUAGE.into();
        let source = "class A { int count; void f() { count++; counter = count; } }";
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&language).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let file = SourceFile::new(tree, source.as_bytes().to_vec(), Path::new("A.java"), "JAVA");

        let scan = IdentifierScan::new(&language, "[(identifier) (type_identifier)] @name").unwrap();
        let hits = scan.matching(&file, "count");
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].start_byte() < w[1].start_byte()));
        assert_eq!(scan.matching(&file, "A").len(), 1);
    }
}
