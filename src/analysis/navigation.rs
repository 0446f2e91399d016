//! Language-neutral helpers for walking tree-sitter trees.

use tree_sitter::Node;

/// Iterate a node's ancestors, innermost first (excluding the node itself).
pub fn ancestors<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    std::iter::successors(node.parent(), |n| n.parent())
}

/// Nearest ancestor (or the node itself) whose kind is in `kinds`.
pub fn enclosing<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    ancestors(node).find(|n| kinds.contains(&n.kind()))
}

/// Nearest strict ancestor whose kind is in `kinds`.
pub fn enclosing_strict<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    ancestors(node).find(|n| kinds.contains(&n.kind()))
}

pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).collect();
    found
}

pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).collect();
    found
}

pub fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

pub fn children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .filter(|c| c.kind() == kind)
        .collect();
    found
}

/// Returns `true` if any direct child is the anonymous token `token`.
pub fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// Pre-order visit of `node` and its descendants.
///
/// The visitor returns `false` to skip a node's children.
pub fn visit<'t, F>(node: Node<'t>, mut visitor: F)
where
    F: FnMut(Node<'t>) -> bool,
{
    let mut cursor = node.walk();
    let mut descend = visitor(node);
    loop {
        if descend && cursor.goto_first_child() {
            descend = visitor(cursor.node());
            continue;
        }
        loop {
            if cursor.node().id() == node.id() {
                return;
            }
            if cursor.goto_next_sibling() {
                descend = visitor(cursor.node());
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// All descendants (including `node`) whose kind is in `kinds`.
pub fn descendants_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    visit(node, |n| {
        if kinds.contains(&n.kind()) {
            found.push(n);
        }
        true
    });
    found
}

/// Returns `true` if `node` lies inside `ancestor` (or is it).
pub fn is_within(node: Node, ancestor: Node) -> bool {
    node.start_byte() >= ancestor.start_byte() && node.end_byte() <= ancestor.end_byte()
}

/// Returns `true` if `node` is the `field` child of `parent`.
pub fn is_field_of(node: Node, parent: Node, field: &str) -> bool {
    parent
        .child_by_field_name(field)
        .map(|c| c.id() == node.id())
        .unwrap_or(false)
}

/// Comment siblings directly above `node`, nearest last.
///
/// Stops at the first non-comment sibling or at a blank line gap.
pub fn preceding_comments<'t>(node: Node<'t>, comment_kinds: &[&str]) -> Vec<Node<'t>> {
    let mut comments = Vec::new();
    let mut current = node;
    while let Some(prev) = current.prev_sibling() {
        if !comment_kinds.contains(&prev.kind()) {
            break;
        }
        if current.start_position().row > prev.end_position().row + 1 {
            break;
        }
        comments.push(prev);
        current = prev;
    }
    comments.reverse();
    comments
}

/// Strip generic arguments and qualifiers: `java.util.List<String>` -> `List`.
pub fn simple_type_name(text: &str) -> String {
    let base = text.split('<').next().unwrap_or(text);
    let base = base.split('[').next().unwrap_or(base);
    let base = base.trim().trim_end_matches('?').trim_end_matches("...");
    base.rsplit('.').next().unwrap_or(base).trim().to_string()
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_python(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_visit_is_preorder_and_skips() {
        let tree = parse_python("def f():\n    if x:\n        pass\n");
        let mut kinds = Vec::new();
        visit(tree.root_node(), |n| {
            kinds.push(n.kind());
            n.kind() != "if_statement"
        });
        assert_eq!(kinds[0], "module");
        assert!(kinds.contains(&"if_statement"));
        assert!(!kinds.contains(&"pass_statement"));
    }

    #[test]
    fn test_descendants_of_kind() {
        let tree = parse_python("a = 1\nb = 2\ndef f():\n    c = 3\n");
        let assigns = descendants_of_kind(tree.root_node(), &["assignment"]);
        assert_eq!(assigns.len(), 3);
    }

    #[test]
    fn test_enclosing_finds_function() {
        let source = "def outer():\n    value = 1\n";
        let tree = parse_python(source);
        let node = tree
            .root_node()
            .named_descendant_for_byte_range(17, 17)
            .unwrap();
        let func = enclosing(node, &["function_definition"]).unwrap();
        assert_eq!(func.start_byte(), 0);
    }

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("java.util.List<String>"), "List");
        assert_eq!(simple_type_name("String[]"), "String");
        assert_eq!(simple_type_name("User?"), "User");
        assert_eq!(simple_type_name("Object..."), "Object");
    }
}
