//! Shared symbol extraction contract.
//!
//! Adapters produce an unfiltered outline; the filters here are applied
//! identically for every language, at every depth.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{SymbolInfo, SymbolKind, Visibility};
use super::outline::Outline;
use crate::config::ExtractionConfig;

/// Options for one extraction request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Kinds to keep; empty keeps every kind.
    pub kinds: BTreeSet<SymbolKind>,
    pub include_private: bool,
    /// Keep compiler/framework generated members (enum `values`, dataclass `__init__`, ...).
    pub include_generated: bool,
    pub include_imports: bool,
    /// Maximum hierarchy depth; `None` is unbounded, `Some(0)` behaves like `Some(1)`.
    pub max_depth: Option<usize>,
}

impl ExtractionOptions {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            kinds: BTreeSet::new(),
            include_private: config.include_private,
            include_generated: config.include_generated,
            include_imports: config.include_imports,
            max_depth: config.max_depth,
        }
    }

    /// Options that keep everything.
    pub fn everything() -> Self {
        Self {
            include_private: true,
            include_generated: true,
            include_imports: true,
            ..Self::default()
        }
    }

    pub fn with_kinds<I: IntoIterator<Item = SymbolKind>>(mut self, kinds: I) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    fn kind_matches(&self, kind: SymbolKind) -> bool {
        self.kinds.is_empty()
            || self
                .kinds
                .iter()
                .any(|k| k.as_str().eq_ignore_ascii_case(kind.as_str()))
    }

    /// Visibility, synthetic and import rules. A symbol failing these is
    /// dropped together with its subtree.
    fn admits(&self, symbol: &SymbolInfo) -> bool {
        if !self.include_private && symbol.visibility == Visibility::Private {
            return false;
        }
        if !self.include_generated && symbol.is_synthetic {
            return false;
        }
        if !self.include_imports && symbol.kind == SymbolKind::Import {
            return false;
        }
        true
    }
}

/// Hierarchical extraction over an outline.
pub fn hierarchical(outline: &Outline, options: &ExtractionOptions) -> Vec<SymbolInfo> {
    let filtered = filter_tree(outline.to_tree(), options);
    match options.max_depth {
        Some(depth) => limit_depth(&filtered, depth),
        None => filtered,
    }
}

/// Flat extraction over an outline, in document order.
pub fn flat(outline: &Outline, options: &ExtractionOptions) -> Vec<SymbolInfo> {
    let mut out = Vec::new();
    for symbol in filter_tree(outline.to_tree(), options) {
        flatten_into(symbol, &mut out);
    }
    out.sort_by_key(|s| s.location.start_offset);
    out
}

/// Apply the kind, visibility and synthetic filters at every depth.
///
/// A symbol rejected only by the kind filter is removed but its matching
/// descendants move up to take its place.
pub fn filter_tree(symbols: Vec<SymbolInfo>, options: &ExtractionOptions) -> Vec<SymbolInfo> {
    let mut out = Vec::new();
    for mut symbol in symbols {
        if !options.admits(&symbol) {
            continue;
        }
        let children = std::mem::take(&mut symbol.children);
        let children = filter_tree(children, options);
        if options.kind_matches(symbol.kind) {
            symbol.children = children;
            out.push(symbol);
        } else {
            out.extend(children);
        }
    }
    out
}

/// Copy of `symbols` with children beyond `max_depth` levels removed.
///
/// Depth 1 keeps only the given symbols (with no children); 0 is treated as 1.
/// Never touches a kept node's own fields, and applying it twice yields the
/// same tree.
pub fn limit_depth(symbols: &[SymbolInfo], max_depth: usize) -> Vec<SymbolInfo> {
    let depth = max_depth.max(1);
    symbols.iter().map(|s| truncate(s, depth)).collect()
}

fn truncate(symbol: &SymbolInfo, remaining: usize) -> SymbolInfo {
    let children = if remaining > 1 {
        symbol
            .children
            .iter()
            .map(|c| truncate(c, remaining - 1))
            .collect()
    } else {
        Vec::new()
    };
    SymbolInfo {
        children,
        ..symbol.clone_without_children()
    }
}

fn flatten_into(mut symbol: SymbolInfo, out: &mut Vec<SymbolInfo>) {
    let children = std::mem::take(&mut symbol.children);
    out.push(symbol);
    for child in children {
        flatten_into(child, out);
    }
}

impl SymbolInfo {
    /// Clone of this symbol's own fields with an empty `children` list.
    pub fn clone_without_children(&self) -> SymbolInfo {
        SymbolInfo {
            name: self.name.clone(),
            qualified_name: self.qualified_name.clone(),
            kind: self.kind,
            location: self.location,
            modifiers: self.modifiers.clone(),
            visibility: self.visibility,
            documentation: self.documentation.clone(),
            decorators: self.decorators.clone(),
            signature: self.signature.clone(),
            children: Vec::new(),
            is_synthetic: self.is_synthetic,
            is_deprecated: self.is_deprecated,
            is_async: self.is_async,
            is_generator: self.is_generator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::Location;

    fn sym(name: &str, kind: SymbolKind, visibility: Visibility, start: usize) -> SymbolInfo {
        let mut s = SymbolInfo::new(
            name,
            kind,
            Location {
                start_offset: start,
                end_offset: start + 1,
                line_number: 1,
            },
        );
        s.visibility = visibility;
        s
    }

    fn sample() -> Vec<SymbolInfo> {
        let mut service = sym("UserService", SymbolKind::Class, Visibility::Public, 0);
        let mut session = sym("Session", SymbolKind::Class, Visibility::Public, 50);
        session
            .children
            .push(sym("token", SymbolKind::Field, Visibility::Private, 60));
        session
            .children
            .push(sym("isValid", SymbolKind::Method, Visibility::Public, 70));
        let mut secret = sym("Secret", SymbolKind::Class, Visibility::Private, 80);
        secret
            .children
            .push(sym("reveal", SymbolKind::Method, Visibility::Public, 85));
        let mut values = sym("values", SymbolKind::Method, Visibility::Public, 90);
        values.is_synthetic = true;

        service
            .children
            .push(sym("users", SymbolKind::Field, Visibility::Private, 10));
        service
            .children
            .push(sym("addUser", SymbolKind::Method, Visibility::Public, 20));
        service.children.push(session);
        service.children.push(secret);
        service.children.push(values);
        vec![service]
    }

    #[test]
    fn test_private_filter_drops_subtree() {
        let options = ExtractionOptions::default();
        let tree = filter_tree(sample(), &options);
        let names: Vec<_> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["addUser", "Session"]);
        assert_eq!(tree[0].children[1].children.len(), 1);
    }

    #[test]
    fn test_kind_filter_promotes_descendants() {
        let options = ExtractionOptions::everything().with_kinds([SymbolKind::Method]);
        let tree = filter_tree(sample(), &options);
        let names: Vec<_> = tree.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["addUser", "isValid", "reveal", "values"]);
    }

    #[test]
    fn test_include_private_is_superset() {
        let mut all = Vec::new();
        for s in filter_tree(sample(), &ExtractionOptions::everything()) {
            flatten_into(s, &mut all);
        }
        let mut public = Vec::new();
        let options = ExtractionOptions {
            include_generated: true,
            ..ExtractionOptions::default()
        };
        for s in filter_tree(sample(), &options) {
            flatten_into(s, &mut public);
        }
        assert!(public.len() < all.len());
        for s in &public {
            assert!(all
                .iter()
                .any(|a| a.name == s.name && a.location == s.location));
        }
    }

    #[test]
    fn test_limit_depth_keeps_own_fields() {
        let tree = sample();
        let limited = limit_depth(&tree, 1);
        assert!(limited[0].children.is_empty());
        assert_eq!(limited[0].name, tree[0].name);
        assert_eq!(limited[0].visibility, tree[0].visibility);
        // source untouched
        assert_eq!(tree[0].children.len(), 5);

        let two = limit_depth(&tree, 2);
        assert_eq!(two[0].children.len(), 5);
        assert!(two[0].children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn test_limit_depth_is_idempotent() {
        let tree = sample();
        for depth in 0..4 {
            let once = limit_depth(&tree, depth);
            let twice = limit_depth(&once, depth);
            assert_eq!(once, twice);
        }
        assert_eq!(limit_depth(&tree, 0), limit_depth(&tree, 1));
    }
}
