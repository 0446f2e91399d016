//! Grouping and insight generation for reference searches.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::model::{GroupedReferencesResult, ReferenceInfo, ReferenceSummary, UsageType};
use super::outline::Element;

/// Minimum number of distinct files for the spread insight.
const SPREAD_FILE_THRESHOLD: usize = 3;

/// Group references by usage type and derive insights.
///
/// The three headline insights always come first and in this order: primary
/// usage cluster, missing test usage, deprecated usages. Further
/// observations follow.
pub fn group_references(references: Vec<ReferenceInfo>, target: &Element) -> GroupedReferencesResult {
    let mut usages_by_type: BTreeMap<UsageType, Vec<ReferenceInfo>> = BTreeMap::new();
    for reference in &references {
        usages_by_type
            .entry(reference.usage_type)
            .or_default()
            .push(reference.clone());
    }

    let files: HashSet<&str> = references.iter().map(|r| r.file_path.as_str()).collect();
    let summary = ReferenceSummary {
        total_references: references.len(),
        file_count: files.len(),
        has_test_usages: references.iter().any(|r| r.is_test_code),
    };

    let insights = generate_insights(&references, target, files.len());

    GroupedReferencesResult {
        summary,
        usages_by_type,
        insights,
        all_references: references,
    }
}

fn generate_insights(references: &[ReferenceInfo], target: &Element, file_count: usize) -> Vec<String> {
    let usages: Vec<&ReferenceInfo> = references
        .iter()
        .filter(|r| r.usage_type != UsageType::Declaration)
        .collect();
    let mut insights = Vec::new();

    if let Some((place, count)) = primary_cluster(&usages) {
        insights.push(format!("Primary usage in {} ({} calls)", place, count));
    }

    if !references.iter().any(|r| r.is_test_code) {
        insights.push("No test usage - add tests".to_string());
    }

    let deprecated = references.iter().filter(|r| r.is_deprecated_usage).count();
    if deprecated > 0 {
        insights.push(format!("{} deprecated usages", deprecated));
    }

    if target.is_deprecated && !usages.is_empty() {
        insights.push(format!(
            "Target is deprecated - {} usages to migrate",
            usages.len()
        ));
    }

    let writes = usages.iter().filter(|r| r.usage_type.is_write()).count();
    if writes > 0 {
        insights.push(format!("Mutated in {} places", writes));
    }

    let overrides = usages
        .iter()
        .filter(|r| r.usage_type == UsageType::MethodOverride)
        .filter_map(|r| r.containing_class.as_deref())
        .collect::<HashSet<_>>()
        .len();
    if overrides > 0 {
        insights.push(format!("Overridden in {} subtypes", overrides));
    }

    if file_count >= SPREAD_FILE_THRESHOLD {
        insights.push(format!("Used across {} files", file_count));
    }

    if usages.is_empty() {
        insights.push("No usages found - possibly unused".to_string());
    }

    insights
}

/// The containing class (or file, outside any class) holding a strict
/// majority of at least two usages.
fn primary_cluster(usages: &[&ReferenceInfo]) -> Option<(String, usize)> {
    if usages.len() < 2 {
        return None;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();
    for usage in usages {
        let place = usage
            .containing_class
            .clone()
            .unwrap_or_else(|| file_name(&usage.file_path).to_string());
        let count = counts.entry(place.clone()).or_insert(0);
        if *count == 0 {
            order.push(place);
        }
        *count += 1;
    }

    order
        .into_iter()
        .map(|place| {
            let count = counts[&place];
            (place, count)
        })
        .find(|(_, count)| count * 2 > usages.len())
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Location, SymbolKind};
    use crate::analysis::source::SourceFile;
    use std::path::Path;
    use std::sync::Arc;

    fn target(deprecated: bool) -> Element {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        let source = "class A { int count; }";
        let tree = parser.parse(source, None).unwrap();
        let file = Arc::new(SourceFile::new(
            tree,
            source.as_bytes().to_vec(),
            Path::new("A.java"),
            "JAVA",
        ));
        Element {
            file,
            start: 10,
            end: 20,
            name_start: 14,
            name_end: 19,
            node_kind: "field_declaration",
            name: "count".to_string(),
            kind: SymbolKind::Field,
            container: Some("A".to_string()),
            is_local: false,
            is_parameter: false,
            is_deprecated: deprecated,
        }
    }

    fn reference(file: &str, class: &str, usage: UsageType, test: bool) -> ReferenceInfo {
        ReferenceInfo {
            file_path: file.to_string(),
            location: Location {
                start_offset: 0,
                end_offset: 1,
                line_number: 1,
            },
            usage_type: usage,
            containing_method: Some("run".to_string()),
            containing_class: Some(class.to_string()),
            data_flow_context: None,
            is_test_code: test,
            is_deprecated_usage: false,
            preview: String::new(),
        }
    }

    #[test]
    fn test_empty_result_insights() {
        let result = group_references(Vec::new(), &target(false));
        assert_eq!(result.summary.total_references, 0);
        assert_eq!(
            result.insights,
            vec!["No test usage - add tests", "No usages found - possibly unused"]
        );
        assert!(result.usages_by_type.is_empty());
    }

    #[test]
    fn test_primary_usage_and_ordering() {
        let mut deprecated = reference("b/B.java", "B", UsageType::FieldRead, false);
        deprecated.is_deprecated_usage = true;
        let refs = vec![
            reference("a/A.java", "A", UsageType::FieldRead, false),
            reference("a/A.java", "A", UsageType::FieldWrite, false),
            reference("a/A.java", "A", UsageType::FieldIncrement, false),
            deprecated,
        ];
        let result = group_references(refs, &target(true));

        assert_eq!(result.summary.total_references, 4);
        assert_eq!(result.summary.file_count, 2);
        assert!(!result.summary.has_test_usages);
        assert_eq!(result.usages_by_type[&UsageType::FieldRead].len(), 2);
        assert!(!result.usages_by_type.contains_key(&UsageType::MethodCall));
        assert_eq!(
            result.insights,
            vec![
                "Primary usage in A (3 calls)",
                "No test usage - add tests",
                "1 deprecated usages",
                "Target is deprecated - 4 usages to migrate",
                "Mutated in 2 places",
            ]
        );
    }

    #[test]
    fn test_no_majority_no_primary() {
        let refs = vec![
            reference("a/A.java", "A", UsageType::FieldRead, true),
            reference("b/B.java", "B", UsageType::FieldRead, false),
            reference("c/C.java", "C", UsageType::FieldRead, false),
        ];
        let result = group_references(refs, &target(false));
        assert!(result.summary.has_test_usages);
        assert_eq!(result.insights, vec!["Used across 3 files"]);
    }

    #[test]
    fn test_declaration_not_counted_as_usage() {
        let refs = vec![reference("a/A.java", "A", UsageType::Declaration, false)];
        let result = group_references(refs, &target(false));
        assert_eq!(result.summary.total_references, 1);
        assert!(result
            .insights
            .contains(&"No usages found - possibly unused".to_string()));
    }
}
