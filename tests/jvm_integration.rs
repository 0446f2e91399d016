//! Integration tests for the JVM adapter against the `testdata/jvm` project.

use std::path::PathBuf;

use crosslens::{
    CodeIndex, ExtractionOptions, GroupedReferencesResult, ReferenceQuery, SymbolKind, UsageType,
    Visibility,
};

const SERVICE: &str = "src/main/java/com/acme/store/OrderService.java";
const ORDER: &str = "src/main/java/com/acme/store/Order.java";
const SERVICE_TEST: &str = "src/test/java/com/acme/store/OrderServiceTest.java";
const PRICING: &str = "src/main/kotlin/com/acme/store/Pricing.kt";
const INVENTORY: &str = "src/main/java/com/acme/store/Inventory.java";
const INVENTORY_REPORT: &str = "src/main/java/com/acme/store/InventoryReport.java";
const SHELF: &str = "src/main/kotlin/com/acme/store/Shelf.kt";

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/jvm")
}

fn index() -> CodeIndex {
    CodeIndex::open(project_root()).expect("should open fixture project")
}

/// Byte offset of the `nth` occurrence of `needle` in a fixture file.
fn offset_of(file: &str, needle: &str, nth: usize) -> usize {
    let source = std::fs::read_to_string(project_root().join(file)).unwrap();
    source
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("{:?} not found in {}", needle, file))
}

#[test]
fn test_java_hierarchical_symbols_hide_private_members() {
    let index = index();
    let symbols = index
        .symbols(SERVICE, &index.default_extraction(), true)
        .unwrap();

    assert_eq!(symbols.len(), 1, "imports are excluded by default");
    let service = &symbols[0];
    assert_eq!(service.name, "OrderService");
    assert_eq!(service.kind, SymbolKind::Class);
    assert_eq!(
        service.qualified_name.as_deref(),
        Some("com.acme.store.OrderService")
    );

    let names: Vec<&str> = service.children.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"DEFAULT_CURRENCY"));
    assert!(names.contains(&"addOrder"));
    assert!(names.contains(&"isValid"));
    assert!(!names.contains(&"reset"), "private method leaked");
    assert!(!names.contains(&"orders"), "private field leaked");

    let status = service
        .children
        .iter()
        .find(|c| c.name == "Status")
        .expect("nested enum");
    assert_eq!(status.kind, SymbolKind::Enum);
    let constants: Vec<&str> = status.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(constants, vec!["OPEN", "PAID", "SHIPPED"]);
}

#[test]
fn test_java_flat_symbols_with_everything() {
    let index = index();
    let symbols = index
        .symbols(SERVICE, &ExtractionOptions::everything(), false)
        .unwrap();

    assert!(symbols.iter().all(|s| s.children.is_empty()));
    assert!(symbols
        .iter()
        .any(|s| s.kind == SymbolKind::Import && s.name == "java.util.HashMap"));
    let reset = symbols.iter().find(|s| s.name == "reset").unwrap();
    assert_eq!(reset.visibility, Visibility::Private);
    assert!(symbols
        .iter()
        .any(|s| s.name == "values" && s.is_synthetic));

    let constant = symbols
        .iter()
        .find(|s| s.name == "DEFAULT_CURRENCY")
        .unwrap();
    assert_eq!(constant.kind, SymbolKind::Constant);
    assert!(constant.has_modifier("static"));
    assert!(constant.has_modifier("final"));
}

#[test]
fn test_java_kind_filter() {
    let index = index();
    let options = index
        .default_extraction()
        .with_kinds([SymbolKind::Method]);
    let symbols = index.symbols(ORDER, &options, false).unwrap();

    assert!(!symbols.is_empty());
    assert!(symbols.iter().all(|s| s.kind == SymbolKind::Method));
    let legacy = symbols.iter().find(|s| s.name == "legacyTotal").unwrap();
    assert!(legacy.is_deprecated);
}

#[test]
fn test_definition_by_name_qualified() {
    let found = index().definitions_by_name("OrderService.addOrder").unwrap();

    let best = &found[0];
    assert_eq!(best.name, "addOrder");
    assert_eq!(best.kind, SymbolKind::Method);
    assert_eq!(best.file_path, SERVICE);
    assert_eq!(best.confidence, 1.0);
    assert_eq!(best.disambiguation_hint, "Method in OrderService");
    assert!(!best.is_test_code);
}

#[test]
fn test_definition_by_name_ranks_types_first() {
    let found = index().definitions_by_name("Order").unwrap();
    assert_eq!(found[0].name, "Order");
    assert_eq!(found[0].kind, SymbolKind::Class);
    assert!(found
        .windows(2)
        .all(|pair| pair[0].confidence >= pair[1].confidence));
}

#[test]
fn test_definition_at_call_site_in_test() {
    let index = index();
    let offset = offset_of(SERVICE_TEST, "addOrder", 0);
    let found = index.definition_at(SERVICE_TEST, offset).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "addOrder");
    assert_eq!(found[0].file_path, SERVICE);
}

#[test]
fn test_definition_at_out_of_bounds() {
    let err = index().definition_at(SERVICE, 1_000_000).unwrap_err();
    assert!(matches!(err, crosslens::Error::PositionOutOfBounds { .. }));
}

#[test]
fn test_references_by_name_include_tests() {
    let result = index()
        .references(&ReferenceQuery::by_name("OrderService.addOrder"))
        .unwrap();

    assert!(result.summary.total_references >= 2);
    assert!(result.summary.has_test_usages);
    assert!(result.usages_by_type.contains_key(&UsageType::MethodCall));
    assert!(!result
        .insights
        .iter()
        .any(|i| i == "No test usage - add tests"));
    assert!(result
        .all_references
        .iter()
        .any(|r| r.file_path == SERVICE_TEST && r.containing_method.as_deref() == Some("storesOrders")));
}

#[test]
fn test_references_include_declaration_flag() {
    let index = index();
    let without = index
        .references(&ReferenceQuery::by_name("OrderService.addOrder"))
        .unwrap();
    let with = index
        .references(&ReferenceQuery::by_name("OrderService.addOrder").include_declaration(true))
        .unwrap();

    assert!(!without.usages_by_type.contains_key(&UsageType::Declaration));
    assert_eq!(with.usages_by_type[&UsageType::Declaration].len(), 1);
    assert_eq!(
        with.summary.total_references,
        without.summary.total_references + 1
    );
}

#[test]
fn test_references_to_overridden_method() {
    let offset = offset_of("src/main/java/com/acme/store/Auditable.java", "touch", 0);
    let query = ReferenceQuery::at_position(
        project_root().join("src/main/java/com/acme/store/Auditable.java"),
        offset,
    );
    let result = index().references(&query).unwrap();

    let overrides = &result.usages_by_type[&UsageType::MethodOverride];
    let classes: Vec<&str> = overrides
        .iter()
        .filter_map(|r| r.containing_class.as_deref())
        .collect();
    assert!(classes.contains(&"Order"));
    assert!(result.insights.iter().any(|i| i.starts_with("Overridden in")));
}

#[test]
fn test_references_max_results_truncates() {
    let result = index()
        .references(&ReferenceQuery::by_name("Order").max_results(Some(1)))
        .unwrap();
    assert_eq!(result.all_references.len(), 1);
    assert_eq!(result.summary.total_references, 1);
}

#[test]
fn test_hover_on_class() {
    let index = index();
    let offset = offset_of(ORDER, "Order implements", 0);
    let hover = index.hover_at(ORDER, offset).unwrap().expect("hover");

    assert_eq!(hover.element_name, "Order");
    assert_eq!(hover.element_type, "class");
    assert_eq!(hover.module.as_deref(), Some("com.acme.store"));
    assert_eq!(hover.since.as_deref(), Some("2.1"));
    assert!(hover.super_types.contains(&"Auditable".to_string()));
    assert!(hover.implemented_by.contains(&"FrozenOrder".to_string()));
    assert!(hover.java_doc.as_deref().unwrap().contains("A customer order."));
}

#[test]
fn test_hover_on_method_with_throws_and_complexity() {
    let index = index();
    let offset = offset_of(SERVICE, "addOrder(Order order)", 0);
    let hover = index.hover_at(SERVICE, offset).unwrap().expect("hover");

    assert_eq!(hover.element_type, "method");
    assert_eq!(hover.complexity, Some(3));
    assert!(hover
        .throws_exceptions
        .contains(&"IllegalArgumentException".to_string()));
    assert!(hover.called_by_count >= 2);
    assert!(!hover.is_deprecated);
}

#[test]
fn test_hover_on_deprecated_method() {
    let index = index();
    let offset = offset_of(ORDER, "legacyTotal", 0);
    let hover = index.hover_at(ORDER, offset).unwrap().expect("hover");
    assert!(hover.is_deprecated);
    assert!(hover.deprecation_message.is_some());
}

#[test]
fn test_hover_on_whitespace_is_none() {
    let index = index();
    let hover = index.hover_at(SERVICE, 0).unwrap();
    assert!(hover.is_none());
}

#[test]
fn test_kotlin_symbols() {
    let index = index();
    let symbols = index
        .symbols(PRICING, &ExtractionOptions::everything(), false)
        .unwrap();
    let find = |name: &str| {
        symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing {}", name))
    };

    assert_eq!(find("Pricing").kind, SymbolKind::Class);
    assert_eq!(find("priceOf").kind, SymbolKind::Method);
    assert_eq!(find("currency").kind, SymbolKind::Property);
    assert_eq!(find("discount").visibility, Visibility::PackagePrivate);
    assert_eq!(find("MAX_DISCOUNT").kind, SymbolKind::Constant);
    assert_eq!(find("PriceFormatter").kind, SymbolKind::Object);
    assert_eq!(find("quoteFor").kind, SymbolKind::Function);
    assert!(find("Quote").has_modifier("data"));
}

#[test]
fn test_kotlin_hover_reads_throws_annotation() {
    let index = index();
    let offset = offset_of(PRICING, "checkout", 0);
    let hover = index.hover_at(PRICING, offset).unwrap().expect("hover");
    assert_eq!(hover.element_name, "checkout");
    assert!(hover
        .throws_exceptions
        .contains(&"IllegalStateException".to_string()));
}

fn usages(result: &GroupedReferencesResult, usage: UsageType) -> usize {
    result
        .usages_by_type
        .get(&usage)
        .map(Vec::len)
        .unwrap_or(0)
}

#[test]
fn test_java_field_reads_writes_and_increments() {
    let result = index()
        .references(&ReferenceQuery::by_name("Inventory.count"))
        .unwrap();

    assert_eq!(usages(&result, UsageType::FieldWrite), 1);
    assert_eq!(usages(&result, UsageType::FieldIncrement), 2);
    assert!(usages(&result, UsageType::FieldRead) >= 3);
    assert!(result.insights.iter().any(|i| i == "Mutated in 3 places"));

    let reads = &result.usages_by_type[&UsageType::FieldRead];
    let in_loop = reads
        .iter()
        .find(|r| r.preview.starts_with("if (count < LOW_WATER)"))
        .expect("read inside the loop");
    assert_eq!(in_loop.containing_method.as_deref(), Some("restockAll"));
    assert_eq!(in_loop.data_flow_context.as_deref(), Some("used in condition"));

    let contexts: Vec<&str> = reads
        .iter()
        .filter_map(|r| r.data_flow_context.as_deref())
        .collect();
    assert!(contexts.contains(&"passed as argument"));
    assert!(contexts.contains(&"returned from method"));
}

#[test]
fn test_java_accessor_and_static_calls() {
    let index = index();

    let getter = index
        .references(&ReferenceQuery::by_name("Inventory.getCount"))
        .unwrap();
    let calls = &getter.usages_by_type[&UsageType::GetterCall];
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].file_path, INVENTORY_REPORT);
    assert_eq!(calls[0].containing_method.as_deref(), Some("describe"));

    let setter = index
        .references(&ReferenceQuery::by_name("Inventory.setLabel"))
        .unwrap();
    assert_eq!(usages(&setter, UsageType::SetterCall), 1);

    let factory = index
        .references(&ReferenceQuery::by_name("Inventory.empty"))
        .unwrap();
    assert_eq!(usages(&factory, UsageType::StaticMethodCall), 1);

    let ty = index
        .references(&ReferenceQuery::by_name("Inventory"))
        .unwrap();
    assert!(ty.usages_by_type[&UsageType::TypeReference]
        .iter()
        .any(|r| r.file_path == INVENTORY_REPORT));
    assert_eq!(usages(&ty, UsageType::ConstructorCall), 1);
}

#[test]
fn test_kotlin_property_increments() {
    let result = index()
        .references(&ReferenceQuery::by_name("Shelf.size"))
        .unwrap();

    assert_eq!(usages(&result, UsageType::FieldWrite), 1);
    assert_eq!(usages(&result, UsageType::FieldIncrement), 4);
    assert!(usages(&result, UsageType::FieldRead) >= 3);
    assert!(result.insights.iter().any(|i| i == "Mutated in 5 places"));

    let increments = &result.usages_by_type[&UsageType::FieldIncrement];
    assert!(increments.iter().all(|r| r.file_path == SHELF));
    assert!(increments.iter().any(|r| r.preview == "size++"));
    assert!(increments.iter().any(|r| r.preview == "--size"));
    assert!(result.usages_by_type[&UsageType::FieldRead]
        .iter()
        .any(|r| r.data_flow_context.as_deref() == Some("passed as argument")));
}

#[test]
fn test_hover_on_field_deprecated_in_doc_only() {
    let index = index();
    let offset = offset_of(INVENTORY, "reserved", 0);
    let hover = index.hover_at(INVENTORY, offset).unwrap().expect("hover");

    assert_eq!(hover.element_name, "reserved");
    assert_eq!(hover.element_type, "field");
    assert!(hover.is_deprecated);
    assert_eq!(
        hover.deprecation_message.as_deref(),
        Some("Deprecated: reservations are tracked on the order now.")
    );
}
