//! Integration tests for the Python adapter against `testdata/python`.

use std::path::PathBuf;

use crosslens::{
    CodeIndex, ExtractionOptions, GroupedReferencesResult, ReferenceQuery, SymbolKind, UsageType,
    Visibility,
};

const CART: &str = "shop/cart.py";
const CHECKOUT: &str = "shop/checkout.py";
const STOCK: &str = "shop/stock.py";

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/python")
}

fn index() -> CodeIndex {
    CodeIndex::open(project_root()).expect("should open fixture project")
}

fn offset_of(file: &str, needle: &str, nth: usize) -> usize {
    let source = std::fs::read_to_string(project_root().join(file)).unwrap();
    source
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("{:?} not found in {}", needle, file))
}

#[test]
fn test_module_symbols() {
    let index = index();
    let symbols = index
        .symbols(CART, &ExtractionOptions::everything(), false)
        .unwrap();
    let find = |name: &str| {
        symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing {}", name))
    };

    let max_items = find("MAX_ITEMS");
    assert_eq!(max_items.kind, SymbolKind::Constant);
    assert!(max_items.is_deprecated);
    assert_eq!(find("default_owner").kind, SymbolKind::Variable);
    assert_eq!(find("CartState").kind, SymbolKind::Enum);
    assert_eq!(find("OPEN").kind, SymbolKind::EnumMember);
    assert_eq!(find("find_item").kind, SymbolKind::Function);
    assert_eq!(find("load_cart").kind, SymbolKind::AsyncFunction);
    assert!(find("load_cart").is_async);
    assert_eq!(find("iter_skus").kind, SymbolKind::Generator);
    assert!(find("iter_skus").is_generator);

    let cart = find("Cart");
    assert_eq!(cart.kind, SymbolKind::Class);
    assert_eq!(cart.qualified_name.as_deref(), Some("shop.cart.Cart"));
    assert!(cart.documentation.present);
}

#[test]
fn test_class_members_and_visibility() {
    let index = index();
    let symbols = index
        .symbols(CART, &ExtractionOptions::everything(), true)
        .unwrap();
    let cart = symbols.iter().find(|s| s.name == "Cart").unwrap();
    let member = |name: &str| {
        cart.children
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing member {}", name))
    };

    assert_eq!(member("__init__").kind, SymbolKind::Constructor);
    assert_eq!(member("add").kind, SymbolKind::Method);
    assert_eq!(member("size").kind, SymbolKind::Property);
    assert!(member("empty").has_modifier("staticmethod"));
    assert!(member("__len__").has_modifier("override"));
    assert_eq!(member("__len__").visibility, Visibility::Public);
    assert_eq!(member("__close").visibility, Visibility::Private);
    assert_eq!(member("owner").kind, SymbolKind::Field);
    assert_eq!(member("_state").visibility, Visibility::Protected);
    assert_eq!(member("currency").kind, SymbolKind::Field);
}

#[test]
fn test_default_options_drop_private_and_generated() {
    let index = index();
    let symbols = index
        .symbols(CART, &index.default_extraction(), false)
        .unwrap();

    assert!(!symbols.iter().any(|s| s.name == "__close"));
    assert!(!symbols.iter().any(|s| s.is_synthetic));
    assert!(!symbols.iter().any(|s| s.kind == SymbolKind::Import));
}

#[test]
fn test_dataclass_gets_synthetic_init() {
    let index = index();
    let symbols = index
        .symbols(CART, &ExtractionOptions::everything(), true)
        .unwrap();
    let item = symbols.iter().find(|s| s.name == "CartItem").unwrap();
    let init = item
        .children
        .iter()
        .find(|s| s.name == "__init__")
        .expect("synthetic __init__");
    assert!(init.is_synthetic);
    assert_eq!(init.kind, SymbolKind::Constructor);
}

#[test]
fn test_definition_of_imported_function() {
    let index = index();
    let offset = offset_of(CHECKOUT, "find_item(self.cart", 0);
    let found = index.definition_at(CHECKOUT, offset).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "find_item");
    assert_eq!(found[0].kind, SymbolKind::Function);
    assert_eq!(found[0].file_path, CART);
}

#[test]
fn test_definition_by_qualified_name() {
    let found = index().definitions_by_name("Cart.total").unwrap();
    assert_eq!(found[0].name, "total");
    assert_eq!(found[0].file_path, CART);
    assert_eq!(found[0].confidence, 1.0);
}

#[test]
fn test_partial_name_match() {
    let found = index().definitions_by_name("checkout").unwrap();
    assert!(found.iter().any(|d| d.name == "quick_checkout"));
    assert!(found.iter().any(|d| d.name == "Checkout"));
}

#[test]
fn test_references_to_method() {
    let result = index()
        .references(&ReferenceQuery::by_name("Cart.add"))
        .unwrap();

    assert!(result.summary.total_references >= 2);
    assert!(result.summary.has_test_usages);
    let calls = &result.usages_by_type[&UsageType::MethodCall];
    assert!(calls.iter().any(|r| r.file_path == CHECKOUT));
    assert!(calls
        .iter()
        .any(|r| r.file_path == "tests/test_cart.py" && r.is_test_code));
}

#[test]
fn test_references_to_constructor_calls() {
    let result = index()
        .references(&ReferenceQuery::by_name("Cart"))
        .unwrap();
    let constructions = &result.usages_by_type[&UsageType::ConstructorCall];
    assert!(constructions.len() >= 3);
}

#[test]
fn test_hover_on_method_with_raises() {
    let index = index();
    let offset = offset_of(CART, "def add", 0) + "def ".len();
    let hover = index.hover_at(CART, offset).unwrap().expect("hover");

    assert_eq!(hover.element_name, "add");
    assert_eq!(hover.element_type, "method");
    assert_eq!(hover.complexity, Some(2));
    assert!(hover.throws_exceptions.contains(&"ValueError".to_string()));
    assert_eq!(hover.module.as_deref(), Some("shop.cart"));
}

#[test]
fn test_hover_on_property_and_instance_variable() {
    let index = index();
    let size = offset_of(CART, "def size", 0) + "def ".len();
    let hover = index.hover_at(CART, size).unwrap().expect("hover");
    assert_eq!(hover.element_type, "property");

    let owner = offset_of(CART, "self.owner", 0) + "self.".len();
    let hover = index.hover_at(CART, owner).unwrap().expect("hover");
    assert_eq!(hover.element_name, "owner");
    assert_eq!(hover.element_type, "instance variable");
}

#[test]
fn test_hover_on_parameter() {
    let index = index();
    let offset = offset_of(CART, "sku: str) -> Optional", 0);
    let hover = index.hover_at(CART, offset).unwrap().expect("hover");
    assert_eq!(hover.element_type, "parameter");
    assert_eq!(hover.type_name.as_deref(), Some("str"));
}

fn usages(result: &GroupedReferencesResult, usage: UsageType) -> usize {
    result
        .usages_by_type
        .get(&usage)
        .map(Vec::len)
        .unwrap_or(0)
}

#[test]
fn test_module_qualified_name_finds_references() {
    let index = index();
    let definitions = index.definitions_by_name("cart.find_item").unwrap();
    assert_eq!(definitions[0].name, "find_item");
    assert_eq!(definitions[0].confidence, 1.0);

    let qualified = index
        .references(&ReferenceQuery::by_name("cart.find_item"))
        .unwrap();
    let bare = index
        .references(&ReferenceQuery::by_name("find_item"))
        .unwrap();
    assert!(!qualified.is_not_found());
    assert_eq!(
        qualified.summary.total_references,
        bare.summary.total_references
    );
    assert!(qualified.summary.total_references >= 1);
}

#[test]
fn test_instance_field_reads_writes_and_increments() {
    let result = index()
        .references(&ReferenceQuery::by_name("Stock.units"))
        .unwrap();

    assert_eq!(usages(&result, UsageType::FieldWrite), 1);
    assert_eq!(usages(&result, UsageType::FieldIncrement), 1);
    assert!(usages(&result, UsageType::FieldRead) >= 3);
    assert!(result.insights.iter().any(|i| i == "Mutated in 2 places"));

    let reads = &result.usages_by_type[&UsageType::FieldRead];
    let in_loop = reads
        .iter()
        .find(|r| r.preview == "if self.units < 100:")
        .expect("read inside the loop");
    assert_eq!(in_loop.containing_method.as_deref(), Some("receive"));
    assert_eq!(in_loop.data_flow_context.as_deref(), Some("used in condition"));
    assert!(reads
        .iter()
        .any(|r| r.data_flow_context.as_deref() == Some("passed as argument")));
}

#[test]
fn test_accessor_and_static_calls() {
    let index = index();
    let getter = index
        .references(&ReferenceQuery::by_name("Stock.get_units"))
        .unwrap();
    assert_eq!(usages(&getter, UsageType::GetterCall), 1);

    let setter = index
        .references(&ReferenceQuery::by_name("Stock.set_code"))
        .unwrap();
    assert_eq!(usages(&setter, UsageType::SetterCall), 1);

    let factory = index
        .references(&ReferenceQuery::by_name("Stock.blank"))
        .unwrap();
    let calls = &factory.usages_by_type[&UsageType::StaticMethodCall];
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].file_path, STOCK);
}

#[test]
fn test_hover_on_class_variable_deprecated_in_docstring() {
    let index = index();
    let offset = offset_of(STOCK, "reserved = 0", 0);
    let hover = index.hover_at(STOCK, offset).unwrap().expect("hover");

    assert_eq!(hover.element_name, "reserved");
    assert!(hover.is_deprecated);
    assert_eq!(
        hover.deprecation_message.as_deref(),
        Some("Deprecated: reservations live on the order now.")
    );
}
