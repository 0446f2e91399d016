//! Tests for the JSON output shape of each command's result.

use std::path::PathBuf;

use crosslens::report::{to_json, JsonReport};
use crosslens::{CodeIndex, GroupedReferencesResult, HoverInfo, ReferenceQuery, SymbolInfo};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

fn parse(json: &str) -> serde_json::Value {
    serde_json::from_str(json).expect("output should be valid JSON")
}

#[test]
fn test_symbols_json_is_camel_case() {
    let index = CodeIndex::open(fixture("jvm")).unwrap();
    let symbols = index
        .symbols(
            "src/main/java/com/acme/store/Order.java",
            &index.default_extraction(),
            true,
        )
        .unwrap();
    let value = parse(&to_json("symbols", "jvm", &symbols).unwrap());

    let order = &value["result"][0];
    assert_eq!(order["name"], "Order");
    assert_eq!(order["kind"], "class");
    assert_eq!(order["qualifiedName"], "com.acme.store.Order");
    assert!(order["lineNumber"].as_u64().unwrap() > 0);
    assert_eq!(order["documentation"]["present"], true);
    assert_eq!(order["documentation"]["format"], "javadoc");
    assert!(order["children"].as_array().unwrap().len() > 3);
}

#[test]
fn test_json_round_trips_through_records() {
    let index = CodeIndex::open(fixture("python")).unwrap();
    let symbols = index
        .symbols("shop/cart.py", &index.default_extraction(), false)
        .unwrap();
    let json = to_json("symbols", ".", &symbols).unwrap();
    let report: JsonReport<Vec<SymbolInfo>> = serde_json::from_str(&json).unwrap();
    assert_eq!(report.result, symbols);
    assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_references_json_shape() {
    let index = CodeIndex::open(fixture("web")).unwrap();
    let result = index
        .references(&ReferenceQuery::by_name("TodoStore.add"))
        .unwrap();
    let value = parse(&to_json("references", ".", &result).unwrap());

    let summary = &value["result"]["summary"];
    assert!(summary["totalReferences"].as_u64().unwrap() >= 3);
    assert_eq!(summary["hasTestUsages"], true);
    assert!(value["result"]["usagesByType"]["method_call"].is_array());
    let first = &value["result"]["allReferences"][0];
    assert!(first["filePath"].is_string());
    assert!(first["usageType"].is_string());

    let back: JsonReport<GroupedReferencesResult> =
        serde_json::from_value(value).unwrap();
    assert_eq!(back.result, result);
}

#[test]
fn test_hover_json_keeps_java_doc_key() {
    let mut hover = HoverInfo::new("addOrder", "method");
    hover.java_doc = Some("Store an order.".to_string());
    hover.type_name = Some("boolean".to_string());
    let value = parse(&to_json("hover", ".", Some(&hover)).unwrap());

    assert_eq!(value["result"]["javaDoc"], "Store an order.");
    assert_eq!(value["result"]["type"], "boolean");
    assert_eq!(value["result"]["elementType"], "method");
}
