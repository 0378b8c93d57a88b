use serde_json::json;

use smt_engine::chain::TransformChain;
use smt_engine::codec::{decode_line, encode_line};
use smt_engine::config::ChainConfig;
use smt_engine::registry::TransformRegistry;

fn registry() -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    for descriptor in [
        smt_transform_identity::descriptor(),
        smt_transform_integrity::descriptor(),
        smt_transform_rename_field::descriptor(),
        smt_transform_purchase_items::descriptor(),
        smt_transform_purchase_items::merged_descriptor(),
    ] {
        registry.register(descriptor).unwrap();
    }
    registry
}

const CHAIN: &str = r#"
[[transforms]]
name = "noop"
type = "identity"

[[transforms]]
name = "expand"
type = "purchase-items-merged"
[transforms.config]
field = "items"

[[transforms]]
name = "rename"
type = "rename-field"
[transforms.config]
"field.current" = "customer"
"field.new" = "buyer"

[[transforms]]
name = "checksum"
type = "integrity"
[transforms.config]
field = "digest"

[[transforms]]
name = "key-checksum"
type = "integrity"
operand = "key"
[transforms.config]
field = "key_digest"
"#;

fn chain() -> TransformChain {
    TransformChain::build(&ChainConfig::parse(CHAIN).unwrap(), &registry()).unwrap()
}

fn purchase(items: &str) -> String {
    json!({
        "topic": "purchases",
        "timestamp": 1700000000000i64,
        "key": {"order": "o-1"},
        "value_schema": {
            "name": "purchase",
            "version": 2,
            "fields": [
                {"name": "id", "field_type": {"scalar": "int32"}},
                {"name": "customer", "field_type": {"scalar": "string"}},
                {"name": "items", "field_type": {"scalar": "string"}, "optional": true}
            ]
        },
        "value": {"id": 1, "customer": "ada", "items": items}
    })
    .to_string()
}

#[test]
fn full_chain_over_a_structured_record() {
    let chain = chain();
    assert_eq!(chain.len(), 5);

    let items = r#"[{"item_id":1,"name":"x","price":3},{"item_id":1,"name":"x","price":2},{"item_id":2,"name":"y","price":7}]"#;
    let record = decode_line(&purchase(items)).unwrap();
    let out = chain.apply(record).unwrap();
    let line: serde_json::Value = serde_json::from_str(&encode_line(&out).unwrap()).unwrap();

    let names: Vec<&str> = line["value_schema"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["id", "items", "buyer", "digest"]);
    assert_eq!(line["value_schema"]["name"], "purchase");
    assert_eq!(line["value_schema"]["version"], 2);

    assert_eq!(line["value"]["buyer"], "ada");
    assert_eq!(
        line["value"]["items"],
        json!([
            {"item_id": 1, "name": "x", "price": 5},
            {"item_id": 2, "name": "y", "price": 7}
        ])
    );
    let digest = line["value"]["digest"].as_str().unwrap();
    assert_eq!(digest.len(), 64);

    assert_eq!(line["key"]["order"], "o-1");
    assert_eq!(line["key"]["key_digest"].as_str().unwrap().len(), 64);
    assert_eq!(line["timestamp"], 1700000000000i64);
}

#[test]
fn digest_is_reproducible_across_runs() {
    let items = r#"[{"item_id":2,"name":"y","price":7}]"#;
    let first = encode_line(&chain().apply(decode_line(&purchase(items)).unwrap()).unwrap()).unwrap();
    let second = encode_line(&chain().apply(decode_line(&purchase(items)).unwrap()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn malformed_items_still_flow_through_the_rest_of_the_chain() {
    let out = chain()
        .apply(decode_line(&purchase("[oops")).unwrap())
        .unwrap();
    let line: serde_json::Value = serde_json::from_str(&encode_line(&out).unwrap()).unwrap();
    assert_eq!(line["value"]["items"], "[oops");
    assert_eq!(line["value"]["buyer"], "ada");
    assert!(line["value"]["digest"].is_string());
}

#[test]
fn tombstones_pass_through_every_stage() {
    let record = decode_line(r#"{"topic": "purchases", "key": {"order": "o-9"}, "value": null}"#).unwrap();
    let out = chain().apply(record).unwrap();
    assert_eq!(out.value, None);
    let line: serde_json::Value = serde_json::from_str(&encode_line(&out).unwrap()).unwrap();
    assert_eq!(line["value"], serde_json::Value::Null);
    assert!(line["key"]["key_digest"].is_string());
}
