#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use indexmap::IndexMap;
use serde_json::json;
use std::fs;

fn schema(value: serde_json::Value) -> Schema {
    serde_json::from_value(value).unwrap()
}

fn components(value: serde_json::Value) -> IndexMap<String, Schema> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_kind_primitives() {
    assert_eq!(
        schema(json!({"type": "string"})).kind(),
        SchemaKind::Primitive(Primitive::String)
    );
    assert_eq!(
        schema(json!({"type": "string", "format": "date-time"})).kind(),
        SchemaKind::Primitive(Primitive::DateTime)
    );
    assert_eq!(
        schema(json!({"type": "string", "format": "uuid"})).kind(),
        SchemaKind::Primitive(Primitive::String)
    );
    assert_eq!(
        schema(json!({"type": "integer"})).kind(),
        SchemaKind::Primitive(Primitive::Integer)
    );
    assert_eq!(schema(json!({"type": "null"})).kind(), SchemaKind::Null);
    assert_eq!(schema(json!({})).kind(), SchemaKind::Dynamic);
}

#[test]
fn test_kind_two_branch_null_union_is_nullable() {
    let s = schema(json!({"anyOf": [{"type": "string"}, {"type": "null"}]}));
    match s.kind() {
        SchemaKind::Nullable(inner) => {
            assert_eq!(inner.kind(), SchemaKind::Primitive(Primitive::String))
        }
        other => panic!("expected nullable, got {other:?}"),
    }
}

#[test]
fn test_kind_type_list_with_null_is_nullable() {
    let s = schema(json!({"type": ["integer", "null"]}));
    match s.kind() {
        SchemaKind::Nullable(inner) => {
            assert_eq!(inner.kind(), SchemaKind::Primitive(Primitive::Integer))
        }
        other => panic!("expected nullable, got {other:?}"),
    }
}

#[test]
fn test_kind_wide_unions_are_not_nullability() {
    let three = schema(json!({"anyOf": [
        {"type": "string"}, {"type": "integer"}, {"type": "boolean"}
    ]}));
    assert_eq!(three.kind(), SchemaKind::Union { nullable: false });

    let with_null = schema(json!({"oneOf": [
        {"type": "string"}, {"type": "integer"}, {"type": "null"}
    ]}));
    assert_eq!(with_null.kind(), SchemaKind::Union { nullable: true });

    let types = schema(json!({"type": ["string", "integer"]}));
    assert_eq!(types.kind(), SchemaKind::Union { nullable: false });
}

#[test]
fn test_kind_enum_and_objects() {
    assert_eq!(
        schema(json!({"type": "string", "enum": ["in_progress", "done"]})).kind(),
        SchemaKind::Enum(vec!["in_progress".into(), "done".into()])
    );
    assert_eq!(
        schema(json!({"type": "integer", "enum": [1, 2]})).kind(),
        SchemaKind::Primitive(Primitive::Integer)
    );
    assert_eq!(
        schema(json!({"properties": {"a": {"type": "string"}}})).kind(),
        SchemaKind::Object
    );
    assert_eq!(
        schema(json!({"type": "object", "title": "Empty"})).kind(),
        SchemaKind::Object
    );
    assert_eq!(
        schema(json!({"title": "Marker", "description": "Opaque."})).kind(),
        SchemaKind::Object
    );
    assert_eq!(schema(json!({"type": "object"})).kind(), SchemaKind::OpenObject);
    assert!(matches!(
        schema(json!({"type": "object", "additionalProperties": {"type": "integer"}})).kind(),
        SchemaKind::Map(_)
    ));
    assert_eq!(
        schema(json!({"type": "array"})).kind(),
        SchemaKind::Array(None)
    );
}

#[test]
fn test_extra_keywords_round_trip_in_order() {
    let s = schema(json!({"type": "integer", "minimum": 1, "default": 5, "x-mcpgen-omittable": true}));
    assert!(s.is_omittable());
    let keys: Vec<&String> = s.extra.keys().collect();
    assert_eq!(keys, ["minimum", "default", "x-mcpgen-omittable"]);
}

#[test]
fn test_type_override_annotation() {
    let s = schema(json!({"type": "string", "x-mcpgen-type": " chrono::NaiveDate "}));
    assert_eq!(s.type_override(), Some("chrono::NaiveDate"));
    assert_eq!(schema(json!({"x-mcpgen-type": ""})).type_override(), None);
}

#[test]
fn test_parse_reference() {
    assert_eq!(
        parse_reference("#/components/schemas/User", "t").unwrap(),
        Reference::Local("User")
    );
    assert_eq!(
        parse_reference("schemas/user.json", "t").unwrap(),
        Reference::External("schemas/user.json")
    );
    let err = parse_reference("#/components/schemas", "t").unwrap_err();
    assert!(err.to_string().contains("incomplete"), "{err}");
    let err = parse_reference("#/definitions/User", "t").unwrap_err();
    assert!(err.to_string().contains("unsupported"), "{err}");
}

#[test]
fn test_resolve_inlines_nested_refs_and_strips_extensions() {
    let comps = components(json!({
        "Address": {"type": "object", "x-internal": 1, "properties": {"city": {"type": "string"}}},
        "User": {
            "type": "object",
            "properties": {
                "home": {"$ref": "#/components/schemas/Address"},
                "past": {"type": "array", "items": {"$ref": "#/components/schemas/Address"}},
                "alt": {"anyOf": [{"$ref": "#/components/schemas/Address"}, {"type": "null"}]}
            }
        }
    }));
    let mut loader = SchemaLoader::new(".");
    let mut resolver = ReferenceResolver::new(&comps, &mut loader);
    let input = schema(json!({"$ref": "#/components/schemas/User", "x-mcpgen-type": "Foo"}));
    let value = resolver.resolve_to_value(&input, "tools[a].inputSchema").unwrap();

    assert_eq!(value["properties"]["home"]["properties"]["city"]["type"], "string");
    assert_eq!(value["properties"]["past"]["items"]["type"], "object");
    assert_eq!(value["properties"]["alt"]["anyOf"][0]["type"], "object");
    assert!(value["properties"]["home"].get("x-internal").is_none());
    assert!(!value.to_string().contains("$ref"));
}

#[test]
fn test_resolve_missing_ref_names_schema_and_location() {
    let comps = components(json!({}));
    let mut loader = SchemaLoader::new(".");
    let mut resolver = ReferenceResolver::new(&comps, &mut loader);
    let input = schema(json!({
        "type": "object",
        "properties": {"owner": {"$ref": "#/components/schemas/Ghost"}}
    }));
    let err = resolver.resolve(&input, "tools[x].inputSchema").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Ghost"), "{msg}");
    assert!(msg.contains("tools[x].inputSchema.properties.owner"), "{msg}");
}

#[test]
fn test_resolve_recursive_schema_uses_defs() {
    let comps = components(json!({
        "Node": {
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
            }
        }
    }));
    let mut loader = SchemaLoader::new(".");
    let mut resolver = ReferenceResolver::new(&comps, &mut loader);
    let value = resolver
        .resolve_to_value(&schema(json!({"$ref": "#/components/schemas/Node"})), "root")
        .unwrap();

    assert_eq!(value["properties"]["children"]["items"]["$ref"], "#/$defs/Node");
    assert_eq!(
        value["$defs"]["Node"]["properties"]["children"]["items"]["$ref"],
        "#/$defs/Node"
    );
    assert_eq!(value["$defs"]["Node"]["properties"]["name"]["type"], "string");
}

#[test]
fn test_external_refs_are_cached_by_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("schemas")).unwrap();
    fs::write(
        dir.path().join("schemas/point.json"),
        r#"{"type":"object","properties":{"x":{"type":"number"},"y":{"type":"number"}}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("schemas/defs.yaml"),
        "definitions:\n  Tag:\n    type: string\n    x-note: hidden\n",
    )
    .unwrap();

    let comps = components(json!({}));
    let mut loader = SchemaLoader::new(dir.path());
    let mut resolver = ReferenceResolver::new(&comps, &mut loader);
    let input = schema(json!({
        "type": "object",
        "properties": {
            "a": {"$ref": "schemas/point.json"},
            "b": {"$ref": "./schemas/point.json"},
            "tag": {"$ref": "schemas/defs.yaml#/definitions/Tag"}
        }
    }));
    let value = resolver.resolve_to_value(&input, "root").unwrap();
    assert_eq!(value["properties"]["a"]["properties"]["x"]["type"], "number");
    assert_eq!(value["properties"]["b"], value["properties"]["a"]);
    assert_eq!(value["properties"]["tag"], json!({"type": "string"}));
    assert_eq!(loader.cached_documents(), 2);
}

#[test]
fn test_nested_external_refs_resolve_from_their_own_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("schemas/shared")).unwrap();
    fs::write(
        dir.path().join("schemas/order.json"),
        r#"{"type":"object","properties":{"buyer":{"$ref":"shared/buyer.yaml#/Buyer"},"note":{"$ref":"note.json"}}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("schemas/shared/buyer.yaml"),
        "Buyer:\n  type: object\n  properties:\n    name: {type: string}\n",
    )
    .unwrap();
    fs::write(dir.path().join("schemas/note.json"), r#"{"type":"string"}"#).unwrap();
    // Same file name next to the spec: must not be picked up.
    fs::write(dir.path().join("note.json"), r#"{"type":"integer"}"#).unwrap();

    let comps = components(json!({}));
    let mut loader = SchemaLoader::new(dir.path());
    let mut resolver = ReferenceResolver::new(&comps, &mut loader);
    let value = resolver
        .resolve_to_value(&schema(json!({"$ref": "schemas/order.json"})), "root")
        .unwrap();
    assert_eq!(
        value["properties"]["buyer"]["properties"]["name"]["type"],
        "string"
    );
    assert_eq!(value["properties"]["note"], json!({"type": "string"}));
    assert_eq!(loader.cached_documents(), 3);
}

#[test]
fn test_external_self_cycle_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("loop.json"),
        r#"{"type":"object","properties":{"next":{"$ref":"loop.json"}}}"#,
    )
    .unwrap();
    let comps = components(json!({}));
    let mut loader = SchemaLoader::new(dir.path());
    let mut resolver = ReferenceResolver::new(&comps, &mut loader);
    let err = resolver
        .resolve(&schema(json!({"$ref": "loop.json"})), "root")
        .unwrap_err();
    assert!(err.to_string().contains("cyclic"), "{err}");
}

#[test]
fn test_missing_external_file_is_schema_ref_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut loader = SchemaLoader::new(dir.path());
    let err = loader.load("nope.json").unwrap_err();
    assert!(matches!(err, crate::error::GenError::SchemaRef { .. }));
}
