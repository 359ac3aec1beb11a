#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;

use super::*;
use crate::config::GeneratorConfig;
use crate::error::GenError;

const SPEC: &str = r##"
info:
  title: weather
  version: 1.0.0
components:
  schemas:
    Units:
      type: string
      enum: [metric, imperial]
tools:
  - name: get_forecast
    description: Forecast for a city.
    inputSchema:
      type: object
      required: [city]
      properties:
        city: {type: string}
        units: {$ref: "#/components/schemas/Units"}
  - name: ping
    inputSchema: {type: object}
resources:
  - name: stations
    uri: weather://stations
  - name: station
    uriTemplate: weather://stations/{id}
prompts:
  - name: brief
    arguments:
      - name: city
        required: true
"##;

fn project(spec: &str, config: &str) -> (tempfile::TempDir, GeneratorConfig) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mcp.yaml"), spec).unwrap();
    let config_path = dir.path().join("mcpgen.yaml");
    fs::write(&config_path, config).unwrap();
    let config = GeneratorConfig::load(&config_path).unwrap();
    (dir, config)
}

fn run(config: &GeneratorConfig) -> GenerationReport {
    Generator::from_config(config.clone()).unwrap().run().unwrap()
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join("generated").join(file)).unwrap()
}

fn outcome(report: &GenerationReport, label: &str) -> FileOutcome {
    report.files.iter().find(|f| f.label == label).unwrap().outcome
}

#[test]
fn test_first_run_writes_every_file() {
    let (dir, config) = project(SPEC, "{}\n");
    let report = run(&config);

    for label in ["types", "server", "mod.rs", "resolver", "handlers"] {
        assert_eq!(outcome(&report, label), FileOutcome::Written, "{label}");
    }
    assert!(report.types.contains(&"GetForecastInput".to_string()));
    assert!(report.types.contains(&"StationParams".to_string()));
    assert!(report.types.contains(&"BriefArgs".to_string()));
    assert!(report.types.contains(&"Units".to_string()));

    let types = read(dir.path(), "types.rs");
    assert!(types.starts_with(GENERATED_HEADER));
    assert!(types.contains("pub struct GetForecastInput"));
    assert!(types.contains("pub enum Units"));

    let server = read(dir.path(), "server.rs");
    assert!(server.starts_with(GENERATED_HEADER));
    assert!(server.contains("pub trait ToolHandlers"));
    assert!(server.contains("async fn get_forecast("));

    let handlers = read(dir.path(), "handlers.rs");
    assert!(!handlers.starts_with(GENERATED_HEADER));
    assert!(handlers.contains("impl ToolHandlers for Resolver"));
    assert!(handlers.contains("Err(HandlerError::not_implemented(\"get_forecast\"))"));
    assert!(handlers.contains("async fn station("));
    assert!(handlers.contains("async fn brief("));

    let module = read(dir.path(), "mod.rs");
    for name in ["handlers", "resolver", "server", "types"] {
        assert!(module.contains(&format!("pub mod {name};")));
    }
}

#[test]
fn test_second_run_changes_nothing() {
    let (dir, config) = project(SPEC, "{}\n");
    run(&config);
    let handlers = read(dir.path(), "handlers.rs");

    let report = run(&config);
    assert_eq!(outcome(&report, "types"), FileOutcome::Unchanged);
    assert_eq!(outcome(&report, "server"), FileOutcome::Unchanged);
    assert_eq!(outcome(&report, "resolver"), FileOutcome::Kept);
    assert_eq!(report.merge_summary(), Some(Default::default()));
    assert_eq!(read(dir.path(), "handlers.rs"), handlers);
}

#[test]
fn test_removed_tool_is_orphaned_and_edits_survive() {
    let (dir, config) = project(SPEC, "{}\n");
    run(&config);

    let path = dir.path().join("generated/handlers.rs");
    let edited = fs::read_to_string(&path).unwrap().replace(
        "Err(HandlerError::not_implemented(\"get_forecast\"))",
        "Ok(serde_json::json!({\"sunny\": true}))",
    );
    fs::write(&path, &edited).unwrap();

    let without_ping = SPEC.replace("  - name: ping\n    inputSchema: {type: object}\n", "");
    fs::write(dir.path().join("mcp.yaml"), without_ping).unwrap();
    let report = run(&config);
    let summary = report.merge_summary().unwrap();
    assert_eq!(summary.orphaned, 1);
    assert_eq!(summary.added, 0);

    let handlers = read(dir.path(), "handlers.rs");
    assert!(handlers.contains("Ok(serde_json::json!({\"sunny\": true}))"));
    assert!(handlers.contains("// orphaned tool handler `ping`:"));
    assert!(!handlers.contains("    async fn ping("));
}

#[test]
fn test_preserve_off_regenerates_handlers() {
    let (dir, config) = project(SPEC, "resolver:\n  preserve: false\nmod_file: false\n");
    run(&config);
    let path = dir.path().join("generated/handlers.rs");
    fs::write(&path, "// scratch\n").unwrap();

    let report = run(&config);
    assert_eq!(outcome(&report, "handlers"), FileOutcome::Written);
    assert!(report.files.iter().all(|f| f.label != "mod.rs"));
    assert!(read(dir.path(), "handlers.rs").contains("impl ToolHandlers for Resolver"));
}

#[test]
fn test_custom_resolver_and_model_override() {
    let config = "resolver:\n  type: App\nmodels:\n  Units: crate::units::Units\n";
    let (dir, config) = project(SPEC, config);
    let report = run(&config);
    assert!(!report.types.contains(&"Units".to_string()));

    let types = read(dir.path(), "types.rs");
    assert!(types.contains("use crate::units::Units;"));
    assert!(!types.contains("pub enum Units"));
    assert!(read(dir.path(), "handlers.rs").contains("impl ToolHandlers for App"));
    assert!(read(dir.path(), "resolver.rs").contains("pub struct App"));
}

#[test]
fn test_operation_type_may_reference_same_named_component() {
    let spec = r##"
info: {title: t, version: "1"}
components:
  schemas:
    LookupInput:
      type: object
      properties:
        id: {type: string}
tools:
  - name: lookup
    inputSchema: {$ref: "#/components/schemas/LookupInput"}
"##;
    let (_dir, config) = project(spec, "{}\n");
    let generator = Generator::from_config(config).unwrap();
    let registry = generator.build_registry().unwrap();
    assert_eq!(registry.key_for_type("LookupInput"), Some("LookupInput"));
}

#[test]
fn test_operation_type_name_conflict_is_rejected() {
    let spec = r#"
info: {title: t, version: "1"}
components:
  schemas:
    LookupInput: {type: string}
tools:
  - name: lookup
    inputSchema:
      type: object
      properties:
        id: {type: string}
"#;
    let (_dir, config) = project(spec, "{}\n");
    let err = Generator::from_config(config)
        .unwrap()
        .build_registry()
        .unwrap_err();
    assert!(matches!(err, GenError::SpecValidation(_)));
    assert!(err.to_string().contains("LookupInput"));
}

#[test]
fn test_invalid_spec_is_rejected_unless_skipped() {
    let spec = "info: {title: t, version: \"1\"}\ntools:\n  - {name: a, inputSchema: {}}\n  - {name: a, inputSchema: {}}\n";
    let (_dir, config) = project(spec, "{}\n");
    assert!(matches!(
        Generator::from_config(config).err().unwrap(),
        GenError::SpecValidation(_)
    ));

    let (_dir, config) = project(spec, "options:\n  skip_validation: true\n");
    assert!(Generator::from_config(config).is_ok());
}

#[test]
fn test_check_resolves_without_writing() {
    let (dir, config) = project(SPEC, "{}\n");
    let summary = Generator::from_config(config).unwrap().check().unwrap();
    assert_eq!(summary.tools, 2);
    assert_eq!(summary.resources, 1);
    assert_eq!(summary.resource_templates, 1);
    assert_eq!(summary.prompts, 1);
    // Units, GetForecastInput, PingInput, StationParams, BriefArgs
    assert_eq!(summary.schemas, 5);
    assert!(!dir.path().join("generated").exists());
}

#[test]
fn test_check_reports_dangling_reference() {
    let spec = r##"
info: {title: t, version: "1"}
tools:
  - name: lookup
    inputSchema: {$ref: "#/components/schemas/Missing"}
"##;
    let (_dir, config) = project(spec, "{}\n");
    let err = Generator::from_config(config).unwrap().check().unwrap_err();
    assert!(matches!(err, GenError::SchemaRef { .. }));
}

#[test]
fn test_components_with_same_type_name_are_rejected() {
    let spec = r#"
info: {title: t, version: "1"}
components:
  schemas:
    task_status: {type: string, enum: [open, closed]}
    task-status:
      type: object
      properties:
        id: {type: string}
tools:
  - name: ping
    inputSchema: {type: object}
"#;
    let (_dir, config) = project(spec, "{}\n");
    let err = Generator::from_config(config.clone())
        .unwrap()
        .build_registry()
        .unwrap_err();
    assert!(matches!(err, GenError::SpecValidation(_)));
    let message = err.to_string();
    assert!(message.contains("task_status"), "{message}");
    assert!(message.contains("task-status"), "{message}");
    assert!(message.contains("TaskStatus"), "{message}");

    // Mapping one of them to a hand-written type leaves a single declaration.
    let (_dir, config) = project(spec, "models:\n  task_status: crate::status::TaskStatus\n");
    assert!(Generator::from_config(config).unwrap().build_registry().is_ok());
}
