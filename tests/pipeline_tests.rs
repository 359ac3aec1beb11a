#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::Project;
use mcpgen::generator::{FileOutcome, GENERATED_HEADER};

#[test]
fn test_types_cover_components_operations_and_external_refs() {
    let project = Project::new("weather_v1.yaml");
    let report = project.generate();

    for name in [
        "Day",
        "DayConditions",
        "DailyBriefArgs",
        "Forecast",
        "GetForecastInput",
        "GetForecastOutput",
        "Location",
        "ReportObservationInput",
        "StationParams",
    ] {
        assert!(report.types.contains(&name.to_string()), "missing {name}");
    }

    let types = project.read("types.rs");
    assert!(types.starts_with(GENERATED_HEADER));
    assert!(types.contains("pub type GetForecastOutput = Forecast;"));
    assert!(types.contains("pub days: Vec<Day>,"));
    assert!(types.contains("pub next: Option<Box<Day>>,"));
    assert!(types.contains("pub location: Option<Box<Location>>,"));
    assert!(types.contains("#[serde(rename = \"issuedAt\""));
    assert!(types.contains("pub issued_at: Option<DateTime<Utc>>,"));
    assert!(types.contains("use mcpgen_runtime::chrono::DateTime;"));
    assert!(types.contains("pub reading: Option<f64>,"));
    assert!(types.contains("#[serde(rename = \"stationId\")]"));
    assert!(types.contains("RainShowers"));
    assert!(types.contains("\"rain-showers\""));
    assert!(types.contains("/// One day of a forecast."));
    // x- keys never reach generated code
    assert!(!types.contains("gazetteer"));
}

#[test]
fn test_server_wiring_embeds_resolved_schemas() {
    let project = Project::new("weather_v1.yaml");
    project.generate();
    let server = project.read("server.rs");

    assert!(server.starts_with(GENERATED_HEADER));
    for fragment in [
        "pub trait ToolHandlers",
        "pub trait ResourceHandlers",
        "pub trait ResourceTemplateHandlers",
        "pub trait PromptHandlers",
        "input: GetForecastInput",
        "-> Result<GetForecastOutput, HandlerError>",
        "input: ReportObservationInput",
        "params: StationParams",
        "args: DailyBriefArgs",
        "weather://stations/{stationId}",
    ] {
        assert!(server.contains(fragment), "server.rs lacks {fragment:?}");
    }
    // the recursive Day schema is embedded once under $defs
    assert!(server.contains("\"$defs\""));
    assert!(server.contains("#/$defs/Day"));
    assert!(!server.contains("gazetteer"));
}

#[test]
fn test_generation_is_deterministic_across_projects() {
    let first = Project::new("weather_v1.yaml");
    let second = Project::new("weather_v1.yaml");
    first.generate();
    second.generate();
    for file in ["types.rs", "server.rs", "mod.rs", "resolver.rs", "handlers.rs"] {
        assert_eq!(first.read(file), second.read(file), "{file} differs");
    }
}

#[test]
fn test_regeneration_is_idempotent() {
    let project = Project::new("weather_v1.yaml");
    project.generate();
    let before: Vec<String> = ["types.rs", "server.rs", "handlers.rs"]
        .iter()
        .map(|f| project.read(f))
        .collect();

    let report = project.generate();
    for file in &report.files {
        assert!(
            matches!(
                file.outcome,
                FileOutcome::Unchanged | FileOutcome::Kept | FileOutcome::Merged(_)
            ),
            "{} was rewritten",
            file.label
        );
    }
    assert!(!report.merge_summary().unwrap().changed());
    let after: Vec<String> = ["types.rs", "server.rs", "handlers.rs"]
        .iter()
        .map(|f| project.read(f))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_resolver_file_is_never_overwritten() {
    let project = Project::new("weather_v1.yaml");
    project.generate();
    let resolver = project.read("resolver.rs");
    assert!(resolver.contains("pub struct WeatherService"));

    let custom = "pub struct WeatherService {\n    pub api_key: String,\n}\n";
    project.write("resolver.rs", custom);
    project.use_spec("weather_v2.yaml");
    project.generate();
    assert_eq!(project.read("resolver.rs"), custom);
}

#[test]
fn test_mod_file_declares_generated_modules() {
    let project = Project::new("weather_v1.yaml");
    project.generate();
    let module = project.read("mod.rs");
    assert!(module.starts_with(GENERATED_HEADER));
    for name in ["handlers", "resolver", "server", "types"] {
        assert!(module.contains(&format!("pub mod {name};")));
    }
}
