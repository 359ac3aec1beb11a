#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};

use mcpgen::generator::{GenerationReport, Generator};
use mcpgen::GeneratorConfig;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A scratch project: `mcpgen.yaml`, `mcp.yaml` and `schemas/` in a temp directory.
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    /// Project whose `mcp.yaml` is a copy of the named fixture.
    pub fn new(spec_fixture: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::copy(fixture("mcpgen.yaml"), dir.path().join("mcpgen.yaml")).unwrap();
        fs::create_dir_all(dir.path().join("schemas")).unwrap();
        fs::copy(
            fixture("schemas/location.json"),
            dir.path().join("schemas/location.json"),
        )
        .unwrap();
        let project = Self { dir };
        project.use_spec(spec_fixture);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn use_spec(&self, spec_fixture: &str) {
        fs::copy(fixture(spec_fixture), self.root().join("mcp.yaml")).unwrap();
    }

    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::load(&self.root().join("mcpgen.yaml")).unwrap()
    }

    pub fn generate(&self) -> GenerationReport {
        Generator::from_config(self.config()).unwrap().run().unwrap()
    }

    pub fn output(&self, file: &str) -> PathBuf {
        self.root().join("generated").join(file)
    }

    pub fn read(&self, file: &str) -> String {
        fs::read_to_string(self.output(file)).unwrap()
    }

    pub fn write(&self, file: &str, contents: &str) {
        fs::write(self.output(file), contents).unwrap();
    }

    /// Replace `from` with `to` in an output file; `from` must be present.
    pub fn edit(&self, file: &str, from: &str, to: &str) {
        let source = self.read(file);
        assert!(source.contains(from), "{file} does not contain {from:?}");
        self.write(file, &source.replacen(from, to, 1));
    }
}
