//! Test fixtures and helpers

#![allow(dead_code)]

use std::sync::Arc;

use sassline::config::{ArtifactSettings, BatchSettings};
use sassline::{Environment, EventLog, MemoryLoader, MockCompiler, Pipeline, PipelineConfig};
use tempfile::TempDir;

/// Pipeline wired to in-memory collaborators
pub struct Harness {
    pub pipeline: Pipeline,
    pub loader: MemoryLoader,
    pub compiler: MockCompiler,
    pub log: EventLog,
    /// Holds the artifact directory alive
    pub artifact_dir: TempDir,
}

impl Harness {
    pub fn artifact(&self) -> Option<String> {
        std::fs::read_to_string(self.artifact_dir.path().join("dev/dev-css.css")).ok()
    }
}

pub fn config(environment: Environment, defer_first_load: bool, artifact_dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        environment,
        batch: BatchSettings {
            settle_ticks: 1,
            defer_first_load,
        },
        artifact: ArtifactSettings {
            dir: artifact_dir.path().join("dev"),
            file: "dev-css.css".into(),
        },
        ..Default::default()
    }
}

pub fn harness(environment: Environment, defer_first_load: bool, loader: MemoryLoader) -> Harness {
    let artifact_dir = TempDir::new().unwrap();
    let compiler = MockCompiler::new();
    let log = EventLog::new();
    let pipeline = Pipeline::with_event_log(
        config(environment, defer_first_load, &artifact_dir),
        Arc::new(loader.clone()),
        Arc::new(compiler.clone()),
        log.clone(),
    );
    Harness {
        pipeline,
        loader,
        compiler,
        log,
        artifact_dir,
    }
}

/// A imports B and C, both import D
pub fn diamond_loader() -> MemoryLoader {
    MemoryLoader::new()
        .with_file("styles/_b.scss", "@import \"d\";\n.b { color: blue; }\n")
        .with_file("styles/_c.scss", "@import \"d\";\n.c { color: green; }\n")
        .with_file("styles/_d.scss", "$d: 1px;\n.d { margin: $d; }\n")
        .with_fetch_delay(1)
}

pub const DIAMOND_ENTRY: &str = "@import \"b\";\n@import \"c\";\n.a { color: red; }\n";
