//! Resolution Integration Tests
//!
//! Import inlining through the public Pipeline API: at-most-one fetch per
//! location, directive ordering, identity, and the filesystem loader.

mod common;

use std::sync::Arc;

use camino::Utf8PathBuf;
use common::{diamond_loader, harness, DIAMOND_ENTRY};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use sassline::{
    Environment, EventKind, FsLoader, Load, MemoryLoader, MockCompiler, Pipeline, PipelineConfig,
};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════
// IN-MEMORY GRAPHS
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_diamond_fetches_shared_partial_once() {
    let h = harness(Environment::authoritative(), false, diamond_loader());
    let load = Load::new("styles/a.scss", DIAMOND_ENTRY);

    let out = h.pipeline.process_source(&load).await.unwrap();

    assert_eq!(h.loader.fetch_count("styles/_d.scss"), 1);
    assert_eq!(h.loader.fetch_count("styles/_b.scss"), 1);
    assert_eq!(h.loader.fetch_count("styles/_c.scss"), 1);
    assert_eq!(out.matches(".d { margin").count(), 1);
    assert_eq!(
        h.log.count(|k| matches!(k, EventKind::ImportFetched { .. })),
        3
    );
}

#[tokio::test]
async fn test_identity_without_imports() {
    let h = harness(Environment::authoritative(), false, MemoryLoader::new());
    let source = "// no imports here\n.a { color: red; }\n";
    let out = h.pipeline.process_source(&Load::new("a.scss", source)).await;
    assert_eq!(out.unwrap(), source);
    assert!(h.log.is_empty());
}

#[tokio::test]
async fn test_inlined_content_follows_directive_order() {
    // Later directives resolve first; order must still follow the source
    let loader = MemoryLoader::new()
        .with_file("s/_first.scss", "@import \"deep\";\n.first{}")
        .with_file("s/_deep.scss", ".deep{}")
        .with_file("s/_second.scss", ".second{}")
        .with_file("s/_third.scss", ".third{}");
    let h = harness(Environment::authoritative(), false, loader);
    let load = Load::new(
        "s/app.scss",
        "@import \"first\";\n@import \"second\";\n@import \"third\";\n.app{}",
    );

    let out = h.pipeline.process_source(&load).await.unwrap();
    assert_eq!(out, ".deep{};\n.first{};\n.second{};\n.third{};\n.app{}");
}

#[tokio::test]
async fn test_same_partial_imported_twice_keeps_first_occurrence_only() {
    let loader = MemoryLoader::new().with_file("s/_mixins.scss", "@mixin m {}");
    let h = harness(Environment::authoritative(), false, loader);
    let load = Load::new(
        "s/app.scss",
        "@import \"mixins\";\n.a{}\n@import \"mixins\";\n.b{}",
    );

    let out = h.pipeline.process_source(&load).await.unwrap();
    assert_eq!(out, "@mixin m {};\n.a{}\n;\n.b{}");
}

#[tokio::test]
async fn test_explicit_extension_and_partial_form_share_location() {
    // "vars.scss" skips the partial transform and is aliased to the partial
    let loader = MemoryLoader::new()
        .with_file("s/_vars.scss", "$x: 1;")
        .with_alias("s/vars.scss", "s/_vars.scss");
    let h = harness(Environment::authoritative(), false, loader);
    let load = Load::new("s/app.scss", "@import \"vars\";\n@import \"vars.scss\";");

    let out = h.pipeline.process_source(&load).await.unwrap();
    assert_eq!(out, "$x: 1;;\n;");
    assert_eq!(h.loader.total_fetches(), 1);
    assert_eq!(h.pipeline.cache().key_count(), 2);
    assert_eq!(h.pipeline.cache().location_count(), 1);
}

#[tokio::test]
async fn test_many_loads_share_one_fetch_per_location() {
    let loader = MemoryLoader::new()
        .with_file("s/_theme.scss", "@import \"palette\";\n.theme{}")
        .with_file("s/_palette.scss", "$p: #fff;")
        .with_fetch_delay(3);
    let h = harness(Environment::authoritative(), false, loader);

    let loads: Vec<Load> = (0..20)
        .map(|i| Load::new(format!("s/page{}.scss", i), format!("@import \"theme\";\n.p{}{{}}", i)))
        .collect();
    let results = join_all(loads.iter().map(|l| h.pipeline.process_source(l))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(h.loader.fetch_count("s/_theme.scss"), 1);
    assert_eq!(h.loader.fetch_count("s/_palette.scss"), 1);

    let with_theme = results
        .iter()
        .filter(|r| r.as_ref().unwrap().contains(".theme{}"))
        .count();
    assert_eq!(with_theme, 1, "only the first requester carries the content");
}

#[tokio::test]
async fn test_plugin_suffix_is_not_part_of_location() {
    let loader = MemoryLoader::new()
        .with_file("s/_x.scss", ".x{}")
        .with_plugin_suffix("!scss");
    let h = harness(Environment::authoritative(), false, loader);

    h.pipeline
        .process_source(&Load::new("s/app.scss", "@import \"x\";"))
        .await
        .unwrap();

    let location = h.log.events().into_iter().find_map(|e| match e.kind {
        EventKind::ImportFetched { location, .. } => Some(location.to_string()),
        _ => None,
    });
    assert_eq!(location.as_deref(), Some("s/_x.scss"));
}

#[tokio::test]
async fn test_circular_import_fails_instead_of_hanging() {
    let loader = MemoryLoader::new()
        .with_file("s/_a.scss", "@import \"b\";")
        .with_file("s/_b.scss", "@import \"a\";");
    let h = harness(Environment::authoritative(), false, loader);

    let err = h
        .pipeline
        .translate(Load::new("s/app.scss", "@import \"a\";"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SASS-030");
}

// ═══════════════════════════════════════════════════════════════
// FILESYSTEM LOADER
// ═══════════════════════════════════════════════════════════════

fn write(dir: &TempDir, path: &str, content: &str) {
    let full = dir.path().join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

#[tokio::test]
async fn test_fs_project_compiles_with_artifact() {
    let project = TempDir::new().unwrap();
    write(&project, "styles/main.scss", "@import \"vars\";\n@import \"components/button\";\nbody { color: $text; }\n");
    write(&project, "styles/_vars.scss", "$text: #333;\n");
    write(&project, "styles/components/_button.scss", "@import \"icon\";\n.btn { padding: 4px; }\n");
    write(&project, "styles/components/icon.scss", ".icon { width: 1em; }\n");

    let root = Utf8PathBuf::from_path_buf(project.path().to_path_buf()).unwrap();
    let loader = FsLoader::new(root.clone());
    let compiler = MockCompiler::new().with_prefix("/* compiled */\n");

    let mut config = PipelineConfig::default();
    config.environment = Environment::authoritative();
    config.batch.defer_first_load = false;
    config.artifact.dir = project.path().join("src/css/dev");

    let pipeline = Pipeline::new(config, Arc::new(loader.clone()), Arc::new(compiler.clone()));
    let entry = root.join("styles/main.scss");
    let source = std::fs::read_to_string(&entry).unwrap();

    let out = pipeline
        .translate(Load::new(loader.address_of(&entry), source))
        .await
        .unwrap();

    assert_eq!(
        out,
        "/* compiled */\n$text: #333;\n;\n.icon { width: 1em; }\n;\n.btn { padding: 4px; }\n;\nbody { color: $text; }\n"
    );
    let artifact = std::fs::read_to_string(project.path().join("src/css/dev/dev-css.css")).unwrap();
    assert_eq!(artifact, out);
}

#[tokio::test]
async fn test_fs_root_level_entry_resolves_imports() {
    let project = TempDir::new().unwrap();
    write(&project, "main.scss", "@import \"vars\";\n@import \"theme/dark\";\nbody { color: $c; }\n");
    write(&project, "_vars.scss", "$c: red;\n");
    write(&project, "theme/_dark.scss", "@import \"../vars\";\n.dark { color: black; }\n");

    let root = Utf8PathBuf::from_path_buf(project.path().to_path_buf()).unwrap();
    let loader = FsLoader::new(root.clone());

    let mut config = PipelineConfig::default();
    config.environment = Environment::packaging();
    config.batch.defer_first_load = false;

    let pipeline = Pipeline::new(config, Arc::new(loader.clone()), Arc::new(MockCompiler::new()));
    let entry = root.join("main.scss");
    let source = std::fs::read_to_string(&entry).unwrap();

    let out = pipeline
        .translate(Load::new(loader.address_of(&entry), source))
        .await
        .unwrap();

    // Both `vars` and `../vars` land on the one root-level file
    assert_eq!(out.matches("$c: red;").count(), 1);
    assert!(out.contains(".dark { color: black; }"));
    assert!(out.ends_with("body { color: $c; }\n"));
    assert!(!out.contains("@import"));
}
