//! Pipeline Integration Tests
//!
//! translate() end to end with in-memory collaborators: bootstrap rules,
//! batching, compile failure recovery and loader failure propagation.

mod common;

use std::sync::Arc;

use common::{diamond_loader, harness, DIAMOND_ENTRY};
use futures::future::{join, join_all};
use pretty_assertions::assert_eq;
use sassline::{Environment, EventKind, EventLog, Load, MemoryLoader, MockCompiler, Pipeline};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════
// BOOTSTRAP
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_authoritative_first_load_is_deferred_then_compiled() {
    let h = harness(Environment::authoritative(), true, MemoryLoader::new());

    let first = h.pipeline.translate(Load::new("app/boot.scss", ".boot{}")).await;
    assert_eq!(first.unwrap(), "");
    assert_eq!(h.compiler.call_count(), 0);

    let second = h.pipeline.translate(Load::new("app/main.scss", ".main{}")).await;
    assert_eq!(second.unwrap(), ".main{}");
    assert_eq!(h.compiler.calls(), vec![".main{}"]);
    assert!(h.pipeline.has_compiled());
}

#[tokio::test]
async fn test_authoritative_compile_persists_artifact() {
    let h = harness(Environment::authoritative(), false, MemoryLoader::new());

    let out = h.pipeline.translate(Load::new("app/main.scss", ".main{}")).await;
    assert_eq!(out.unwrap(), ".main{}");
    assert_eq!(h.artifact().as_deref(), Some(".main{}"));
}

#[tokio::test]
async fn test_packaging_does_not_persist_artifact() {
    let h = harness(Environment::packaging(), false, MemoryLoader::new());

    let out = h.pipeline.translate(Load::new("app/main.scss", ".main{}")).await;
    assert_eq!(out.unwrap(), ".main{}");
    assert_eq!(h.artifact(), None);
}

#[tokio::test]
async fn test_follower_defers_first_load_without_resolving() {
    let h = harness(Environment::follower(), true, diamond_loader());

    let first = h.pipeline.translate(Load::new("styles/a.scss", DIAMOND_ENTRY)).await;
    assert_eq!(first.unwrap(), "");
    assert_eq!(h.loader.total_fetches(), 0);
    assert!(!h.pipeline.has_compiled());
    assert_eq!(
        h.log.count(|k| matches!(k, EventKind::BootstrapDeferred { .. })),
        1
    );
}

#[tokio::test]
async fn test_follower_skips_first_compile_then_compiles() {
    let h = harness(Environment::follower(), true, MemoryLoader::new());

    h.pipeline.translate(Load::new("a.scss", ".a{}")).await.unwrap();

    // First batch close: precompiled artifact is reused
    let skipped = h.pipeline.translate(Load::new("b.scss", ".b{}")).await.unwrap();
    assert_eq!(skipped, "");
    assert_eq!(h.compiler.call_count(), 0);
    assert!(h.pipeline.has_compiled());

    let compiled = h.pipeline.translate(Load::new("c.scss", ".c{}")).await.unwrap();
    assert_eq!(compiled, ".c{}");
    assert_eq!(h.compiler.calls(), vec![".c{}"]);
    assert_eq!(h.artifact(), None);
}

// ═══════════════════════════════════════════════════════════════
// BATCHING
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_overlapping_loads_compile_once() {
    let h = harness(Environment::authoritative(), false, diamond_loader());
    let loads = vec![
        Load::new("styles/a.scss", DIAMOND_ENTRY),
        Load::new("styles/x.scss", ".x{}"),
        Load::new("styles/y.scss", "@import \"d\";\n.y{}"),
    ];

    let results: Vec<String> = join_all(loads.into_iter().map(|l| h.pipeline.translate(l)))
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let compiled: Vec<&String> = results.iter().filter(|r| !r.is_empty()).collect();
    assert_eq!(compiled.len(), 1, "exactly one batch closer: {:?}", results);
    assert_eq!(h.compiler.call_count(), 1);

    let batch = h.compiler.last_call().unwrap();
    for rule in [".a {", ".b {", ".c {", ".x{}", ".y{}"] {
        assert!(batch.contains(rule), "missing {} in {}", rule, batch);
    }
    assert_eq!(batch.matches(".d {").count(), 1);
    assert_eq!(h.loader.fetch_count("styles/_d.scss"), 1);
    assert_eq!(
        h.log.count(|k| matches!(k, EventKind::BatchClosed { members: 3, .. })),
        1
    );
}

#[tokio::test]
async fn test_load_submitted_while_another_settles_joins_its_batch() {
    let artifact_dir = TempDir::new().unwrap();
    let mut config = common::config(Environment::packaging(), false, &artifact_dir);
    config.batch.settle_ticks = 4;
    let compiler = MockCompiler::new();
    let log = EventLog::new();
    let pipeline = Pipeline::with_event_log(
        config,
        Arc::new(MemoryLoader::new()),
        Arc::new(compiler.clone()),
        log.clone(),
    );

    let first = pipeline.translate(Load::new("a.scss", ".a{}"));
    let second = async {
        tokio::task::yield_now().await;
        // `a.scss` has finished resolving and sits in its settle window
        assert_eq!(log.count(|k| matches!(k, EventKind::LoadSubmitted { .. })), 1);
        assert_eq!(log.count(|k| matches!(k, EventKind::BatchClosed { .. })), 0);
        pipeline.translate(Load::new("b.scss", ".b{}")).await
    };
    let (first, second) = join(first, second).await;

    assert_eq!(first.unwrap(), "");
    assert_eq!(second.unwrap(), ".a{}.b{}");
    assert_eq!(compiler.calls(), vec![".a{}.b{}"]);
    assert_eq!(
        log.count(|k| matches!(k, EventKind::BatchClosed { epoch: 1, members: 2, .. })),
        1
    );
    assert_eq!(log.count(|k| matches!(k, EventKind::BatchClosed { .. })), 1);
}

#[tokio::test]
async fn test_load_after_drain_starts_separate_batch() {
    let h = harness(Environment::authoritative(), false, MemoryLoader::new());

    let first = join_all([
        h.pipeline.translate(Load::new("a.scss", ".a{}")),
        h.pipeline.translate(Load::new("b.scss", ".b{}")),
    ])
    .await;
    assert_eq!(first[0].as_deref().unwrap(), "");
    assert_eq!(first[1].as_deref().unwrap(), ".a{}.b{}");

    let later = h.pipeline.translate(Load::new("c.scss", ".c{}")).await.unwrap();
    assert_eq!(later, ".c{}");
    assert_eq!(h.compiler.calls(), vec![".a{}.b{}", ".c{}"]);
    assert_eq!(h.pipeline.epoch(), 2);
}

#[tokio::test]
async fn test_batch_closed_event_carries_source_hash() {
    let h = harness(Environment::authoritative(), false, MemoryLoader::new());
    h.pipeline.translate(Load::new("a.scss", ".a{}")).await.unwrap();

    let hash = h.log.batch_events().into_iter().find_map(|e| match e.kind {
        EventKind::BatchClosed { source_hash, .. } => Some(source_hash),
        _ => None,
    });
    assert_eq!(hash, Some(sassline::event::calculate_source_hash(".a{}")));
}

// ═══════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_compile_failure_returns_empty_and_resets_buffer() {
    let h = harness(Environment::authoritative(), false, MemoryLoader::new());
    h.compiler.set_failure(Some((1, "Invalid CSS after \".a {\"".into())));

    let failed = h.pipeline.translate(Load::new("a.scss", ".a {")).await;
    assert_eq!(failed.unwrap(), "");
    assert_eq!(h.artifact(), None);

    h.compiler.set_failure(None);
    let next = h.pipeline.translate(Load::new("b.scss", ".b{}")).await;
    assert_eq!(next.unwrap(), ".b{}");
    assert_eq!(h.compiler.calls(), vec![".a {", ".b{}"]);

    let failure = h.log.events().into_iter().find_map(|e| match e.kind {
        EventKind::CompileFailed {
            address, source, ..
        } => Some((address.to_string(), source)),
        _ => None,
    });
    assert_eq!(failure, Some(("a.scss".to_string(), ".a {".to_string())));
}

#[tokio::test]
async fn test_loader_failure_propagates_and_batch_still_closes() {
    let h = harness(Environment::authoritative(), false, MemoryLoader::new());

    let results = join_all([
        h.pipeline.translate(Load::new("ok.scss", ".ok{}")),
        h.pipeline.translate(Load::new("bad.scss", "@import \"missing\";")),
    ])
    .await;

    assert_eq!(results[0].as_deref().unwrap(), "");
    let err = results[1].clone().unwrap_err();
    assert_eq!(err.code(), "SASS-021");
    assert!(err.is_loader_error());

    assert_eq!(h.compiler.calls(), vec![".ok{}"]);
    assert_eq!(h.artifact().as_deref(), Some(".ok{}"));
    assert_eq!(h.log.count(|k| matches!(k, EventKind::LoadFailed { .. })), 1);
}

#[tokio::test]
async fn test_failed_import_is_shared_with_later_loads() {
    let loader = MemoryLoader::new().with_file("s/_broken.scss", "@import \"ghost\";");
    let h = harness(Environment::authoritative(), false, loader);

    let first = h.pipeline.translate(Load::new("s/a.scss", "@import \"broken\";")).await;
    let second = h.pipeline.translate(Load::new("s/b.scss", "@import \"broken\";")).await;
    assert_eq!(first.unwrap_err(), second.unwrap_err());
    assert_eq!(h.loader.fetch_count("s/_broken.scss"), 1);
    assert_eq!(h.compiler.call_count(), 0);
}
