//! Pipeline - the ingestion entry point
//!
//! One [`Pipeline`] per process holds the resolution cache, the batch state
//! and the compiler. Clones share all of it.
//!
//! ```rust,ignore
//! let pipeline = Pipeline::new(config, Arc::new(FsLoader::from_current_dir()?), compiler);
//! let css = pipeline.translate(Load::new(address, source)).await?;
//! ```

use std::sync::Arc;

use tracing::instrument;

use crate::batch::{Admission, BatchCoordinator};
use crate::compile::{CommandCompiler, CompileInvoker, Compiler};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::event::{EventEmitter, EventLog};
use crate::loader::{FsLoader, ModuleLoader};
use crate::resolve::{Load, ResolutionCache, Resolver};

struct PipelineInner {
    config: PipelineConfig,
    resolver: Resolver,
    batch: BatchCoordinator,
    event_log: EventLog,
}

/// Import inlining, batching and compilation for top-level loads
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        loader: Arc<dyn ModuleLoader>,
        compiler: Arc<dyn Compiler>,
    ) -> Self {
        Self::with_event_log(config, loader, compiler, EventLog::new())
    }

    /// Build with an existing event log (shared with the caller)
    pub fn with_event_log(
        config: PipelineConfig,
        loader: Arc<dyn ModuleLoader>,
        compiler: Arc<dyn Compiler>,
        event_log: EventLog,
    ) -> Self {
        let emitter: Arc<dyn EventEmitter> = Arc::new(event_log.clone());

        let resolver = Resolver::new(
            loader,
            ResolutionCache::new(),
            config.imports.extension.clone(),
            Arc::clone(&emitter),
        );
        let invoker = CompileInvoker::new(
            compiler,
            config.environment,
            config.artifact.clone(),
            Arc::clone(&emitter),
        );
        let batch = BatchCoordinator::new(
            config.batch.clone(),
            config.environment,
            invoker,
            emitter,
        );

        Self {
            inner: Arc::new(PipelineInner {
                config,
                resolver,
                batch,
                event_log,
            }),
        }
    }

    /// Filesystem loader rooted at the working directory, configured compiler command
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let loader = FsLoader::from_current_dir()?;
        let compiler = CommandCompiler::from_settings(&config.compiler);
        Ok(Self::new(config, Arc::new(loader), Arc::new(compiler)))
    }

    /// Translate one top-level load.
    ///
    /// - bootstrap load: `Ok("")` without resolving anything
    /// - batch still open: `Ok("")`
    /// - batch closer: the compiled batch, or `Ok("")` when the compile
    ///   failed or the first compile is left to the authoritative process
    ///
    /// Loader failures are returned as `Err` after the load has left its batch.
    #[instrument(skip(self, load), fields(address = %load.address()))]
    pub async fn translate(&self, load: Load) -> Result<String> {
        let address = load.address_arc();
        let batch = &self.inner.batch;

        if let Admission::Deferred = batch.admit(&address) {
            return Ok(String::new());
        }

        match self.inner.resolver.process_source(&load).await {
            Ok(source) => {
                batch.settle().await;
                Ok(batch.complete(&address, &source).await)
            }
            Err(err) => {
                batch.abandon(&address, &err).await;
                Err(err)
            }
        }
    }

    /// Inline the imports of a load without batching or compiling
    pub async fn process_source(&self, load: &Load) -> Result<String> {
        self.inner.resolver.process_source(load).await
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn event_log(&self) -> &EventLog {
        &self.inner.event_log
    }

    pub fn cache(&self) -> &ResolutionCache {
        self.inner.resolver.cache()
    }

    pub fn has_compiled(&self) -> bool {
        self.inner.batch.has_compiled()
    }

    /// Current batch epoch (0 before any load joined)
    pub fn epoch(&self) -> u64 {
        self.inner.batch.epoch()
    }
}
