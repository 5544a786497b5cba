//! BatchCoordinator - epoch + join-count batching of top-level loads
//!
//! A load joins the current batch when it is admitted; the first join
//! after a drain opens a new epoch. After its resolution the load yields
//! `settle_ticks` times so siblings arriving in the meantime can join,
//! appends its inlined source and leaves. The member that brings the
//! join-count back to zero closes the batch and compiles the accumulated
//! source; every other member contributes empty text.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::compile::CompileInvoker;
use crate::config::{BatchSettings, Environment};
use crate::error::SasslineError;
use crate::event::{calculate_source_hash, EventEmitter, EventKind};

/// Decision taken when a load is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Bootstrap load: answered empty, never resolved
    Deferred,
    /// Joined the batch of this epoch
    Joined { epoch: u64 },
}

#[derive(Debug, Default)]
struct BatchState {
    epoch: u64,
    /// Members still resolving or settling
    outstanding: usize,
    /// Members that joined this epoch
    members: usize,
    buffer: String,
    has_compiled: bool,
    bootstrapped: bool,
}

/// Buffer handed over by the closing member
struct ClosedBatch {
    epoch: u64,
    members: usize,
    source: String,
}

pub struct BatchCoordinator {
    state: Mutex<BatchState>,
    settings: BatchSettings,
    environment: Environment,
    invoker: CompileInvoker,
    emitter: Arc<dyn EventEmitter>,
}

impl BatchCoordinator {
    pub fn new(
        settings: BatchSettings,
        environment: Environment,
        invoker: CompileInvoker,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            state: Mutex::new(BatchState::default()),
            settings,
            environment,
            invoker,
            emitter,
        }
    }

    /// Admit a load: defer it (bootstrap) or join the current batch
    pub fn admit(&self, address: &Arc<str>) -> Admission {
        let mut state = self.state.lock();

        if self.settings.defer_first_load && !state.bootstrapped && !state.has_compiled {
            state.bootstrapped = true;
            drop(state);
            debug!(address = %address, "deferring bootstrap load");
            self.emitter.emit(EventKind::BootstrapDeferred {
                address: Arc::clone(address),
            });
            return Admission::Deferred;
        }

        if state.outstanding == 0 {
            state.epoch += 1;
            state.members = 0;
        }
        state.outstanding += 1;
        state.members += 1;
        let (epoch, outstanding) = (state.epoch, state.outstanding);
        drop(state);

        debug!(address = %address, epoch, outstanding, "load joined batch");
        self.emitter.emit(EventKind::LoadSubmitted {
            address: Arc::clone(address),
            epoch,
            outstanding,
        });
        Admission::Joined { epoch }
    }

    /// Pacing delay between finishing resolution and leaving the batch
    pub async fn settle(&self) {
        for _ in 0..self.settings.settle_ticks {
            tokio::task::yield_now().await;
        }
    }

    /// Leave the batch with an inlined source.
    ///
    /// Returns the compiled batch for the closer, empty text otherwise.
    pub async fn complete(&self, address: &Arc<str>, source: &str) -> String {
        let closed = {
            let mut state = self.state.lock();
            state.buffer.push_str(source);
            Self::leave(&mut state)
        };

        match closed {
            Some(batch) => self.close(batch, address).await,
            None => {
                debug!(address = %address, "left open batch");
                String::new()
            }
        }
    }

    /// Leave the batch after a failed resolution, closing it if this was the last member
    pub async fn abandon(&self, address: &Arc<str>, error: &SasslineError) {
        let closed = {
            let mut state = self.state.lock();
            Self::leave(&mut state)
        };

        self.emitter.emit(EventKind::LoadFailed {
            address: Arc::clone(address),
            error: error.to_string(),
        });

        if let Some(batch) = closed {
            if !batch.source.is_empty() {
                self.close(batch, address).await;
            }
        }
    }

    /// Whether the first compile has happened (succeeded when authoritative,
    /// skipped when not)
    pub fn has_compiled(&self) -> bool {
        self.state.lock().has_compiled
    }

    /// Current epoch (0 before the first batch)
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Members still in the current batch
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Decrement the join-count; on drain take the buffer
    fn leave(state: &mut BatchState) -> Option<ClosedBatch> {
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.outstanding > 0 {
            return None;
        }

        Some(ClosedBatch {
            epoch: state.epoch,
            members: state.members,
            source: mem::take(&mut state.buffer),
        })
    }

    async fn close(&self, batch: ClosedBatch, closer: &Arc<str>) -> String {
        info!(
            epoch = batch.epoch,
            members = batch.members,
            source_len = batch.source.len(),
            closer = %closer,
            "batch closed"
        );
        self.emitter.emit(EventKind::BatchClosed {
            epoch: batch.epoch,
            members: batch.members,
            closer: Arc::clone(closer),
            source_len: batch.source.len(),
            source_hash: calculate_source_hash(&batch.source),
        });

        if !self.environment.authoritative {
            let first = !mem::replace(&mut self.state.lock().has_compiled, true);
            if first {
                info!(epoch = batch.epoch, "first batch: reusing precompiled artifact");
                self.emitter.emit(EventKind::FirstCompileSkipped { epoch: batch.epoch });
                return String::new();
            }
            return self.invoker.compile(&batch.source, closer).await.unwrap_or_default();
        }

        // Authoritative: only a successful compile counts
        match self.invoker.compile(&batch.source, closer).await {
            Some(text) => {
                self.state.lock().has_compiled = true;
                text
            }
            None => String::new(),
        }
    }
}
