//! Batch Module - merge concurrently arriving loads into one compile

mod coordinator;

pub use coordinator::{Admission, BatchCoordinator};
