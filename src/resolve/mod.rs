//! Resolve Module - import resolution for top-level loads
//!
//! - `load`: [`Load`] and its shared [`SourceBuffer`]
//! - `cache`: [`ResolutionCache`], in-flight dedup by key and location
//! - `inliner`: [`Resolver`], the recursive inliner

mod cache;
mod inliner;
mod load;

pub use cache::{Claim, Resolution, ResolutionCache, SharedResolution};
pub use inliner::Resolver;
pub use load::{Load, SourceBuffer};
