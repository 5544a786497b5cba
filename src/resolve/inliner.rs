//! Recursive Inliner - resolve every import of a load, depth first
//!
//! Per import:
//! 1. normalize to a canonical key; the directive is already a placeholder
//! 2. key hit: wait for the shared resolution, clear the placeholder
//! 3. key miss: loader normalize + locate, strip the plugin suffix, then
//!    a. location hit: wait, clear the placeholder
//!    b. location miss: fetch, substitute the raw text for the placeholder,
//!       recurse on it with the location's directory as the new base
//!
//! Every resolution yields the standalone inlined text of its file; the
//! load's buffer receives content only through the first requester.
//!
//! Recursive steps return `BoxFuture` so the future types stay finite.

use std::fmt;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, instrument};

use super::cache::{Claim, Resolution, ResolutionCache};
use super::load::{Load, SourceBuffer};
use crate::error::{Result, SasslineError};
use crate::event::{EventEmitter, EventKind};
use crate::import::{
    base_of, normalize_specifier, replace_directives, scan_directives, CanonicalKey,
    ImportDirective, NormalizedImport, ResolvedLocation,
};
use crate::loader::ModuleLoader;

/// Keys and locations from the top-level load down to the current import
#[derive(Clone, Default)]
struct Ancestry(Option<Arc<Link>>);

struct Link {
    entry: Arc<str>,
    parent: Ancestry,
}

impl Ancestry {
    fn root(address: Arc<str>) -> Self {
        Self::default().push(address)
    }

    fn push(&self, entry: impl Into<Arc<str>>) -> Self {
        Self(Some(Arc::new(Link {
            entry: entry.into(),
            parent: self.clone(),
        })))
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(self.0.as_deref(), |&link| link.parent.0.as_deref())
            .map(|link| &*link.entry)
    }

    fn contains(&self, entry: &str) -> bool {
        self.iter().any(|e| e == entry)
    }

    /// `root -> ... -> closing`
    fn chain(&self, closing: &str) -> String {
        let mut entries: Vec<&str> = self.iter().collect();
        entries.reverse();
        entries.push(closing);
        entries.join(" -> ")
    }
}

impl fmt::Debug for Ancestry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

struct ResolverInner {
    loader: Arc<dyn ModuleLoader>,
    cache: ResolutionCache,
    extension: String,
    emitter: Arc<dyn EventEmitter>,
}

/// Resolves and inlines the imports of loads against a shared cache
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<ResolverInner>,
}

impl Resolver {
    pub fn new(
        loader: Arc<dyn ModuleLoader>,
        cache: ResolutionCache,
        extension: impl Into<String>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                loader,
                cache,
                extension: extension.into(),
                emitter,
            }),
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.inner.cache
    }

    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.inner.loader
    }

    /// Inline every import of `load`, returning its buffer once all are resolved.
    ///
    /// A source without directives is returned unchanged.
    #[instrument(skip(self, load), fields(address = %load.address()))]
    pub async fn process_source(&self, load: &Load) -> Result<String> {
        let raw = load.source().snapshot();
        let directives = scan_directives(&raw);
        if directives.is_empty() {
            return Ok(raw);
        }

        let base = base_of(load.address(), self.inner.loader.working_dir());
        let (staged, imports) = self.stage(&raw, &directives, &base, load.address())?;
        load.source().set(staged);
        debug!(base = %base, imports = imports.len(), "staged top-level imports");

        let ancestry = Ancestry::root(load.address_arc());
        self.resolve_all(imports, load, &ancestry).await?;

        Ok(load.source().snapshot())
    }

    /// Normalize every directive and replace it with its key placeholder
    fn stage(
        &self,
        raw: &str,
        directives: &[ImportDirective],
        base: &str,
        address: &str,
    ) -> Result<(String, Vec<NormalizedImport>)> {
        let imports = directives
            .iter()
            .map(|d| {
                let specifier = d.specifier.trim();
                if specifier.is_empty() {
                    return Err(SasslineError::EmptySpecifier {
                        address: address.to_string(),
                    });
                }
                Ok(normalize_specifier(specifier, base, &self.inner.extension))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut keys = imports.iter().map(|i| &i.key);
        let staged = replace_directives(raw, directives, |_| {
            keys.next().map(SourceBuffer::placeholder).unwrap_or_default()
        });

        Ok((staged.into_owned(), imports))
    }

    /// Resolve imports concurrently; every branch runs to completion before
    /// the first failure (in directive order) is returned.
    fn resolve_all(
        &self,
        imports: Vec<NormalizedImport>,
        load: &Load,
        ancestry: &Ancestry,
    ) -> BoxFuture<'static, Result<Vec<Arc<str>>>> {
        let branches: Vec<_> = imports
            .into_iter()
            .map(|import| self.resolve_import(import, load.clone(), ancestry.clone()))
            .collect();

        async move { join_all(branches).await.into_iter().collect() }.boxed()
    }

    fn resolve_import(
        &self,
        import: NormalizedImport,
        load: Load,
        ancestry: Ancestry,
    ) -> BoxFuture<'static, Resolution> {
        let this = self.clone();
        async move {
            let NormalizedImport { key, file } = import;
            if ancestry.contains(key.as_str()) {
                return Err(SasslineError::CircularImport {
                    chain: ancestry.chain(key.as_str()),
                });
            }

            let claim = this.inner.cache.claim_key(&key, || {
                this.start_key(key.clone(), file, load.clone(), ancestry.clone())
            });

            match claim {
                Claim::Started(resolution) => resolution.await,
                Claim::Attached(resolution) => {
                    debug!(key = %key, "attached to in-flight key");
                    let text = resolution.await?;
                    this.clear_placeholder(&key, None, &load);
                    Ok(text)
                }
            }
        }
        .boxed()
    }

    /// Fresh resolution of a key: normalize, locate, then share by location
    fn start_key(
        &self,
        key: CanonicalKey,
        file: String,
        load: Load,
        ancestry: Ancestry,
    ) -> BoxFuture<'static, Resolution> {
        let this = self.clone();
        async move {
            let loader = &this.inner.loader;
            let name = loader.normalize(&file, key.base()).await?;
            let located = loader.locate(&name, load.metadata()).await?;
            let location = ResolvedLocation::from_located(&located);
            debug!(key = %key, name = %name, location = %location, "located import");

            if ancestry.contains(location.as_str()) {
                return Err(SasslineError::CircularImport {
                    chain: ancestry.chain(location.as_str()),
                });
            }

            let claim = this.inner.cache.claim_location(&location, || {
                this.start_location(
                    key.clone(),
                    name,
                    location.clone(),
                    load.clone(),
                    ancestry.push(key.as_str()),
                )
            });

            match claim {
                Claim::Started(resolution) => resolution.await,
                Claim::Attached(resolution) => {
                    debug!(key = %key, location = %location, "attached to in-flight location");
                    let text = resolution.await?;
                    this.clear_placeholder(&key, Some(&location), &load);
                    Ok(text)
                }
            }
        }
        .boxed()
    }

    /// Fetch a location once, inline it into the requester, recurse on its imports
    fn start_location(
        &self,
        key: CanonicalKey,
        name: String,
        location: ResolvedLocation,
        load: Load,
        ancestry: Ancestry,
    ) -> BoxFuture<'static, Resolution> {
        let this = self.clone();
        async move {
            let loader = &this.inner.loader;
            let raw = loader.fetch(&name, location.as_str(), load.metadata()).await?;
            this.inner.emitter.emit(EventKind::ImportFetched {
                key: key.as_str().into(),
                location: location.as_str().into(),
                bytes: raw.len(),
            });

            let directives = scan_directives(&raw);
            let base = base_of(location.as_str(), loader.working_dir());
            let (staged, imports) = this.stage(&raw, &directives, &base, location.as_str())?;
            load.source().substitute(&key, &staged);
            debug!(key = %key, location = %location, nested = imports.len(), "inlined fetched import");

            let ancestry = ancestry.push(location.as_str());
            let mut texts = this.resolve_all(imports, &load, &ancestry).await?.into_iter();
            let inlined = replace_directives(&raw, &directives, |_| {
                texts.next().map(|t| t.to_string()).unwrap_or_default()
            });

            Ok(Arc::from(inlined.as_ref()))
        }
        .boxed()
    }

    /// Content already lives in the batch through the first requester
    fn clear_placeholder(&self, key: &CanonicalKey, location: Option<&ResolvedLocation>, load: &Load) {
        load.source().substitute(key, "");
        self.inner.emitter.emit(EventKind::ImportShared {
            key: key.as_str().into(),
            location: location.map(|l| l.as_str().into()),
        });
    }
}
