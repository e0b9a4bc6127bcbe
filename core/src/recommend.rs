use crate::catalog::{Catalog, Item};
use crate::config::RecommenderConfig;
use crate::error::{IndexError, RecommendError};
use crate::features::compose_all;
use crate::index::{fingerprint, VectorIndex};
use crate::rank::rank;
use crate::resolve::{Resolution, TitleResolver};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item: Item,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    /// The catalog title the query resolved to.
    pub resolved: Resolution,
    /// Best first, never including `resolved` itself.
    pub items: Vec<Recommendation>,
}

/// A catalog together with the index built from it. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct Recommender {
    catalog: Catalog,
    index: VectorIndex,
    resolver: TitleResolver,
    config: RecommenderConfig,
}

impl Recommender {
    pub fn build(catalog: Catalog, config: RecommenderConfig) -> Result<Self, IndexError> {
        let blobs = compose_all(&catalog, &config.weights);
        let index = VectorIndex::build(&blobs, &config.tokenizer)?;
        Ok(Self::from_parts(catalog, index, config))
    }

    /// Caller guarantees `index` was built from `catalog` under `config`.
    pub(crate) fn from_parts(
        catalog: Catalog,
        index: VectorIndex,
        config: RecommenderConfig,
    ) -> Self {
        let resolver = TitleResolver::new(&catalog, config.resolver);
        Self { catalog, index, resolver, config }
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn index(&self) -> &VectorIndex { &self.index }
    pub fn config(&self) -> &RecommenderConfig { &self.config }
    pub fn resolver(&self) -> &TitleResolver { &self.resolver }

    /// Resolve `query` to a title and return up to `k` of its most similar items.
    ///
    /// `k` is clamped to `[1, N - 1]`, so a single-item catalog yields an empty list.
    pub fn recommend(&self, query: &str, k: usize) -> Result<Recommendations, RecommendError> {
        if query.trim().is_empty() {
            return Err(RecommendError::EmptyQuery);
        }
        let resolved = self
            .resolver
            .resolve(query)
            .ok_or_else(|| RecommendError::NotFound { query: query.trim().to_string() })?;

        let k = k.max(1).min(self.catalog.len().saturating_sub(1));
        let items = rank(resolved.id, self.index.matrix(), k)
            .into_iter()
            .filter_map(|(id, score)| self.catalog.get(id).map(|item| Recommendation { item: item.clone(), score }))
            .collect::<Vec<_>>();
        tracing::debug!(query, resolved = %resolved.title, k, returned = items.len(), "recommendations ranked");
        Ok(Recommendations { resolved, items })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Same catalog and config as the published recommender; nothing was swapped.
    Unchanged,
    /// Titles or display columns changed but the feature blobs did not. The new
    /// catalog was published over the existing index.
    Refreshed,
    Rebuilt,
}

impl ReloadOutcome {
    /// Whether a new recommender was published.
    pub fn published(self) -> bool { self != ReloadOutcome::Unchanged }
}

/// The published recommender, shared by concurrent queries.
///
/// Queries take an `Arc` snapshot and run without holding the lock, so a reload
/// never exposes a half-built index and in-flight queries finish on the old one.
pub struct SharedRecommender {
    current: RwLock<Arc<Recommender>>,
}

impl SharedRecommender {
    pub fn new(recommender: Recommender) -> Self {
        Self { current: RwLock::new(Arc::new(recommender)) }
    }

    pub fn snapshot(&self) -> Arc<Recommender> { self.current.read().clone() }

    /// Swap in a fully built recommender, returning the one it replaced.
    pub fn publish(&self, next: Recommender) -> Arc<Recommender> {
        let next = Arc::new(next);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Publish `catalog`, rebuilding the index only when its feature blobs or the
    /// config changed.
    pub fn reload(
        &self,
        catalog: Catalog,
        config: RecommenderConfig,
    ) -> Result<ReloadOutcome, IndexError> {
        let current = self.snapshot();
        let blobs = compose_all(&catalog, &config.weights);
        if current.config == config
            && current.index.fingerprint() == fingerprint(&blobs, &config.tokenizer)
        {
            if current.catalog == catalog {
                tracing::info!(
                    fingerprint = current.index.fingerprint(),
                    "catalog unchanged; keeping published recommender"
                );
                return Ok(ReloadOutcome::Unchanged);
            }
            tracing::info!(
                fingerprint = current.index.fingerprint(),
                "titles or display columns changed; reusing index"
            );
            let index = current.index.clone();
            self.publish(Recommender::from_parts(catalog, index, config));
            return Ok(ReloadOutcome::Refreshed);
        }
        let index = VectorIndex::build(&blobs, &config.tokenizer)?;
        self.publish(Recommender::from_parts(catalog, index, config));
        Ok(ReloadOutcome::Rebuilt)
    }

    pub fn recommend(&self, query: &str, k: usize) -> Result<Recommendations, RecommendError> {
        self.snapshot().recommend(query, k)
    }
}
