//! The variant engine: resolve requests, materialize variants.
//!
//! ```text
//! resolve(image, request)
//!     MetadataLookup ──▶ VariantNormalizer ──▶ ResolvedVariant
//!
//! materialize(image, variant)
//!     VariantStore hit? ──yes──▶ touch, return
//!          │ no
//!          ▼
//!     VariantCoordinator (one producer per key)
//!          └─ producer: re-check store ─▶ load original ─▶ registry.modify ─▶ store.put
//!          ▼
//!     touch unless the original was passed through, return
//! ```
//!
//! A variant that cannot be persisted is still returned to every caller
//! waiting on it, but nothing is recorded as cached: the next request after
//! the in-flight entry retires generates it again. A failed put never removes
//! what is already stored under the key, since a concurrent writer may have
//! just landed a good copy.

use crate::config::{EngineConfig, effective_threads};
use crate::coordinator::{CancelToken, CoordinatorStats, VariantCoordinator};
use crate::error::EngineError;
use crate::store::{MetadataLookup, OriginalStore, VariantStore};
use crate::transform::{
    ImageBytes, RasterTransformer, TransformerBackend, TransformerRegistry,
};
use crate::variant::{
    ContextId, ImageAttributes, ImageId, ResolvedVariant, VariantKey, VariantNormalizer,
    VariantRequest,
};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The stores an engine reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn MetadataLookup>,
    pub originals: Arc<dyn OriginalStore>,
    pub variants: Arc<dyn VariantStore>,
}

pub struct VariantEngine {
    collaborators: Collaborators,
    transformers: Arc<TransformerRegistry>,
    normalizer: VariantNormalizer,
    coordinator: VariantCoordinator<VariantKey>,
    pool: rayon::ThreadPool,
}

impl VariantEngine {
    pub fn new(
        config: &EngineConfig,
        collaborators: Collaborators,
        transformers: TransformerRegistry,
    ) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|e| EngineError::Startup(e.to_string()))?;
        let workers = effective_threads(&config.processing);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("variant-prefetch-{i}"))
            .build()
            .map_err(|e| EngineError::Startup(e.to_string()))?;
        info!(
            workers,
            timeout_ms = config.coordinator.timeout_ms,
            backends = transformers.backends().count(),
            "variant engine ready"
        );
        Ok(Self {
            collaborators,
            transformers: Arc::new(transformers),
            normalizer: VariantNormalizer::new(config.density),
            coordinator: VariantCoordinator::new(config.coordinator.timeout()),
            pool,
        })
    }

    /// The built-in raster backend plus `extra`, limited to
    /// `processing.concurrent_transforms` concurrent calls.
    pub fn default_transformers(
        config: &EngineConfig,
        extra: Vec<Arc<dyn TransformerBackend>>,
    ) -> TransformerRegistry {
        let mut backends: Vec<Arc<dyn TransformerBackend>> = vec![Arc::new(
            RasterTransformer::from_config(&config.transformers.raster),
        )];
        backends.extend(extra);
        TransformerRegistry::new(backends)
            .with_concurrency_limit(config.processing.concurrent_transforms)
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    pub fn coordinator_stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    /// Identify raw upload bytes.
    pub fn identify(&self, bytes: ImageBytes) -> Result<ImageAttributes, EngineError> {
        self.transformers.compute_attributes(bytes)
    }

    pub fn resolve(
        &self,
        image: ImageId,
        request: &VariantRequest,
    ) -> Result<ResolvedVariant, EngineError> {
        let original = self
            .collaborators
            .metadata
            .original_attributes(image)?
            .ok_or(EngineError::NotFound(image))?;
        Ok(self.normalizer.normalize(request, &original)?)
    }

    pub fn materialize(
        &self,
        image: ImageId,
        variant: &ResolvedVariant,
    ) -> Result<ImageBytes, EngineError> {
        self.materialize_key(VariantKey::new(image, *variant))
    }

    pub fn materialize_in_context(
        &self,
        image: ImageId,
        context: ContextId,
        variant: &ResolvedVariant,
    ) -> Result<ImageBytes, EngineError> {
        self.materialize_key(VariantKey::new(image, *variant).in_context(context))
    }

    fn materialize_key(&self, key: VariantKey) -> Result<ImageBytes, EngineError> {
        let variants = &self.collaborators.variants;
        let hit = variants.get(&key).unwrap_or_else(|err| {
            warn!(key = %key, error = %err, "variant store lookup failed, regenerating");
            None
        });
        // An empty variant is either the original passed through, which is
        // never stored, or a format change that `put` has just stamped.
        let stored = hit.is_some() || !key.variant.is_empty();
        let bytes = match hit {
            Some(bytes) => bytes,
            None => {
                let generation = Generation {
                    key,
                    originals: Arc::clone(&self.collaborators.originals),
                    variants: Arc::clone(variants),
                    transformers: Arc::clone(&self.transformers),
                };
                self.coordinator
                    .get_or_generate(&key, move |cancel| generation.run(cancel))?
            }
        };
        if stored && let Err(err) = variants.touch(&key) {
            debug!(key = %key, error = %err, "could not record variant access");
        }
        Ok(bytes)
    }

    /// Resolve and materialize a batch of requests for one image in parallel.
    ///
    /// Results are in request order. Duplicate requests in the batch are
    /// generated once.
    pub fn prefetch(
        &self,
        image: ImageId,
        requests: &[VariantRequest],
    ) -> Vec<Result<ResolvedVariant, EngineError>> {
        self.pool.install(|| {
            requests
                .par_iter()
                .map(|request| {
                    let variant = self.resolve(image, request)?;
                    self.materialize(image, &variant)?;
                    Ok(variant)
                })
                .collect()
        })
    }
}

/// Everything a producer needs, owned so it can outlive the caller on timeout.
struct Generation {
    key: VariantKey,
    originals: Arc<dyn OriginalStore>,
    variants: Arc<dyn VariantStore>,
    transformers: Arc<TransformerRegistry>,
}

impl Generation {
    fn run(self, cancel: &CancelToken) -> Result<ImageBytes, EngineError> {
        let key = self.key;
        // A previous owner may have stored it after our lookup.
        if let Ok(Some(bytes)) = self.variants.get(&key) {
            return Ok(bytes);
        }

        let source = self
            .originals
            .load_original(key.image)?
            .ok_or(EngineError::NotFound(key.image))?;
        if key.variant.is_empty() && key.variant.format == source.format {
            debug!(key = %key, "serving original unmodified");
            return Ok(source.bytes);
        }

        let started = Instant::now();
        let bytes = self.transformers.modify(source, key.variant, cancel)?;
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        match self.variants.put(&key, &bytes) {
            Ok(()) => info!(
                key = %key,
                size = bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "variant generated"
            ),
            Err(err) => {
                error!(key = %key, error = %err, "failed to store variant, serving it uncached")
            }
        }
        Ok(bytes)
    }
}
