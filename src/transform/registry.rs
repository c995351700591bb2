//! Capability-negotiated dispatch over a fixed set of backends.
//!
//! Backends are sorted by priority once, when the registry is built (stable,
//! so equal priorities keep registration order). Every dispatch then:
//!
//! 1. asks each enabled backend [`can_execute`](TransformerBackend::can_execute),
//! 2. tries every `Preferred` backend, then every `Fallback` one, in order,
//! 3. returns the first non-empty output of the right kind.
//!
//! A failing backend is logged and skipped. Only when every candidate has
//! failed does the dispatch fail, carrying the last backend error.
//!
//! Backend calls are bounded by a global permit pool so a burst of variant
//! requests cannot run more than `concurrent_transforms` decodes at once.

use super::{
    ActionKind, Capability, ImageBytes, SourceImage, TransformAction, TransformError,
    TransformOutput, TransformerBackend,
};
use crate::coordinator::CancelToken;
use crate::error::EngineError;
use crate::geometry::Dimensions;
use crate::variant::{ImageAttributes, ResolvedVariant};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Counting semaphore over a bounded channel pre-filled with tokens.
pub struct TransformPermits {
    tokens: Receiver<()>,
    returns: Sender<()>,
    limit: usize,
}

/// Returns its token on drop.
pub struct Permit<'a> {
    returns: &'a Sender<()>,
}

impl TransformPermits {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        let (returns, tokens) = bounded(limit);
        for _ in 0..limit {
            let _ = returns.try_send(());
        }
        Self {
            tokens,
            returns,
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Tokens currently free.
    pub fn available(&self) -> usize {
        self.tokens.len()
    }

    pub fn acquire(&self) -> Permit<'_> {
        // `self` owns a sender, so the channel cannot disconnect here.
        let _ = self.tokens.recv();
        Permit {
            returns: &self.returns,
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.returns.try_send(());
    }
}

/// Candidates for one action, in the order they will be tried.
pub struct DispatchPlan<'a> {
    pub preferred: Vec<&'a dyn TransformerBackend>,
    pub fallback: Vec<&'a dyn TransformerBackend>,
}

impl<'a> DispatchPlan<'a> {
    pub fn is_empty(&self) -> bool {
        self.preferred.is_empty() && self.fallback.is_empty()
    }

    pub fn len(&self) -> usize {
        self.preferred.len() + self.fallback.len()
    }

    pub fn candidates(&self) -> impl Iterator<Item = &'a dyn TransformerBackend> + '_ {
        self.preferred.iter().chain(&self.fallback).copied()
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.candidates().map(|b| b.name()).collect()
    }
}

pub struct TransformerRegistry {
    backends: Vec<Arc<dyn TransformerBackend>>,
    permits: Option<TransformPermits>,
}

impl TransformerRegistry {
    pub fn new(mut backends: Vec<Arc<dyn TransformerBackend>>) -> Self {
        backends.sort_by_key(|b| b.priority());
        Self {
            backends,
            permits: None,
        }
    }

    /// Bound the number of backend calls running at once.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.permits = Some(TransformPermits::new(limit));
        self
    }

    pub fn permits(&self) -> Option<&TransformPermits> {
        self.permits.as_ref()
    }

    /// Registered backends in priority order.
    pub fn backends(&self) -> impl Iterator<Item = &dyn TransformerBackend> {
        self.backends.iter().map(|b| b.as_ref())
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn TransformerBackend>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    pub fn plan(&self, action: &TransformAction) -> DispatchPlan<'_> {
        let mut plan = DispatchPlan {
            preferred: Vec::new(),
            fallback: Vec::new(),
        };
        for backend in self.backends().filter(|b| b.is_enabled()) {
            match backend.can_execute(action) {
                Capability::Preferred => plan.preferred.push(backend),
                Capability::Fallback => plan.fallback.push(backend),
                Capability::Unable => {}
            }
        }
        plan
    }

    pub fn execute(
        &self,
        action: &TransformAction,
        cancel: &CancelToken,
    ) -> Result<TransformOutput, EngineError> {
        let kind = action.kind();
        let plan = self.plan(action);
        if plan.is_empty() {
            return Err(EngineError::NoCapableTransformer(kind));
        }

        let mut last_error = None;
        for backend in plan.candidates() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let started = Instant::now();
            let outcome = {
                let _permit = self.permits.as_ref().map(TransformPermits::acquire);
                backend.execute(action)
            };
            let error = match outcome {
                Ok(output) if output.kind() != kind => TransformError::UnexpectedOutput {
                    backend: backend.name().to_string(),
                    expected: kind,
                    returned: output.kind(),
                },
                Ok(output) if output.is_empty() => TransformError::EmptyResult {
                    backend: backend.name().to_string(),
                },
                Ok(output) => {
                    debug!(
                        backend = backend.name(),
                        action = %kind,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "transform completed"
                    );
                    return Ok(output);
                }
                Err(err) => err,
            };
            warn!(backend = backend.name(), action = %kind, error = %error, "transformer failed, trying next");
            last_error = Some(error);
        }

        Err(EngineError::AllTransformersFailed {
            action: kind,
            attempts: plan.len(),
            last: Arc::new(last_error.unwrap_or_else(|| {
                TransformError::Failed("no transformer produced a result".into())
            })),
        })
    }

    pub fn compute_dimensions(&self, source: SourceImage) -> Result<Dimensions, EngineError> {
        match self.execute(
            &TransformAction::ComputeDimensions { source },
            &CancelToken::new(),
        )? {
            TransformOutput::Dimensions(dimensions) => Ok(dimensions),
            other => Err(mismatch(ActionKind::ComputeDimensions, &other)),
        }
    }

    pub fn compute_attributes(&self, bytes: ImageBytes) -> Result<ImageAttributes, EngineError> {
        match self.execute(
            &TransformAction::ComputeAttributes { bytes },
            &CancelToken::new(),
        )? {
            TransformOutput::Attributes(attributes) => Ok(attributes),
            other => Err(mismatch(ActionKind::ComputeAttributes, &other)),
        }
    }

    pub fn modify(
        &self,
        source: SourceImage,
        variant: ResolvedVariant,
        cancel: &CancelToken,
    ) -> Result<ImageBytes, EngineError> {
        match self.execute(&TransformAction::Modify { source, variant }, cancel)? {
            TransformOutput::Image(bytes) => Ok(bytes),
            other => Err(mismatch(ActionKind::Modify, &other)),
        }
    }
}

// Unreachable in practice: `execute` already rejects outputs of the wrong kind.
fn mismatch(expected: ActionKind, output: &TransformOutput) -> EngineError {
    EngineError::AllTransformersFailed {
        action: expected,
        attempts: 1,
        last: Arc::new(TransformError::UnexpectedOutput {
            backend: "registry".into(),
            expected,
            returned: output.kind(),
        }),
    }
}
