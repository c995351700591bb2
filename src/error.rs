//! Engine-level error taxonomy.
//!
//! [`EngineError`] is `Clone`: a single generation outcome is handed verbatim
//! to every caller waiting on the same variant. Sources that are not
//! themselves clonable are held behind `Arc`, so all waiters observe the
//! *same* underlying error value.

use crate::geometry::GeometryError;
use crate::store::StoreError;
use crate::transform::{ActionKind, TransformError};
use crate::variant::ImageId;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("numeric overflow: {0}")]
    NumericOverflow(String),
    #[error("image {0} not found")]
    NotFound(ImageId),
    #[error("no transformer is able to execute {0}")]
    NoCapableTransformer(ActionKind),
    #[error("{attempts} transformer(s) failed to execute {action}, last error: {last}")]
    AllTransformersFailed {
        action: ActionKind,
        attempts: usize,
        #[source]
        last: Arc<TransformError>,
    },
    #[error("variant generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("variant generation was cancelled")]
    Cancelled,
    #[error("store failure: {0}")]
    StoreFailure(#[source] Arc<StoreError>),
    /// The producer panicked or could not be started.
    #[error("variant producer aborted: {0}")]
    ProducerAborted(String),
    #[error("engine startup failed: {0}")]
    Startup(String),
}

impl From<GeometryError> for EngineError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            GeometryError::NumericOverflow(msg) => Self::NumericOverflow(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::StoreFailure(Arc::new(err))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
