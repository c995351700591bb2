//! Transformer backend trait and capability negotiation.
//!
//! A backend answers two questions about every action: *can you do it?*
//! ([`TransformerBackend::can_execute`], tri-state) and *do it*
//! ([`TransformerBackend::execute`]). The
//! [`TransformerRegistry`](super::TransformerRegistry) uses the first answer to
//! build an ordered candidate list and the second to walk it.
//!
//! | Capability | Meaning |
//! |---|---|
//! | [`Capability::Preferred`] | Best choice for this action |
//! | [`Capability::Fallback`] | Can do it, but only try after every preferred backend |
//! | [`Capability::Unable`] | Never asked to execute this action |

use super::{ActionKind, TransformAction, TransformOutput};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("{backend} produced an empty result")]
    EmptyResult { backend: String },
    #[error("{backend} returned {returned} output for a {expected} action")]
    UnexpectedOutput {
        backend: String,
        expected: ActionKind,
        returned: ActionKind,
    },
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Preferred,
    Fallback,
    Unable,
}

/// An image processing implementation the registry can dispatch to.
///
/// `can_execute` must be cheap and side-effect free: it is called for every
/// backend on every dispatch.
pub trait TransformerBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Orders backends within a capability tier; lower runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Disabled backends are skipped entirely.
    fn is_enabled(&self) -> bool {
        true
    }

    fn can_execute(&self, action: &TransformAction) -> Capability;

    fn execute(&self, action: &TransformAction) -> Result<TransformOutput, TransformError>;
}
