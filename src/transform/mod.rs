//! Transformer backends and the registry that dispatches to them.
//!
//! ```text
//! TransformAction ──▶ TransformerRegistry::plan ──▶ [Preferred…, Fallback…] ──▶ first success
//! ```
//!
//! | Module | Role |
//! |---|---|
//! | [`action`] | Actions, their kinds and outputs |
//! | [`backend`] | [`TransformerBackend`] trait, [`Capability`], [`TransformError`] |
//! | [`registry`] | Ordered dispatch with fallback and a global concurrency limit |
//! | [`params`] | Backend-neutral pixel parameters for a modify |
//! | [`raster`] | `image`-crate implementation for raster formats |

pub mod action;
pub mod backend;
pub mod params;
pub mod raster;
pub mod registry;

pub use action::{ActionKind, ImageBytes, SourceImage, TransformAction, TransformOutput};
pub use backend::{Capability, TransformError, TransformerBackend};
pub use params::{ModifyParams, Quality};
pub use raster::RasterTransformer;
pub use registry::{DispatchPlan, TransformPermits, TransformerRegistry};
