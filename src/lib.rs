//! # Image Variants
//!
//! An engine that turns client requests for an image ("800 wide", "this crop
//! at 4/3", "as PNG") into concrete image bytes, generating each distinct
//! variant at most once no matter how many callers ask for it concurrently.
//!
//! # Architecture: Resolve, Dispatch, Coordinate
//!
//! ```text
//! 1. Resolve     VariantRequest + original attributes  →  ResolvedVariant
//! 2. Coordinate  VariantKey                            →  one producer per key
//! 3. Dispatch    TransformAction                       →  first backend that succeeds
//! ```
//!
//! Resolution is pure arithmetic over the original's dimensions, so two
//! requests that mean the same thing resolve to the same [`ResolvedVariant`]
//! and share a cache entry and a generation. Pixels are only touched in the
//! dispatch stage, by whichever backend claims the action.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Exact aspect ratios, dimensions and crop arithmetic |
//! | [`variant`] | Requests, resolved variants, the normalizer, formats and cache keys |
//! | [`transform`] | Backend trait, tri-state capability dispatch and the built-in raster backend |
//! | [`coordinator`] | Per-key single-flight generation with timeout and cancellation |
//! | [`store`] | Metadata, original and variant store traits with memory and directory implementations |
//! | [`engine`] | [`VariantEngine`]: resolve, materialize and prefetch |
//! | [`config`] | `engine.toml` loading over stock defaults, and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | [`EngineError`], shared verbatim by every waiter on a variant |
//!
//! # Design Decisions
//!
//! ## Exact Rational Arithmetic
//!
//! Aspect ratios are reduced integer fractions and every derived side is
//! computed with half-up rounding in 128-bit integers. No floating point is
//! involved, so `1024x768` at `4/3` always yields the same side on every
//! platform, and an overflowing side is a [`EngineError::NumericOverflow`]
//! rather than a silently wrapped value.
//!
//! ## Preferred, Fallback, Unable
//!
//! Backends declare per action whether they are the best choice, merely able,
//! or unable. Every preferred backend is tried before any fallback one, in
//! ascending priority order within each group, and a failing backend hands
//! over to the next. Adding a specialised backend never breaks the general
//! one it sits in front of.
//!
//! ## Failures Are Shared, Not Cached
//!
//! All callers waiting on a variant receive the owner's outcome, including
//! its error. The in-flight entry is removed as soon as that outcome is
//! published, so the next request after a failure starts a fresh attempt.

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod store;
pub mod transform;
pub mod variant;

pub use coordinator::{CancelToken, VariantCoordinator};
pub use engine::{Collaborators, VariantEngine};
pub use error::EngineError;
pub use variant::{ContextId, ImageFormat, ImageId, ResolvedVariant, VariantKey, VariantRequest};
