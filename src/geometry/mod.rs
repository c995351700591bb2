//! Pure geometry for variant sizing.
//!
//! Everything in this module is integer arithmetic on value types: no I/O,
//! no images, no floating point. Rounding is exact half-up on rationals, and
//! every intermediate product is checked so that a request for an absurd size
//! fails with [`GeometryError::NumericOverflow`] instead of wrapping.
//!
//! | Type | Role |
//! |------|------|
//! | [`AspectRatio`] | Reduced rational `p/q` with sign carried on the numerator |
//! | [`Dimensions`] | Width × height; a zero side means "unspecified" |
//! | [`Crop`] | Rectangle on the canvas, optionally expressed against a different source size |

mod crop;
mod dimensions;
mod fraction;

pub use crop::Crop;
pub use dimensions::Dimensions;
pub use fraction::AspectRatio;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("numeric overflow: {0}")]
    NumericOverflow(String),
}
