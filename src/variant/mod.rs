//! Variant descriptions: what the client asks for, what it resolves to, and
//! the key a generated variant is stored under.
//!
//! ```text
//! VariantRequest ──normalize(original)──▶ ResolvedVariant ──(image, context)──▶ VariantKey
//! ```

mod format;
mod key;
mod normalize;
mod request;

pub use format::{ImageAttributes, ImageFormat};
pub use key::{ContextId, ImageId, VariantKey};
pub use normalize::{DensityPolicy, VariantNormalizer, density_multiplier};
pub use request::{Density, ResolvedVariant, VariantRequest};
