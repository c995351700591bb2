//! Identity of a generated variant.
//!
//! A [`VariantKey`] is what the coordinator deduplicates on and what the
//! variant store files bytes under. [`VariantKey::digest`] is a SHA-256 over
//! a domain-tagged, little-endian encoding of every field, so it is stable
//! across processes and usable as a storage name.

use super::ResolvedVariant;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tenant or site the variant is rendered for. Variants in different
/// contexts are cached independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub image: ImageId,
    pub context: Option<ContextId>,
    pub variant: ResolvedVariant,
}

impl VariantKey {
    pub fn new(image: ImageId, variant: ResolvedVariant) -> Self {
        Self {
            image,
            context: None,
            variant,
        }
    }

    pub fn in_context(mut self, context: ContextId) -> Self {
        self.context = Some(context);
        self
    }

    pub fn digest(&self) -> String {
        let v = &self.variant;
        let mut hasher = Sha256::new();
        hasher.update(b"variant\0");
        hasher.update(self.image.0.to_le_bytes());
        match self.context {
            Some(context) => {
                hasher.update(b"\x01");
                hasher.update(context.0.to_le_bytes());
            }
            None => hasher.update(b"\x00"),
        }
        hasher.update(v.output.width.to_le_bytes());
        hasher.update(v.output.height.to_le_bytes());
        for edge in [v.crop.x, v.crop.y, v.crop.width, v.crop.height] {
            hasher.update(edge.to_le_bytes());
        }
        hasher.update(v.density.horizontal.to_le_bytes());
        hasher.update(v.density.vertical.to_le_bytes());
        hasher.update(v.format.extension().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// `<image>-<width>x<height>-<digest prefix>.<ext>`
    pub fn file_name(&self) -> String {
        let digest = self.digest();
        format!(
            "{}-{}-{}.{}",
            self.image,
            self.variant.target_dimensions(),
            &digest[..16],
            self.variant.format.extension()
        )
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context {
            Some(context) => write!(f, "image {} [{}]: {}", self.image, context.0, self.variant),
            None => write!(f, "image {}: {}", self.image, self.variant),
        }
    }
}
