//! Crop rectangles.
//!
//! A crop may be expressed against a different image size than the one it is
//! applied to (`source`), e.g. a crop chosen in a 600px wide editor preview of
//! a 2400px original. [`Crop::normalize`] snaps every edge into the source,
//! then rescales onto the canvas, so the result always lies inside
//! `[0, canvas.width) × [0, canvas.height)`. A `box` shrinks the source
//! first: the crop was picked on the source as displayed inside that box.

use super::{Dimensions, GeometryError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crop {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    /// Size of the image the coordinates refer to. `None` means the canvas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Dimensions>,
    /// Box the source was displayed in when the crop was picked; the source
    /// is shrunk to fit it before the coordinates are applied.
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Dimensions>,
}

impl Crop {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            source: None,
            bounds: None,
        }
    }

    pub fn with_source(mut self, source: Dimensions) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_bounds(mut self, bounds: Dimensions) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// The crop covering all of `canvas`.
    pub fn whole(canvas: Dimensions) -> Self {
        Self::new(0, 0, canvas.width.into(), canvas.height.into())
    }

    /// A crop with no area selects nothing.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn dimensions(&self) -> Dimensions {
        let side = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
        Dimensions::new(side(self.width), side(self.height))
    }

    pub fn fits_in(&self, canvas: Dimensions) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x.saturating_add(self.width) <= i64::from(canvas.width)
            && self.y.saturating_add(self.height) <= i64::from(canvas.height)
    }

    /// Map this crop onto `canvas`.
    ///
    /// Returns `None` for an empty crop. Each edge is clamped into the source
    /// independently, so a crop hanging off the top-left loses the overhang
    /// rather than being shifted. The result may still have zero area when the
    /// crop lies entirely outside the image.
    pub fn normalize(&self, canvas: Dimensions) -> Result<Option<Self>, GeometryError> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut source = match self.source {
            Some(source) => source.normalize(canvas)?,
            None => canvas,
        };
        if let Some(bounds) = self.bounds.filter(|b| !b.is_empty()) {
            source = source.scale_to_fit_in(bounds.normalize(canvas)?)?;
        }
        if !source.is_complete() {
            return Err(GeometryError::InvalidRequest(format!(
                "cannot crop an image of size {source}"
            )));
        }

        let (source_w, source_h) = (i64::from(source.width), i64::from(source.height));
        let left = snap(self.x, source_w);
        let top = snap(self.y, source_h);
        let right = snap(self.x.saturating_add(self.width), source_w);
        let bottom = snap(self.y.saturating_add(self.height), source_h);

        let (x, width) = rescale(left, right, source_w, canvas.width.into());
        let (y, height) = rescale(top, bottom, source_h, canvas.height.into());
        Ok(Some(Self::new(x, y, width, height)))
    }
}

fn snap(edge: i64, limit: i64) -> i64 {
    edge.clamp(0, limit)
}

/// Rescale `[start, end)` from a `from`-sized axis onto a `to`-sized one,
/// truncating.
fn rescale(start: i64, end: i64, from: i64, to: i64) -> (i64, i64) {
    let length = end.saturating_sub(start).max(0);
    if from == to {
        return (start, length);
    }
    let scale = |v: i64| (i128::from(v) * i128::from(to) / i128::from(from)) as i64;
    (scale(start), scale(length))
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}
