//! Exact aspect ratios.
//!
//! An [`AspectRatio`] is always stored reduced (`gcd(p, q) == 1`) with a
//! positive denominator, so two ratios describing the same proportion have
//! identical fields. A zero denominator collapses to [`AspectRatio::UNDEFINED`].
//!
//! Side calculations round half-up on the exact rational value:
//!
//! ```
//! # use image_variants::geometry::AspectRatio;
//! let ratio = AspectRatio::new(700, 467).unwrap();
//! assert_eq!(ratio.calculate_width_for_height(419).unwrap(), 628);
//! assert_eq!(ratio.calculate_height_for_width(628).unwrap(), 419);
//! ```

use super::GeometryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A reduced rational `numerator / denominator`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    numerator: i32,
    denominator: i32,
}

impl AspectRatio {
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// The result of any ratio with a zero denominator.
    pub const UNDEFINED: Self = Self {
        numerator: 0,
        denominator: 0,
    };

    /// Build a reduced ratio. Fails if the reduced terms do not fit in `i32`.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, GeometryError> {
        Self::reduce(numerator.into(), denominator.into())
    }

    /// The ratio `width / height` of a pair of sides.
    pub fn from_sides(width: u32, height: u32) -> Result<Self, GeometryError> {
        Self::new(width.into(), height.into())
    }

    fn reduce(numerator: i128, denominator: i128) -> Result<Self, GeometryError> {
        if denominator == 0 {
            return Ok(Self::UNDEFINED);
        }
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()) as i128;
        let (mut numerator, mut denominator) = (numerator / divisor, denominator / divisor);
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }
        match (i32::try_from(numerator), i32::try_from(denominator)) {
            (Ok(numerator), Ok(denominator)) => Ok(Self {
                numerator,
                denominator,
            }),
            _ => Err(GeometryError::NumericOverflow(format!(
                "ratio {numerator}/{denominator} cannot be represented"
            ))),
        }
    }

    pub fn numerator(self) -> i32 {
        self.numerator
    }

    pub fn denominator(self) -> i32 {
        self.denominator
    }

    pub fn is_undefined(self) -> bool {
        self.denominator == 0
    }

    /// Wider than tall. `1/1` is neither larger on width nor on height.
    pub fn is_larger_on_width(self) -> bool {
        self.numerator > self.denominator
    }

    pub fn is_larger_on_height(self) -> bool {
        self.numerator < self.denominator
    }

    /// `round(height * p / q)`.
    pub fn calculate_width_for_height(self, height: u32) -> Result<u32, GeometryError> {
        self.scale(height, self.numerator, self.denominator)
    }

    /// `round(width * q / p)`.
    pub fn calculate_height_for_width(self, width: u32) -> Result<u32, GeometryError> {
        self.scale(width, self.denominator, self.numerator)
    }

    fn scale(self, value: u32, multiplier: i32, divisor: i32) -> Result<u32, GeometryError> {
        if divisor <= 0 || multiplier < 0 {
            return Err(GeometryError::InvalidRequest(format!(
                "cannot derive a side from aspect ratio {self}"
            )));
        }
        let (divisor, scaled) = (divisor as u128, value as u128 * multiplier as u128);
        let rounded = (2 * scaled + divisor) / (2 * divisor);
        u32::try_from(rounded).map_err(|_| {
            GeometryError::NumericOverflow(format!("{value} scaled by {self} exceeds u32"))
        })
    }

    pub fn multiply_with(self, other: Self) -> Result<Self, GeometryError> {
        Self::reduce(
            i128::from(self.numerator) * i128::from(other.numerator),
            i128::from(self.denominator) * i128::from(other.denominator),
        )
    }

    pub fn divide_by(self, other: Self) -> Result<Self, GeometryError> {
        if other.numerator == 0 {
            return Err(GeometryError::InvalidRequest(format!(
                "cannot divide {self} by {other}"
            )));
        }
        Self::reduce(
            i128::from(self.numerator) * i128::from(other.denominator),
            i128::from(self.denominator) * i128::from(other.numerator),
        )
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl PartialEq for AspectRatio {
    fn eq(&self, other: &Self) -> bool {
        if self.is_undefined() || other.is_undefined() {
            return self.is_undefined() && other.is_undefined();
        }
        i64::from(self.numerator) * i64::from(other.denominator)
            == i64::from(other.numerator) * i64::from(self.denominator)
    }
}

impl Eq for AspectRatio {}

impl Hash for AspectRatio {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numerator.hash(state);
        self.denominator.hash(state);
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Parses `"p/q"` with both terms positive decimal integers.
impl FromStr for AspectRatio {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || GeometryError::InvalidRequest(format!("invalid aspect ratio {s:?}, expected \"p/q\""));
        let (p, q) = s.trim().split_once('/').ok_or_else(invalid)?;
        let digits = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
        if !digits(p) || !digits(q) {
            return Err(invalid());
        }
        let p: u32 = p.parse().map_err(|_| invalid())?;
        let q: u32 = q.parse().map_err(|_| invalid())?;
        if p == 0 || q == 0 {
            return Err(invalid());
        }
        Self::from_sides(p, q)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = GeometryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(p: i64, q: i64) -> AspectRatio {
        AspectRatio::new(p, q).unwrap()
    }

    // =========================================================================
    // Construction and normalization
    // =========================================================================

    #[test]
    fn reduces_by_gcd() {
        let r = ratio(11, 77);
        assert_eq!((r.numerator(), r.denominator()), (1, 7));
    }

    #[test]
    fn sign_moves_to_numerator() {
        let r = ratio(120, -40);
        assert_eq!((r.numerator(), r.denominator()), (-3, 1));
        assert_eq!(ratio(-1, -2), ratio(1, 2));
    }

    #[test]
    fn zero_numerator_reduces_to_zero_over_one() {
        let r = ratio(0, 1);
        assert_eq!((r.numerator(), r.denominator()), (0, 1));
        let r = ratio(0, 17);
        assert_eq!((r.numerator(), r.denominator()), (0, 1));
    }

    #[test]
    fn zero_denominator_is_undefined() {
        assert!(ratio(4, 0).is_undefined());
        assert_eq!(ratio(4, 0), AspectRatio::UNDEFINED);
        assert_ne!(AspectRatio::UNDEFINED, ratio(0, 1));
    }

    #[test]
    fn equality_is_by_proportion() {
        assert_eq!(ratio(4, 3), ratio(800, 600));
        assert_ne!(ratio(4, 3), ratio(3, 4));
    }

    #[test]
    fn oversized_terms_overflow() {
        let err = AspectRatio::new(i64::from(i32::MAX) + 1, 1).unwrap_err();
        assert!(matches!(err, GeometryError::NumericOverflow(_)));
    }

    #[test]
    fn orientation() {
        assert!(ratio(4, 3).is_larger_on_width());
        assert!(ratio(3, 4).is_larger_on_height());
        assert!(!ratio(4, 4).is_larger_on_width());
        assert!(!ratio(4, 4).is_larger_on_height());
    }

    // =========================================================================
    // Side calculations
    // =========================================================================

    #[test]
    fn width_for_height() {
        assert_eq!(ratio(4, 3).calculate_width_for_height(600).unwrap(), 800);
        assert_eq!(ratio(700, 467).calculate_width_for_height(419).unwrap(), 628);
    }

    #[test]
    fn height_for_width() {
        assert_eq!(ratio(700, 467).calculate_height_for_width(628).unwrap(), 419);
        assert_eq!(ratio(16, 9).calculate_height_for_width(16).unwrap(), 9);
    }

    #[test]
    fn rounds_half_up() {
        // 3 * 1/2 = 1.5
        assert_eq!(ratio(1, 2).calculate_width_for_height(3).unwrap(), 2);
        // 5 * 1/2 = 2.5
        assert_eq!(ratio(1, 2).calculate_width_for_height(5).unwrap(), 3);
        // 1 * 1/3 = 0.33
        assert_eq!(ratio(1, 3).calculate_width_for_height(1).unwrap(), 0);
    }

    #[test]
    fn side_from_undefined_ratio_is_invalid() {
        let err = AspectRatio::UNDEFINED
            .calculate_width_for_height(10)
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidRequest(_)));
        let err = ratio(0, 1).calculate_height_for_width(10).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidRequest(_)));
    }

    #[test]
    fn side_beyond_u32_overflows() {
        let err = ratio(i64::from(i32::MAX), 1)
            .calculate_width_for_height(u32::MAX)
            .unwrap_err();
        assert!(matches!(err, GeometryError::NumericOverflow(_)));
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    #[test]
    fn multiply() {
        assert_eq!(ratio(4, 3).multiply_with(ratio(4, 3)).unwrap(), ratio(16, 9));
    }

    #[test]
    fn divide() {
        assert_eq!(ratio(16, 9).divide_by(ratio(4, 3)).unwrap(), ratio(4, 3));
    }

    #[test]
    fn multiply_overflow_is_error() {
        let max = ratio(i64::from(i32::MAX), 1);
        assert!(matches!(
            max.multiply_with(ratio(2, 1)),
            Err(GeometryError::NumericOverflow(_))
        ));
        let min = ratio(i64::from(i32::MIN), 1);
        assert!(matches!(
            min.multiply_with(ratio(2, 1)),
            Err(GeometryError::NumericOverflow(_))
        ));
    }

    #[test]
    fn divide_underflow_is_error() {
        let tiny = ratio(1, i64::from(i32::MAX));
        assert!(matches!(
            tiny.divide_by(ratio(2, 1)),
            Err(GeometryError::NumericOverflow(_))
        ));
    }

    #[test]
    fn divide_by_zero_is_invalid() {
        assert!(matches!(
            ratio(4, 3).divide_by(ratio(0, 1)),
            Err(GeometryError::InvalidRequest(_))
        ));
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parse_ratio() {
        assert_eq!("16/9".parse::<AspectRatio>().unwrap(), ratio(16, 9));
        assert_eq!("800/600".parse::<AspectRatio>().unwrap(), ratio(4, 3));
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["", "16", "16:9", "a/b", "-4/3", "4/0", "0/3", "4/3/2", "4 /3"] {
            assert!(
                matches!(bad.parse::<AspectRatio>(), Err(GeometryError::InvalidRequest(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let r: AspectRatio = serde_json::from_str("\"4/3\"").unwrap();
        assert_eq!(r, ratio(4, 3));
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"4/3\"");
        assert!(serde_json::from_str::<AspectRatio>("\"4x3\"").is_err());
    }
}
