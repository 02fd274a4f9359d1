//! Fixed-point math utilities for deterministic simulation.
//!
//! All combat geometry uses fixed-point arithmetic so that identical
//! inputs produce bit-identical polygons, destinations and resource
//! values on every platform. This includes the trigonometry used to
//! cast field-of-view rays.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Largest coordinate magnitude the simulation accepts.
///
/// Keeps squared distances between any two arena points well inside
/// the `I32F32` range.
pub const ARENA_LIMIT: Fixed = Fixed::from_bits(10_000_i64 << 32);

/// Multiplier converting degrees to radians.
const DEG_TO_RAD: Fixed = Fixed::from_bits(74_961_321);

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for hand-authored data files.
///
/// Numbers are written as ordinary decimals (`range: 3.5`) and converted
/// to fixed point once, at the load boundary. Never use this for state
/// that must round-trip exactly; use [`fixed_serde`] there.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Convenience constructor from integers.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Unit vector for a bearing in degrees.
    ///
    /// Bearing 0 points along +Y and bearings grow clockwise, so
    /// bearing 90 points along +X.
    #[must_use]
    pub fn from_bearing(degrees: Fixed) -> Self {
        let (sin, cos) = sin_cos_degrees(degrees);
        Self::new(sin, cos)
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// 2D cross product (z component of the 3D cross product).
    #[must_use]
    pub fn cross(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.y)
            .saturating_sub(self.y.saturating_mul(other.x))
    }

    /// Scale by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Perpendicular vector (rotated 90° counter-clockwise).
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Whether both coordinates lie within [`ARENA_LIMIT`].
    #[must_use]
    pub fn within_arena(self) -> bool {
        within_limit(self.x) && within_limit(self.y)
    }
}

/// Whether `value` lies within `[-ARENA_LIMIT, ARENA_LIMIT]`.
#[must_use]
pub fn within_limit(value: Fixed) -> bool {
    (-ARENA_LIMIT..=ARENA_LIMIT).contains(&value)
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Sine and cosine of an angle in degrees.
///
/// Reduces the angle to the first quadrant and evaluates a Taylor
/// polynomial there; the error is below 1e-7 over the whole circle.
#[must_use]
pub fn sin_cos_degrees(degrees: Fixed) -> (Fixed, Fixed) {
    let full = Fixed::from_num(360);
    let quarter = Fixed::from_num(90);

    let mut angle = degrees % full;
    if angle < Fixed::ZERO {
        angle += full;
    }

    let quadrant = (angle / quarter).to_num::<i32>();
    let within = angle - quarter * Fixed::from_num(quadrant);

    let sin_a = sin_first_quadrant(within * DEG_TO_RAD);
    let cos_a = sin_first_quadrant((quarter - within) * DEG_TO_RAD);

    match quadrant {
        0 => (sin_a, cos_a),
        1 => (cos_a, -sin_a),
        2 => (-sin_a, -cos_a),
        _ => (-cos_a, sin_a),
    }
}

/// Taylor series for `sin(x)` with `x` in `[0, π/2]`.
fn sin_first_quadrant(x: Fixed) -> Fixed {
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    // Odd terms up to x^13.
    for n in 1..=6 {
        let denom = Fixed::from_num((2 * n) * (2 * n + 1));
        term = -(term * x2) / denom;
        sum += term;
    }
    sum
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
