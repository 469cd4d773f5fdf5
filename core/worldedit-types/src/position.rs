//! World-space positions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::Error;

/// A point in world space. Stored as 32-bit floats to match the on-disk
/// `Vector3` layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const ORIGIN: Position = Position::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Builds a position from up to three components; missing components are
    /// zero and extra components are ignored.
    #[must_use]
    pub fn from_components(components: &[f32]) -> Self {
        let at = |i: usize| components.get(i).copied().unwrap_or(0.0);
        Self::new(at(0), at(1), at(2))
    }

    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Returns true if every component is within `epsilon` of `other`.
    #[must_use]
    pub fn approx_eq(&self, other: &Position, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f32; 3]> for Position {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Parses `x,y,z`. Unlike the lenient field decoder this is strict, because
/// it is used for user-typed input.
impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(Error::InvalidPosition(s.to_string()));
        }
        let mut out = [0.0f32; 3];
        for (slot, part) in out.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| Error::InvalidPosition(s.to_string()))?;
        }
        Ok(out.into())
    }
}
