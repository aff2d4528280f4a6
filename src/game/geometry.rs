//! 2D vector math and axis-aligned collision predicates

use std::ops::{Add, Mul, Sub};

/// Immutable 2D vector value type
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for an angle in radians
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalized copy; the zero vector normalizes to zero
    pub fn normalize(&self) -> Vec2 {
        let len = self.length();
        if len > 0.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        (*self - other).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

/// Axis-aligned rectangle (origin at top-left corner)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Circle-vs-rectangle overlap test: distance from the circle center to
    /// the closest point on the rectangle must exceed the radius
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest_x = center.x.clamp(self.x, self.x + self.width);
        let closest_y = center.y.clamp(self.y, self.y + self.height);
        center.distance(Vec2::new(closest_x, closest_y)) < radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);

        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(a - b, Vec2::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn test_length_and_distance() {
        let v = Vec2::new(3.0, 4.0);
        assert_approx_eq!(v.length(), 5.0);
        assert_approx_eq!(Vec2::ZERO.distance(v), 5.0);
    }

    #[test]
    fn test_normalize() {
        let n = Vec2::new(10.0, 0.0).normalize();
        assert_approx_eq!(n.x, 1.0);
        assert_approx_eq!(n.y, 0.0);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_circle_rect_overlap() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);

        // Center inside
        assert!(rect.overlaps_circle(Vec2::new(20.0, 20.0), 1.0));
        // Touching from the left edge
        assert!(rect.overlaps_circle(Vec2::new(5.0, 20.0), 6.0));
        // Clear miss
        assert!(!rect.overlaps_circle(Vec2::new(5.0, 20.0), 4.0));
        // Near the corner the diagonal distance matters, not the axis gap
        assert!(!rect.overlaps_circle(Vec2::new(6.0, 6.0), 5.0));
        assert!(rect.overlaps_circle(Vec2::new(6.0, 6.0), 6.0));
    }
}
