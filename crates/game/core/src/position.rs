/// A point in a map with facing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Facing in radians, `[0, 2π)`.
    pub o: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32, o: f32) -> Self {
        Self { x, y, z, o }
    }

    pub const fn xyz(x: f32, y: f32, z: f32) -> Self {
        Self::new(x, y, z, 0.0)
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn distance_2d(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle from this point towards `other`, normalized to `[0, 2π)`.
    pub fn angle_to(&self, other: &Position) -> f32 {
        normalize_orientation((other.y - self.y).atan2(other.x - self.x))
    }

    /// Applies an offset expressed in this position's local frame
    /// (x forward, y left), rotating it by the facing.
    pub fn relative(&self, offset: &Position) -> Position {
        let (sin, cos) = self.o.sin_cos();
        Position {
            x: self.x + offset.x * cos - offset.y * sin,
            y: self.y + offset.y * cos + offset.x * sin,
            z: self.z + offset.z,
            o: normalize_orientation(self.o + offset.o),
        }
    }

    /// Adds the offset component-wise in world coordinates.
    pub fn translated(&self, offset: &Position) -> Position {
        Position {
            x: self.x + offset.x,
            y: self.y + offset.y,
            z: self.z + offset.z,
            o: normalize_orientation(self.o + offset.o),
        }
    }
}

pub fn normalize_orientation(o: f32) -> f32 {
    o.rem_euclid(core::f32::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position::xyz(0.0, 0.0, 0.0);
        let b = Position::xyz(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn relative_offset_follows_facing() {
        let facing_north = Position::new(10.0, 10.0, 0.0, core::f32::consts::FRAC_PI_2);
        let moved = facing_north.relative(&Position::xyz(2.0, 0.0, 0.0));
        assert!((moved.x - 10.0).abs() < 1e-4);
        assert!((moved.y - 12.0).abs() < 1e-4);
    }
}
