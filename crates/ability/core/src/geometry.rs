/// Planar position in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for a heading in degrees, 0 pointing along +x.
    pub fn from_heading(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self::new(radians.cos(), radians.sin())
    }

    pub fn offset(self, direction: Vec2, distance: f32) -> Self {
        Self::new(self.x + direction.x * distance, self.y + direction.y * distance)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Position plus facing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub position: Vec2,
    pub heading: f32,
}

impl Pose {
    pub const fn new(position: Vec2, heading: f32) -> Self {
        Self { position, heading }
    }
}
