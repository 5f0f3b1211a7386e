//! Stage geometry
//!
//! The physics collaborator for the encounter. Movement code never inspects
//! geometry directly; it asks a [`CollisionWorld`] whether a box would overlap
//! solid ground if moved by some offset, the same probe a raycast-based
//! wall check would make.

use bevy::prelude::*;

use super::tunables::StageTunables;

/// "Would collide at offset" queries against solid geometry.
pub trait CollisionWorld {
    /// Would a box of `half_extent` centered at `origin + offset` overlap solid geometry?
    fn would_collide(&self, origin: Vec2, offset: Vec2, half_extent: f32) -> bool;

    /// Clamp a box center so the box stays inside open space.
    fn clamp_inside(&self, position: Vec2, half_extent: f32) -> Vec2;

    /// Is a point outside open space? Used for projectile impacts.
    fn is_solid(&self, point: Vec2) -> bool {
        self.would_collide(point, Vec2::ZERO, 0.0)
    }
}

/// A closed rectangular room: floor, ceiling and two walls.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub half_width: f32,
    pub half_height: f32,
}

impl Stage {
    pub fn from_tunables(tunables: &StageTunables) -> Self {
        Self {
            half_width: tunables.half_width,
            half_height: tunables.half_height,
        }
    }

    pub fn floor_y(&self) -> f32 {
        -self.half_height
    }

    pub fn ceiling_y(&self) -> f32 {
        self.half_height
    }
}

impl CollisionWorld for Stage {
    fn would_collide(&self, origin: Vec2, offset: Vec2, half_extent: f32) -> bool {
        let p = origin + offset;
        p.x - half_extent < -self.half_width
            || p.x + half_extent > self.half_width
            || p.y - half_extent < -self.half_height
            || p.y + half_extent > self.half_height
    }

    fn clamp_inside(&self, position: Vec2, half_extent: f32) -> Vec2 {
        let max_x = (self.half_width - half_extent).max(0.0);
        let max_y = (self.half_height - half_extent).max(0.0);
        Vec2::new(position.x.clamp(-max_x, max_x), position.y.clamp(-max_y, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage {
            half_width: 5.0,
            half_height: 3.0,
        }
    }

    #[test]
    fn test_wall_probe() {
        let stage = stage();
        let origin = Vec2::new(4.0, 0.0);
        assert!(!stage.would_collide(origin, Vec2::new(0.4, 0.0), 0.5));
        assert!(stage.would_collide(origin, Vec2::new(0.6, 0.0), 0.5));
    }

    #[test]
    fn test_clamp_inside_keeps_box_in_room() {
        let stage = stage();
        let clamped = stage.clamp_inside(Vec2::new(10.0, -10.0), 0.5);
        assert_eq!(clamped, Vec2::new(4.5, -2.5));
        assert!(!stage.would_collide(clamped, Vec2::ZERO, 0.5));
    }

    #[test]
    fn test_points_outside_are_solid() {
        let stage = stage();
        assert!(stage.is_solid(Vec2::new(0.0, 3.5)));
        assert!(!stage.is_solid(Vec2::ZERO));
    }
}
