//! Collision contract shared by every entity
//!
//! All physics is axis-aligned rectangle overlap plus a few radius checks
//! for area effects and the magnet companion.

use glam::Vec2;

use super::entity::{Bullet, Coin, Enemy, Powerup};
use super::player::Player;
use super::rect::Rect;

/// Anything with a bounding box
pub trait Body {
    fn rect(&self) -> Rect;

    fn center(&self) -> Vec2 {
        self.rect().center()
    }
}

impl Body for Player {
    fn rect(&self) -> Rect {
        Player::rect(self)
    }
}

impl Body for Enemy {
    fn rect(&self) -> Rect {
        Enemy::rect(self)
    }
}

impl Body for Bullet {
    fn rect(&self) -> Rect {
        Bullet::rect(self)
    }
}

impl Body for Powerup {
    fn rect(&self) -> Rect {
        Powerup::rect(self)
    }
}

impl Body for Coin {
    fn rect(&self) -> Rect {
        Coin::rect(self)
    }
}

impl Body for Rect {
    fn rect(&self) -> Rect {
        *self
    }
}

/// Strict AABB overlap between two bodies
#[inline]
pub fn overlaps(a: &impl Body, b: &impl Body) -> bool {
    a.rect().overlaps(&b.rect())
}

/// Whether `point` lies within `radius` of `center` (inclusive)
#[inline]
pub fn within_radius(center: Vec2, point: Vec2, radius: f32) -> bool {
    center.distance_squared(point) <= radius * radius
}

/// One tick of magnetic pull on a pickup
///
/// Returns the new top-left position, or `None` when the pickup's center is
/// outside `radius` (the pickup then falls normally). Pull strength scales
/// with `1 - d/radius`, never below `min_pull`, and a step never overshoots
/// the target.
pub fn magnet_pull(
    body: Rect,
    target: Vec2,
    radius: f32,
    speed: f32,
    min_pull: f32,
    dt: f32,
) -> Option<Vec2> {
    let center = body.center();
    let to_target = target - center;
    let d = to_target.length();
    if !d.is_finite() || d > radius {
        return None;
    }
    if d <= f32::EPSILON {
        return Some(body.pos);
    }
    let strength = (1.0 - d / radius).max(min_pull);
    let step = (speed * strength * dt).min(d);
    Some(body.pos + to_target / d * step)
}
