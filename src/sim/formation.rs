//! Formation generator
//!
//! Pure functions from a level number to an enemy layout:
//! - `level % 10` picks one of ten formation shapes
//! - the grid grows with level up to 6 rows by 12 columns
//! - every tenth level replaces the formation with a single boss

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Enemy, EnemyId, EnemyKind};
use super::rect::clamp_to_field;
use super::rng::{SharedSeed, random};
use crate::consts::*;

/// Formation shapes, indexed by `level % 10`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationKind {
    Line,
    V,
    Diamond,
    Circle,
    Spiral,
    Wave,
    Cross,
    Star,
    Heart,
    Arrow,
}

impl FormationKind {
    pub const ALL: [FormationKind; 10] = [
        FormationKind::Line,
        FormationKind::V,
        FormationKind::Diamond,
        FormationKind::Circle,
        FormationKind::Spiral,
        FormationKind::Wave,
        FormationKind::Cross,
        FormationKind::Star,
        FormationKind::Heart,
        FormationKind::Arrow,
    ];

    pub fn for_level(level: u32) -> Self {
        Self::ALL[(level % 10) as usize]
    }
}

/// One position in a formation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationSlot {
    /// Top-left spawn position (before clamping to the field)
    pub pos: Vec2,
    /// Suggested tier before level promotion
    pub hint: EnemyKind,
}

impl FormationSlot {
    fn new(x: f32, y: f32, hint: EnemyKind) -> Self {
        Self {
            pos: Vec2::new(x, y),
            hint,
        }
    }
}

/// Grid dimensions `(rows, cols)` for a level
pub fn grid_size(level: u32) -> (u32, u32) {
    let rows = (3 + level / 4).min(6);
    let cols = (8 + level / 3).min(12);
    (rows, cols)
}

/// Whether a level is a boss level
#[inline]
pub fn is_boss_level(level: u32) -> bool {
    level > 0 && level % 10 == 0
}

/// Ordered formation positions for a shape
pub fn positions(kind: FormationKind, rows: u32, cols: u32, level: u32) -> Vec<FormationSlot> {
    let cx = FIELD_WIDTH / 2.0;
    let cy = FORMATION_CENTER_Y;
    let sp = FORMATION_SPACING;
    let total = (rows * cols) as usize;
    let mut out = Vec::with_capacity(total);

    match kind {
        FormationKind::Line => {
            for r in 0..rows {
                for c in 0..cols {
                    let hint = if r == 0 {
                        EnemyKind::Scout
                    } else if r == rows - 1 {
                        EnemyKind::Cruiser
                    } else {
                        EnemyKind::Fighter
                    };
                    let x = cx - (cols as f32 * sp) / 2.0 + c as f32 * sp;
                    out.push(FormationSlot::new(x, cy + r as f32 * sp, hint));
                }
            }
        }
        FormationKind::V => {
            for r in 0..rows {
                let row_cols = cols.saturating_sub(r).max(1);
                for c in 0..row_cols {
                    let hint = if r == 0 { EnemyKind::Scout } else { EnemyKind::Fighter };
                    let x = cx - (row_cols as f32 * sp) / 2.0 + c as f32 * sp;
                    out.push(FormationSlot::new(x, cy + r as f32 * sp, hint));
                }
            }
        }
        FormationKind::Diamond => {
            let mid = rows / 2;
            for r in 0..rows {
                let width = if r <= mid { r + 1 } else { rows - r };
                for c in 0..width {
                    let hint = if r == 0 || r == rows - 1 {
                        EnemyKind::Scout
                    } else {
                        EnemyKind::Fighter
                    };
                    let x = cx - (width as f32 * sp) / 2.0 + c as f32 * sp;
                    out.push(FormationSlot::new(x, cy + r as f32 * sp * 0.8, hint));
                }
            }
        }
        FormationKind::Circle => {
            let radius = rows.min(cols) as f32 * sp / 2.0;
            for i in 0..total {
                let angle = i as f32 / total as f32 * TAU;
                let hint = if i % 3 == 0 { EnemyKind::Scout } else { EnemyKind::Fighter };
                out.push(FormationSlot::new(
                    cx + angle.cos() * radius,
                    cy + angle.sin() * radius,
                    hint,
                ));
            }
        }
        FormationKind::Spiral => {
            let mut radius = 15.0_f32;
            let mut angle = 0.0_f32;
            for i in 0..total {
                let hint = if i % 4 == 0 { EnemyKind::Cruiser } else { EnemyKind::Fighter };
                out.push(FormationSlot::new(
                    cx + angle.cos() * radius,
                    cy + angle.sin() * radius,
                    hint,
                ));
                angle += 0.4;
                radius += 2.5;
            }
        }
        FormationKind::Wave => {
            let phase = level as f32 * 0.5;
            for r in 0..rows {
                for c in 0..cols {
                    let hint = if r == 0 || r == rows - 1 {
                        EnemyKind::Cruiser
                    } else {
                        EnemyKind::Fighter
                    };
                    let x = cx - (cols as f32 * sp) / 2.0 + c as f32 * sp;
                    let y = cy + r as f32 * sp + (c as f32 * 0.8 + phase).sin() * sp * 0.4;
                    out.push(FormationSlot::new(x, y, hint));
                }
            }
        }
        FormationKind::Cross => {
            // Horizontal bar across the middle row, vertical bar through the center
            let mid_row = rows / 2;
            let bar_y = cy + mid_row as f32 * sp;
            for c in 0..cols {
                let hint = if c == 0 || c == cols - 1 {
                    EnemyKind::Scout
                } else {
                    EnemyKind::Fighter
                };
                let x = cx - (cols as f32 * sp) / 2.0 + c as f32 * sp;
                out.push(FormationSlot::new(x, bar_y, hint));
            }
            for r in 0..rows {
                if r == mid_row {
                    continue;
                }
                let hint = if r == 0 || r == rows - 1 {
                    EnemyKind::Cruiser
                } else {
                    EnemyKind::Fighter
                };
                out.push(FormationSlot::new(cx, cy + r as f32 * sp, hint));
            }
        }
        FormationKind::Star => {
            let outer = rows.min(cols) as f32 * sp / 2.0;
            let star_cy = cy + outer * 0.5;
            for i in 0..total {
                let t = i as f32 / total as f32 * TAU;
                let lobe = (5.0 * t).cos();
                let r = outer * (0.55 + 0.45 * lobe);
                let hint = if lobe > 0.8 { EnemyKind::Scout } else { EnemyKind::Fighter };
                out.push(FormationSlot::new(
                    cx + t.sin() * r,
                    star_cy - t.cos() * r,
                    hint,
                ));
            }
        }
        FormationKind::Heart => {
            for i in 0..total {
                let t = i as f32 / total as f32 * TAU;
                let hx = 16.0 * t.sin().powi(3);
                let hy = -(13.0 * t.cos()
                    - 5.0 * (2.0 * t).cos()
                    - 2.0 * (3.0 * t).cos()
                    - (4.0 * t).cos());
                out.push(FormationSlot::new(
                    cx + hx * 2.5,
                    cy + hy * 2.5,
                    EnemyKind::Fighter,
                ));
            }
        }
        FormationKind::Arrow => {
            // Head widening downward from the tip, then a short shaft
            for r in 0..rows {
                let y = cy + r as f32 * sp;
                if r == 0 {
                    out.push(FormationSlot::new(cx, y, EnemyKind::Cruiser));
                    continue;
                }
                let half = r as f32 * sp * 0.5;
                out.push(FormationSlot::new(cx - half, y, EnemyKind::Fighter));
                out.push(FormationSlot::new(cx + half, y, EnemyKind::Fighter));
            }
            let shaft = (cols / 4).min(3);
            for k in 0..shaft {
                let y = cy + (rows + k) as f32 * sp;
                out.push(FormationSlot::new(cx, y, EnemyKind::Scout));
            }
        }
    }

    out
}

/// Build the enemy set for a wave
///
/// `serial` namespaces the enemy ids. In shared sessions the seed offsets
/// every roll so participants agree.
pub fn spawn_wave(level: u32, serial: u32, seed: Option<SharedSeed>) -> Vec<Enemy> {
    let level = level.max(1);

    if is_boss_level(level) {
        let kind = EnemyKind::BOSSES[((level / 10) % 3) as usize];
        let health = (100 + 10 * level) as i32;
        let pos = Vec2::new(FIELD_WIDTH / 2.0 - BOSS_WIDTH / 2.0, 50.0);
        let velocity = Vec2::new(2.0 + 0.05 * level as f32, 0.5);
        return vec![Enemy::boss(
            EnemyId::for_slot(serial, 0),
            kind,
            pos,
            health,
            velocity,
        )];
    }

    let base = seed.map_or(0, |s| s.0);
    let (rows, cols) = grid_size(level);
    let kind = FormationKind::for_level(level);

    positions(kind, rows, cols, level)
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            let i = i as u32;
            let mut tier = slot.hint;
            let roll = random(base.wrapping_add(u64::from(level) * 100 + u64::from(i)));
            if level > 5 && roll < 0.3 {
                tier = EnemyKind::PROMOTION_LADDER[(level / 5).min(4) as usize];
            }
            let health = tier.base_health() + ((level - 1) / 5) as i32;
            let pos = clamp_to_field(slot.pos, tier.size());
            Enemy::new(EnemyId::for_slot(serial, i), i, tier, pos, health)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_caps() {
        assert_eq!(grid_size(1), (3, 8));
        assert_eq!(grid_size(12), (6, 12));
        assert_eq!(grid_size(99), (6, 12));
    }

    #[test]
    fn test_kind_cycles_by_level() {
        assert_eq!(FormationKind::for_level(1), FormationKind::V);
        assert_eq!(FormationKind::for_level(8), FormationKind::Heart);
        assert_eq!(FormationKind::for_level(11), FormationKind::V);
    }

    #[test]
    fn test_line_type_hints() {
        let slots = positions(FormationKind::Line, 3, 4, 1);
        assert_eq!(slots.len(), 12);
        assert_eq!(slots[0].hint, EnemyKind::Scout);
        assert_eq!(slots[4].hint, EnemyKind::Fighter);
        assert_eq!(slots[11].hint, EnemyKind::Cruiser);
    }

    #[test]
    fn test_every_kind_produces_finite_positions() {
        for kind in FormationKind::ALL {
            for level in [1, 9, 37, 99] {
                let (rows, cols) = grid_size(level);
                let slots = positions(kind, rows, cols, level);
                assert!(!slots.is_empty(), "{:?} empty", kind);
                assert!(slots.iter().all(|s| s.pos.is_finite()));
            }
        }
    }

    #[test]
    fn test_boss_every_tenth_level() {
        for level in [10, 20, 30, 100] {
            let enemies = spawn_wave(level, 1, None);
            assert_eq!(enemies.len(), 1);
            assert!(enemies[0].is_boss());
            assert_eq!(enemies[0].health, (100 + 10 * level) as i32);
        }
        let enemies = spawn_wave(10, 1, None);
        assert_eq!(enemies[0].kind, EnemyKind::Destroyer);
        assert!(!spawn_wave(11, 1, None)[0].is_boss());
    }

    #[test]
    fn test_spawn_wave_is_deterministic() {
        let seed = Some(SharedSeed(4242));
        for level in 1..=30 {
            let a = spawn_wave(level, level, seed);
            let b = spawn_wave(level, level, seed);
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b.iter()) {
                assert_eq!(x.id, y.id);
                assert_eq!(x.kind, y.kind);
                assert_eq!(x.pos, y.pos);
                assert_eq!(x.health, y.health);
            }
        }
    }

    #[test]
    fn test_spawned_enemies_inside_field_with_health() {
        for level in 1..=100 {
            for enemy in spawn_wave(level, level, None) {
                assert!(enemy.health >= 1);
                assert!(enemy.pos.x >= 0.0 && enemy.pos.x + enemy.size.x <= FIELD_WIDTH);
                assert!(enemy.pos.y >= 0.0 && enemy.pos.y + enemy.size.y <= FIELD_HEIGHT);
            }
        }
    }

    #[test]
    fn test_no_promotion_before_level_six() {
        let enemies = spawn_wave(5, 1, None);
        assert!(enemies.iter().all(|e| e.kind != EnemyKind::Destroyer));
    }

    #[test]
    fn test_health_scales_with_level() {
        // Level 11 is a V formation: row 0 scouts start at 1 + 10/5
        let enemies = spawn_wave(11, 1, None);
        assert!(enemies.iter().all(|e| e.health >= 3));
    }
}
