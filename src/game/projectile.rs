//! Projectiles
//!
//! Homing flight, impact detection and splash resolution.
//!
//! A projectile re-aims at its target's current position every tick. The
//! enemy collection is passed in by the tick driver; splash needs to see
//! every enemy near the impact, not just the target.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::enemy::{DamageOutcome, Enemy, EnemyId};
use crate::game::map::GameMap;
use crate::game::tower::TowerId;

/// Unique projectile identifier (monotonic counter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

/// A projectile in flight.
#[derive(Clone, Debug)]
pub struct Projectile {
    /// Unique ID
    pub id: ProjectileId,
    /// Tower that fired it
    pub tower_id: TowerId,
    /// Current pixel position
    pub position: Vec2,
    /// Heading at launch in radians (fan angle)
    pub launch_angle: f64,
    /// Enemy it homes on
    pub target: EnemyId,
    /// Direct hit damage
    pub damage: u32,
    /// Pixels per second
    pub speed: f64,
    /// Splash radius in pixels (0 = none)
    pub splash_radius: f64,
    /// Splash damage at the impact point, percent of `damage`
    pub splash_damage_percent: f64,
    /// Level of the firing tower (presentation only)
    pub level: u32,
    /// Impact has been resolved
    pub hit: bool,
    /// Marked for removal
    pub to_remove: bool,
}

/// Damage dealt to one enemy caught in a splash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplashHit {
    /// Enemy caught in the blast
    pub enemy: EnemyId,
    /// Damage applied
    pub amount: u32,
    /// Distance from the impact point
    pub distance: f64,
    /// Resulting damage outcome
    pub outcome: DamageOutcome,
}

/// A resolved impact.
#[derive(Clone, Debug, PartialEq)]
pub struct Impact {
    /// Primary target
    pub target: EnemyId,
    /// Damage applied to the primary target
    pub amount: u32,
    /// Outcome of the direct hit
    pub direct: DamageOutcome,
    /// Secondary targets, in enemy id order
    pub splash: Vec<SplashHit>,
}

/// Result of one projectile update.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileOutcome {
    /// The projectile should be discarded
    pub removed: bool,
    /// Set when the projectile struck its target this tick
    pub impact: Option<Impact>,
}

impl ProjectileOutcome {
    fn keep() -> Self {
        Self { removed: false, impact: None }
    }

    fn discard() -> Self {
        Self { removed: true, impact: None }
    }
}

impl Projectile {
    /// Advance the projectile by `delta_ms` and resolve any impact.
    ///
    /// Removal is signalled when the projectile has already hit, when the
    /// target is gone or no longer alive, when it leaves the board by more
    /// than the margin, and right after an impact resolves.
    pub fn update(
        &mut self,
        delta_ms: f64,
        enemies: &mut BTreeMap<EnemyId, Enemy>,
        map: &GameMap,
    ) -> ProjectileOutcome {
        if self.hit || self.to_remove {
            self.to_remove = true;
            return ProjectileOutcome::discard();
        }

        let (target_pos, hit_distance) = match enemies.get(&self.target) {
            Some(enemy) if enemy.is_alive() => (enemy.position, enemy.radius()),
            _ => {
                self.to_remove = true;
                return ProjectileOutcome::discard();
            }
        };

        let step = self.speed * delta_ms / 1000.0;
        let distance = self.position.distance(target_pos);

        if distance <= step + hit_distance {
            // Stop on the target's boundary along the line of travel
            if distance > hit_distance {
                let ratio = (distance - hit_distance) / distance;
                self.position = self.position + (target_pos - self.position).scale(ratio);
            }
            self.hit = true;
            self.to_remove = true;

            let impact = self.resolve_impact(enemies, target_pos);
            return ProjectileOutcome { removed: true, impact };
        }

        self.position = self.position + (target_pos - self.position).normalize().scale(step);

        if map.is_far_out_of_bounds(self.position) {
            self.to_remove = true;
            return ProjectileOutcome::discard();
        }

        ProjectileOutcome::keep()
    }

    fn resolve_impact(
        &self,
        enemies: &mut BTreeMap<EnemyId, Enemy>,
        impact_point: Vec2,
    ) -> Option<Impact> {
        let target = enemies.get_mut(&self.target)?;
        let direct = target.apply_damage(self.damage);
        if direct.died {
            target.killed_by = Some(self.tower_id);
        }

        let splash = if self.splash_radius > 0.0 {
            resolve_splash(
                enemies,
                self.target,
                impact_point,
                self.damage,
                self.splash_radius,
                self.splash_damage_percent,
                self.tower_id,
            )
        } else {
            Vec::new()
        };

        Some(Impact {
            target: self.target,
            amount: self.damage,
            direct,
            splash,
        })
    }
}

/// Splash damage at `distance` from the impact point.
///
/// Falls off linearly from `damage * percent / 100` at the center to zero
/// at the radius edge.
pub fn splash_damage(damage: u32, percent: f64, distance: f64, radius: f64) -> u32 {
    if radius <= 0.0 || distance > radius {
        return 0;
    }
    let falloff = percent * (1.0 - distance / radius);
    (damage as f64 * falloff / 100.0).round().max(0.0) as u32
}

/// Apply splash damage to every live enemy within `radius` of
/// `impact_point`, except the primary target.
///
/// Hits that round to zero damage are skipped.
pub fn resolve_splash(
    enemies: &mut BTreeMap<EnemyId, Enemy>,
    primary: EnemyId,
    impact_point: Vec2,
    damage: u32,
    radius: f64,
    percent: f64,
    source: TowerId,
) -> Vec<SplashHit> {
    let mut hits = Vec::new();

    for (id, enemy) in enemies.iter_mut() {
        if *id == primary || !enemy.is_alive() {
            continue;
        }
        let distance = enemy.position.distance(impact_point);
        if distance > radius {
            continue;
        }
        let amount = splash_damage(damage, percent, distance, radius);
        if amount == 0 {
            continue;
        }
        let outcome = enemy.apply_damage(amount);
        if outcome.died {
            enemy.killed_by = Some(source);
        }
        hits.push(SplashHit { enemy: *id, amount, distance, outcome });
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Cell;
    use crate::game::enemy::EnemyType;
    use crate::game::map::MapDefinition;

    fn test_map() -> GameMap {
        let path: Vec<Cell> = (0..10).map(|x| Cell::new(x, 0)).collect();
        GameMap::new(&MapDefinition {
            width: 10,
            height: 5,
            cell_size: 40.0,
            start_point: path[0],
            end_point: path[9],
            path,
        })
        .unwrap()
    }

    fn enemy_at(id: u32, health: u32, position: Vec2) -> Enemy {
        let kind = EnemyType {
            id: "grunt".into(),
            name: "Grunt".into(),
            health,
            speed: 0.0,
            reward: 10,
            damage: 1,
            color: None,
            size: 20.0,
        };
        let mut enemy = Enemy::new(EnemyId(id), &kind, &[position]);
        enemy.position = position;
        enemy
    }

    fn projectile(from: Vec2, target: u32, damage: u32) -> Projectile {
        Projectile {
            id: ProjectileId(1),
            tower_id: TowerId(7),
            position: from,
            launch_angle: 0.0,
            target: EnemyId(target),
            damage,
            speed: 100.0,
            splash_radius: 0.0,
            splash_damage_percent: 100.0,
            level: 1,
            hit: false,
            to_remove: false,
        }
    }

    #[test]
    fn test_splash_damage_falloff() {
        assert_eq!(splash_damage(40, 50.0, 0.0, 60.0), 20);
        assert_eq!(splash_damage(40, 50.0, 30.0, 60.0), 10);
        assert_eq!(splash_damage(40, 50.0, 60.0, 60.0), 0);
        assert_eq!(splash_damage(40, 50.0, 61.0, 60.0), 0);
        assert_eq!(splash_damage(40, 50.0, 0.0, 0.0), 0);
        // round(33 * 100 * 0.5 / 100) = round(16.5) = 17
        assert_eq!(splash_damage(33, 100.0, 5.0, 10.0), 17);
    }

    #[test]
    fn test_homing_flight_moves_towards_target() {
        let map = test_map();
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(1), enemy_at(1, 100, Vec2::new(300.0, 100.0)));

        let mut p = projectile(Vec2::new(100.0, 100.0), 1, 10);
        // 100 px/s for 500 ms = 50 px
        let outcome = p.update(500.0, &mut enemies, &map);
        assert_eq!(outcome, ProjectileOutcome::keep());
        assert!((p.position.x - 150.0).abs() < 1e-9);

        // Target moves; projectile re-aims
        enemies.get_mut(&EnemyId(1)).unwrap().position = Vec2::new(150.0, 200.0);
        p.update(500.0, &mut enemies, &map);
        assert!((p.position.x - 150.0).abs() < 1e-9);
        assert!((p.position.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_impact_applies_damage_and_snaps_to_boundary() {
        let map = test_map();
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(1), enemy_at(1, 100, Vec2::new(150.0, 100.0)));

        let mut p = projectile(Vec2::new(100.0, 100.0), 1, 30);
        // Distance 50 <= step 50 + radius 10
        let outcome = p.update(500.0, &mut enemies, &map);
        assert!(outcome.removed);
        assert!(p.hit);

        let impact = outcome.impact.unwrap();
        assert_eq!(impact.target, EnemyId(1));
        assert_eq!(impact.direct.health, 70);
        assert!(impact.splash.is_empty());
        assert!((p.position.x - 140.0).abs() < 1e-9);

        // Already hit: discarded without a second impact
        let again = p.update(500.0, &mut enemies, &map);
        assert_eq!(again, ProjectileOutcome::discard());
        assert_eq!(enemies[&EnemyId(1)].health, 70);
    }

    #[test]
    fn test_lethal_hit_records_killer() {
        let map = test_map();
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(1), enemy_at(1, 20, Vec2::new(110.0, 100.0)));

        let mut p = projectile(Vec2::new(100.0, 100.0), 1, 30);
        let impact = p.update(16.0, &mut enemies, &map).impact.unwrap();
        assert!(impact.direct.died);
        assert_eq!(enemies[&EnemyId(1)].killed_by, Some(TowerId(7)));
    }

    #[test]
    fn test_removed_when_target_gone() {
        let map = test_map();
        let mut enemies = BTreeMap::new();
        let mut p = projectile(Vec2::new(100.0, 100.0), 1, 30);
        assert!(p.update(16.0, &mut enemies, &map).removed);

        let mut dead = enemy_at(2, 10, Vec2::new(300.0, 100.0));
        dead.apply_damage(10);
        enemies.insert(EnemyId(2), dead);
        let mut p = projectile(Vec2::new(100.0, 100.0), 2, 30);
        let outcome = p.update(16.0, &mut enemies, &map);
        assert!(outcome.removed);
        assert!(outcome.impact.is_none());
    }

    #[test]
    fn test_removed_when_far_out_of_bounds() {
        let map = test_map();
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(1), enemy_at(1, 100, Vec2::new(-500.0, 100.0)));

        let mut p = projectile(Vec2::new(-40.0, 100.0), 1, 30);
        let outcome = p.update(100.0, &mut enemies, &map); // -> x = -50
        assert!(!outcome.removed);
        let outcome = p.update(100.0, &mut enemies, &map); // -> x = -60
        assert!(outcome.removed);
        assert!(outcome.impact.is_none());
    }

    #[test]
    fn test_splash_excludes_primary_and_dead() {
        let mut enemies = BTreeMap::new();
        let center = Vec2::new(200.0, 100.0);
        enemies.insert(EnemyId(1), enemy_at(1, 100, center));
        enemies.insert(EnemyId(2), enemy_at(2, 100, Vec2::new(200.0, 130.0)));
        enemies.insert(EnemyId(3), enemy_at(3, 100, Vec2::new(200.0, 200.0)));
        let mut dead = enemy_at(4, 5, center);
        dead.apply_damage(5);
        enemies.insert(EnemyId(4), dead);

        let hits = resolve_splash(&mut enemies, EnemyId(1), center, 40, 60.0, 50.0, TowerId(1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].enemy, EnemyId(2));
        assert_eq!(hits[0].amount, 10);
        assert_eq!(enemies[&EnemyId(1)].health, 100);
        assert_eq!(enemies[&EnemyId(2)].health, 90);
        assert_eq!(enemies[&EnemyId(3)].health, 100);
    }

    #[test]
    fn test_splash_centered_on_target_position() {
        let map = test_map();
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(1), enemy_at(1, 100, Vec2::new(150.0, 100.0)));
        // Right next to the target, far from the projectile
        enemies.insert(EnemyId(2), enemy_at(2, 100, Vec2::new(150.0, 100.0)));

        let mut p = projectile(Vec2::new(100.0, 100.0), 1, 40);
        p.splash_radius = 30.0;
        p.splash_damage_percent = 50.0;
        let impact = p.update(500.0, &mut enemies, &map).impact.unwrap();

        assert_eq!(impact.splash.len(), 1);
        assert_eq!(impact.splash[0].amount, 20);
        assert_eq!(enemies[&EnemyId(2)].health, 80);
    }
}
