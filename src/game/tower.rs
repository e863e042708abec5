//! Towers
//!
//! Targeting, cooldown-gated firing, multi-shot fan geometry and
//! level-up economics.
//!
//! ## Upgrades
//!
//! Stats compound per level-up, rounded at every step:
//!
//! | Stat           | Per level-up                         |
//! |----------------|--------------------------------------|
//! | damage         | `round(damage * multiplier)`         |
//! | range          | `round(range * multiplier)`          |
//! | fire rate      | `multiplier`, rounded to 0.1         |
//! | splash radius  | `round(radius * multiplier)` if > 0  |
//! | upgrade cost   | `round(cost * 1.5)` below max level  |

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::grid::Cell;
use crate::core::vec2::Vec2;
use crate::game::enemy::{Enemy, EnemyId};
use crate::game::projectile::{Projectile, ProjectileId};

/// Distance (pixels) each shot is offset from the tower along its heading.
pub const MUZZLE_OFFSET: f64 = 5.0;

/// First upgrade costs this fraction of the purchase price.
pub const INITIAL_UPGRADE_COST_RATIO: f64 = 0.75;

/// Upgrade cost growth per level-up.
pub const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Largest accepted `multiShot`.
pub const MAX_MULTI_SHOT: u32 = 16;

/// Largest accepted `maxLevel`.
pub const MAX_TOWER_LEVEL: u32 = 20;

/// Unique tower identifier (monotonic counter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TowerId(pub u32);

impl std::fmt::Display for TowerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tower#{}", self.0)
    }
}

/// How a tower chooses among enemies in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum TargetingPolicy {
    /// Smallest Euclidean distance
    #[default]
    Nearest = 0,
    /// Furthest along the path
    MostProgressed = 1,
}

fn default_splash_damage_percent() -> f64 {
    100.0
}

fn default_multi_shot() -> u32 {
    1
}

fn default_upgrade_multiplier() -> f64 {
    1.5
}

fn default_max_level() -> u32 {
    3
}

/// Static tower configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerType {
    /// Type identifier used by `buildTower`
    pub id: String,
    /// Display name
    pub name: String,
    /// Base damage per projectile
    pub damage: u32,
    /// Base range in pixels
    pub range: f64,
    /// Base shots per second
    pub fire_rate: f64,
    /// Purchase price
    pub cost: u32,
    /// Projectile speed in pixels per second
    pub projectile_speed: f64,
    /// Splash radius in pixels (0 = none)
    #[serde(default)]
    pub splash_radius: f64,
    /// Splash damage at the impact point, percent of damage
    #[serde(default = "default_splash_damage_percent")]
    pub splash_damage_percent: f64,
    /// Projectiles per shot at level 1
    #[serde(default = "default_multi_shot")]
    pub multi_shot: u32,
    /// Degrees between fanned projectiles
    #[serde(default)]
    pub multi_shot_angle: f64,
    /// Stat multiplier per level-up
    #[serde(default = "default_upgrade_multiplier")]
    pub upgrade_multiplier: f64,
    /// Highest reachable level
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// Presentation color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Presentation color of projectiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectile_color: Option<String>,
}

impl TowerType {
    /// Check numeric fields.
    pub fn validate(&self) -> Result<(), crate::game::config::ConfigError> {
        use crate::game::config::ConfigError;

        let field = |name: &str| format!("towers.{}.{}", self.id, name);
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if !non_negative(self.range) {
            return Err(ConfigError::invalid(field("range"), "must be a non-negative number"));
        }
        if !positive(self.fire_rate) {
            return Err(ConfigError::invalid(field("fireRate"), "must be positive"));
        }
        if !positive(self.projectile_speed) {
            return Err(ConfigError::invalid(field("projectileSpeed"), "must be positive"));
        }
        if !non_negative(self.splash_radius) {
            return Err(ConfigError::invalid(field("splashRadius"), "must be a non-negative number"));
        }
        if !non_negative(self.splash_damage_percent) {
            return Err(ConfigError::invalid(field("splashDamagePercent"), "must be a non-negative number"));
        }
        if self.multi_shot == 0 {
            return Err(ConfigError::invalid(field("multiShot"), "must be at least 1"));
        }
        if self.multi_shot > MAX_MULTI_SHOT {
            return Err(ConfigError::invalid(field("multiShot"), format!("must be at most {}", MAX_MULTI_SHOT)));
        }
        if !non_negative(self.multi_shot_angle) {
            return Err(ConfigError::invalid(field("multiShotAngle"), "must be a non-negative number"));
        }
        if !positive(self.upgrade_multiplier) {
            return Err(ConfigError::invalid(field("upgradeMultiplier"), "must be positive"));
        }
        if self.max_level == 0 {
            return Err(ConfigError::invalid(field("maxLevel"), "must be at least 1"));
        }
        if self.max_level > MAX_TOWER_LEVEL {
            return Err(ConfigError::invalid(field("maxLevel"), format!("must be at most {}", MAX_TOWER_LEVEL)));
        }
        Ok(())
    }
}

/// A placed tower.
#[derive(Clone, Debug)]
pub struct Tower {
    /// Unique ID
    pub id: TowerId,
    /// Config type ID
    pub type_id: String,
    /// Grid cell it occupies
    pub cell: Cell,
    /// Cell center in pixels
    pub position: Vec2,
    /// Current level (1..=max_level)
    pub level: u32,
    /// Highest reachable level
    pub max_level: u32,
    /// Current damage per projectile
    pub damage: u32,
    /// Current range in pixels
    pub range: f64,
    /// Current shots per second
    pub fire_rate: f64,
    /// Current splash radius in pixels
    pub splash_radius: f64,
    /// Splash damage percent
    pub splash_damage_percent: f64,
    /// Projectiles per shot at level 1
    pub multi_shot: u32,
    /// Degrees between fanned projectiles
    pub multi_shot_angle: f64,
    /// Stat multiplier per level-up
    pub upgrade_multiplier: f64,
    /// Projectile speed in pixels per second
    pub projectile_speed: f64,
    /// Price of the next upgrade
    pub upgrade_cost: u32,
    /// Purchase price plus every upgrade paid
    pub total_invested: u32,
    /// Simulation time of the last shot
    pub last_fire_ms: Option<f64>,
    /// Projectiles this tower has in flight
    pub projectiles: Vec<Projectile>,
    /// Enemies killed by this tower
    pub kills: u32,
}

impl Tower {
    /// Create a level-1 tower on `cell`.
    pub fn new(id: TowerId, kind: &TowerType, cell: Cell, position: Vec2) -> Self {
        Self {
            id,
            type_id: kind.id.clone(),
            cell,
            position,
            level: 1,
            max_level: kind.max_level,
            damage: kind.damage,
            range: kind.range,
            fire_rate: kind.fire_rate,
            splash_radius: kind.splash_radius,
            splash_damage_percent: kind.splash_damage_percent,
            multi_shot: kind.multi_shot,
            multi_shot_angle: kind.multi_shot_angle,
            upgrade_multiplier: kind.upgrade_multiplier,
            projectile_speed: kind.projectile_speed,
            upgrade_cost: (kind.cost as f64 * INITIAL_UPGRADE_COST_RATIO).round() as u32,
            total_invested: kind.cost,
            last_fire_ms: None,
            projectiles: Vec::new(),
            kills: 0,
        }
    }

    /// True once no further upgrade is possible.
    #[inline]
    pub fn is_max_level(&self) -> bool {
        self.level >= self.max_level
    }

    /// Milliseconds between shots.
    #[inline]
    pub fn cooldown_ms(&self) -> f64 {
        1000.0 / self.fire_rate
    }

    /// Whether the cooldown has elapsed at simulation time `now_ms`.
    pub fn can_fire(&self, now_ms: f64) -> bool {
        match self.last_fire_ms {
            None => true,
            Some(last) => now_ms - last >= self.cooldown_ms(),
        }
    }

    /// Projectiles per shot: one extra every two levels.
    #[inline]
    pub fn total_shots(&self) -> u32 {
        self.multi_shot + (self.level - 1) / 2
    }

    /// Pick the enemy to shoot at, if any is alive and in range.
    ///
    /// Ties keep the lowest enemy id.
    pub fn select_target(
        &self,
        enemies: &BTreeMap<EnemyId, Enemy>,
        policy: TargetingPolicy,
        path: &[Vec2],
    ) -> Option<EnemyId> {
        let mut best: Option<(EnemyId, f64)> = None;

        for (id, enemy) in enemies {
            if !enemy.is_alive() {
                continue;
            }
            let distance = self.position.distance(enemy.position);
            if distance > self.range {
                continue;
            }

            let better = match (policy, best) {
                (_, None) => true,
                (TargetingPolicy::Nearest, Some((_, best_distance))) => distance < best_distance,
                (TargetingPolicy::MostProgressed, Some((_, best_progress))) => {
                    enemy.progress(path) > best_progress
                }
            };

            if better {
                let score = match policy {
                    TargetingPolicy::Nearest => distance,
                    TargetingPolicy::MostProgressed => enemy.progress(path),
                };
                best = Some((*id, score));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Launch headings (radians) for a shot at `target_pos`.
    ///
    /// A single shot flies straight at the target; several shots fan out
    /// `multi_shot_angle` degrees apart, centered on the direct heading.
    pub fn fan_angles(&self, target_pos: Vec2) -> Vec<f64> {
        let base = self.position.angle_to(target_pos);
        let shots = self.total_shots();
        if shots <= 1 {
            return vec![base];
        }

        let spread = self.multi_shot_angle * (shots - 1) as f64;
        (0..shots)
            .map(|i| base + (self.multi_shot_angle * i as f64 - spread / 2.0).to_radians())
            .collect()
    }

    /// Fire at `target`, stamping the cooldown with `now_ms`.
    ///
    /// The new projectiles are stored on the tower and returned by id.
    pub fn fire(
        &mut self,
        target: &Enemy,
        now_ms: f64,
        next_projectile_id: &mut u32,
    ) -> Vec<ProjectileId> {
        self.last_fire_ms = Some(now_ms);

        let mut fired = Vec::new();
        for angle in self.fan_angles(target.position) {
            *next_projectile_id += 1;
            let id = ProjectileId(*next_projectile_id);
            self.projectiles.push(Projectile {
                id,
                tower_id: self.id,
                position: self.position + Vec2::from_angle(angle).scale(MUZZLE_OFFSET),
                launch_angle: angle,
                target: target.id,
                damage: self.damage,
                speed: self.projectile_speed,
                splash_radius: self.splash_radius,
                splash_damage_percent: self.splash_damage_percent,
                level: self.level,
                hit: false,
                to_remove: false,
            });
            fired.push(id);
        }
        fired
    }

    /// Raise the tower one level. Returns false at max level.
    ///
    /// Money is handled by the caller; this only touches the tower.
    pub fn upgrade(&mut self) -> bool {
        if self.is_max_level() {
            return false;
        }

        self.level += 1;
        let m = self.upgrade_multiplier;
        self.damage = (self.damage as f64 * m).round() as u32;
        self.range = (self.range * m).round();
        self.fire_rate = (self.fire_rate * m * 10.0).round() / 10.0;
        if self.splash_radius > 0.0 {
            self.splash_radius = (self.splash_radius * m).round();
        }
        if !self.is_max_level() {
            self.upgrade_cost = (self.upgrade_cost as f64 * UPGRADE_COST_GROWTH).round() as u32;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::enemy::EnemyType;

    const EPS: f64 = 1e-9;

    fn basic() -> TowerType {
        TowerType {
            id: "basic".into(),
            name: "Basic".into(),
            damage: 20,
            range: 100.0,
            fire_rate: 1.0,
            cost: 50,
            projectile_speed: 300.0,
            splash_radius: 0.0,
            splash_damage_percent: 100.0,
            multi_shot: 1,
            multi_shot_angle: 0.0,
            upgrade_multiplier: 1.5,
            max_level: 3,
            color: None,
            projectile_color: None,
        }
    }

    fn enemy(id: u32, position: Vec2) -> Enemy {
        let kind = EnemyType {
            id: "grunt".into(),
            name: "Grunt".into(),
            health: 100,
            speed: 50.0,
            reward: 10,
            damage: 1,
            color: None,
            size: 20.0,
        };
        let mut e = Enemy::new(EnemyId(id), &kind, &[position]);
        e.position = position;
        e
    }

    fn tower(kind: &TowerType) -> Tower {
        Tower::new(TowerId(1), kind, Cell::new(0, 0), Vec2::new(0.0, 0.0))
    }

    #[test]
    fn test_initial_economics() {
        let t = tower(&basic());
        assert_eq!(t.level, 1);
        assert_eq!(t.upgrade_cost, 38); // round(37.5)
        assert_eq!(t.total_invested, 50);
        assert!(t.can_fire(0.0));
    }

    #[test]
    fn test_select_nearest_in_range() {
        let t = tower(&basic());
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(1), enemy(1, Vec2::new(80.0, 0.0)));
        enemies.insert(EnemyId(2), enemy(2, Vec2::new(0.0, 40.0)));
        enemies.insert(EnemyId(3), enemy(3, Vec2::new(150.0, 0.0)));

        assert_eq!(t.select_target(&enemies, TargetingPolicy::Nearest, &[]), Some(EnemyId(2)));

        enemies.get_mut(&EnemyId(2)).unwrap().apply_damage(1000);
        assert_eq!(t.select_target(&enemies, TargetingPolicy::Nearest, &[]), Some(EnemyId(1)));

        enemies.remove(&EnemyId(1));
        assert_eq!(t.select_target(&enemies, TargetingPolicy::Nearest, &[]), None);
    }

    #[test]
    fn test_select_tie_keeps_lowest_id() {
        let t = tower(&basic());
        let mut enemies = BTreeMap::new();
        enemies.insert(EnemyId(4), enemy(4, Vec2::new(30.0, 0.0)));
        enemies.insert(EnemyId(9), enemy(9, Vec2::new(0.0, 30.0)));
        assert_eq!(t.select_target(&enemies, TargetingPolicy::Nearest, &[]), Some(EnemyId(4)));
    }

    #[test]
    fn test_select_most_progressed() {
        let t = tower(&basic());
        let path = vec![Vec2::new(-50.0, 50.0), Vec2::new(50.0, 50.0), Vec2::new(50.0, -50.0)];
        let mut enemies = BTreeMap::new();

        let mut leader = enemy(1, Vec2::new(50.0, 0.0));
        leader.path_index = 1;
        let trailer = enemy(2, Vec2::new(0.0, 40.0));
        enemies.insert(EnemyId(1), leader);
        enemies.insert(EnemyId(2), trailer);

        assert_eq!(t.select_target(&enemies, TargetingPolicy::Nearest, &path), Some(EnemyId(2)));
        assert_eq!(
            t.select_target(&enemies, TargetingPolicy::MostProgressed, &path),
            Some(EnemyId(1))
        );
    }

    #[test]
    fn test_cooldown() {
        let mut t = tower(&basic());
        let target = enemy(1, Vec2::new(50.0, 0.0));
        let mut next_id = 0;

        t.fire(&target, 100.0, &mut next_id);
        assert!(!t.can_fire(100.0));
        assert!(!t.can_fire(1099.0));
        assert!(t.can_fire(1100.0));
    }

    #[test]
    fn test_single_shot_aims_directly() {
        let mut t = tower(&basic());
        let target = enemy(1, Vec2::new(30.0, 40.0));
        let mut next_id = 0;

        let fired = t.fire(&target, 0.0, &mut next_id);
        assert_eq!(fired, vec![ProjectileId(1)]);
        assert_eq!(t.projectiles.len(), 1);

        let p = &t.projectiles[0];
        assert!((p.launch_angle - 40f64.atan2(30.0)).abs() < EPS);
        assert!((p.position.x - 3.0).abs() < EPS);
        assert!((p.position.y - 4.0).abs() < EPS);
        assert_eq!(p.target, EnemyId(1));
        assert_eq!(p.damage, 20);
    }

    #[test]
    fn test_multi_shot_fan() {
        let mut kind = basic();
        kind.multi_shot = 3;
        kind.multi_shot_angle = 10.0;
        let mut t = tower(&kind);
        let target = enemy(1, Vec2::new(50.0, 50.0));
        let mut next_id = 10;

        let fired = t.fire(&target, 0.0, &mut next_id);
        assert_eq!(fired.len(), 3);
        assert_eq!(next_id, 13);

        let base = std::f64::consts::FRAC_PI_4;
        let step = 10f64.to_radians();
        let angles: Vec<f64> = t.projectiles.iter().map(|p| p.launch_angle).collect();
        assert!((angles[0] - (base - step)).abs() < EPS);
        assert!((angles[1] - base).abs() < EPS);
        assert!((angles[2] - (base + step)).abs() < EPS);
        assert!(t.projectiles.iter().all(|p| p.target == EnemyId(1)));
    }

    #[test]
    fn test_extra_shot_at_level_three() {
        let mut t = tower(&basic());
        assert_eq!(t.total_shots(), 1);
        t.upgrade();
        assert_eq!(t.total_shots(), 1);
        t.upgrade();
        assert_eq!(t.total_shots(), 2);
    }

    #[test]
    fn test_upgrade_compounds_and_caps() {
        let mut kind = basic();
        kind.splash_radius = 30.0;
        let mut t = tower(&kind);

        assert!(t.upgrade());
        assert_eq!(t.level, 2);
        assert_eq!(t.damage, 30);
        assert_eq!(t.range, 150.0);
        assert!((t.fire_rate - 1.5).abs() < EPS);
        assert_eq!(t.splash_radius, 45.0);
        assert_eq!(t.upgrade_cost, 57); // round(38 * 1.5)

        assert!(t.upgrade());
        assert_eq!(t.level, 3);
        assert_eq!(t.damage, 45);
        assert_eq!(t.range, 225.0);
        assert!((t.fire_rate - 2.3).abs() < EPS); // 2.25 -> 2.3
        assert_eq!(t.splash_radius, 68.0); // round(67.5)
        assert_eq!(t.upgrade_cost, 57); // unchanged at max level

        assert!(!t.upgrade());
        assert_eq!(t.level, 3);
        assert_eq!(t.damage, 45);
    }

    #[test]
    fn test_no_splash_stays_zero() {
        let mut t = tower(&basic());
        t.upgrade();
        assert_eq!(t.splash_radius, 0.0);
    }

    #[test]
    fn test_rejects_oversized_fan_and_level_cap() {
        use crate::game::config::ConfigError;

        let mut kind = basic();
        kind.multi_shot = MAX_MULTI_SHOT;
        kind.max_level = MAX_TOWER_LEVEL;
        assert!(kind.validate().is_ok());

        kind.multi_shot = u32::MAX;
        assert!(matches!(
            kind.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "towers.basic.multiShot"
        ));

        let mut kind = basic();
        kind.max_level = MAX_TOWER_LEVEL + 1;
        assert!(matches!(
            kind.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "towers.basic.maxLevel"
        ));
    }
}
