//! Tunable balance constants.
//!
//! Every number that shapes difficulty lives here instead of inline in the
//! systems. Values are grouped by concern and can be overridden from JSON;
//! any field left out of the JSON keeps its default.
//!
//! ```
//! use delve_core::config::Tuning;
//!
//! let t = Tuning::from_json(r#"{ "world": { "max_depth": 4 } }"#).unwrap();
//! assert_eq!(t.world.max_depth, 4);
//! assert_eq!(t.player.hp_max, Tuning::default().player.hp_max);
//! ```

use serde::{Deserialize, Serialize};

/// Complete tuning set for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub player: PlayerTuning,
    pub combat: CombatTuning,
    pub loot: LootTuning,
    pub enemies: EnemyTuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Rooms beyond this Manhattan distance are never created.
    pub max_depth: u32,
    /// Longest step `advance` will simulate, in seconds.
    pub max_dt: f32,
    /// Lifetime of a transient message, in seconds.
    pub message_ttl: f32,
    /// Decals kept per room; oldest are dropped first.
    pub decal_cap: usize,
    /// How close the player must be to use a fixture.
    pub interact_range: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_dt: 1.0 / 20.0,
            message_ttl: 2.0,
            decal_cap: 48,
            interact_range: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    pub hp_max: f32,
    pub speed: f32,
    /// Exponential smoothing rate toward the intended velocity.
    pub accel: f32,
    pub dash_speed: f32,
    pub dash_time: f32,
    pub dash_cooldown: f32,
    pub invuln_time: f32,
    pub shield_regen_delay: f32,
    /// Shield points restored per second once regeneration starts.
    pub shield_regen_rate: f32,
    pub hazard_damage: f32,
    pub start_coins: u32,
    pub start_keys: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 10.0,
            hp_max: 6.0,
            speed: 170.0,
            accel: 14.0,
            dash_speed: 520.0,
            dash_time: 0.14,
            dash_cooldown: 0.8,
            invuln_time: 0.6,
            shield_regen_delay: 3.0,
            shield_regen_rate: 1.0,
            hazard_damage: 1.0,
            start_coins: 0,
            start_keys: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub crit_multiplier: f32,
    pub chain_range: f32,
    /// Damage multiplier applied per chain hop.
    pub chain_damage_falloff: f32,
    /// Range multiplier applied per chain hop.
    pub chain_range_falloff: f32,
    pub freeze_time: f32,
    pub shock_time: f32,
    /// Speed/fire-rate multiplier while frozen.
    pub frozen_factor: f32,
    /// Speed/fire-rate multiplier while shocked.
    pub shocked_factor: f32,
    pub elite_armor: f32,
    pub boss_armor: f32,
    pub knockback_speed: f32,
    pub knockback_time: f32,
    /// Push applied to the player on contact hits.
    pub contact_knockback: f32,
    /// Share of a bullet's damage dealt by its explosion.
    pub explosion_damage_factor: f32,
    /// Boss hp fractions at which the next phase begins, descending.
    pub boss_phase_thresholds: Vec<f32>,
    pub minion_cap: usize,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            crit_multiplier: 2.0,
            chain_range: 110.0,
            chain_damage_falloff: 0.7,
            chain_range_falloff: 0.8,
            freeze_time: 1.2,
            shock_time: 1.5,
            frozen_factor: 0.15,
            shocked_factor: 0.6,
            elite_armor: 0.2,
            boss_armor: 0.3,
            knockback_speed: 160.0,
            knockback_time: 0.12,
            contact_knockback: 220.0,
            explosion_damage_factor: 0.8,
            boss_phase_thresholds: vec![0.66, 0.33],
            minion_cap: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootTuning {
    pub coin_chance: f32,
    pub heart_chance: f32,
    pub item_chance: f32,
    pub weapon_chance: f32,
    /// Multiplier on item/weapon chances for elite kills.
    pub elite_rare_mult: f32,
    /// Chance that clearing a plain combat room drops a coin cluster.
    pub clear_coin_chance: f32,
    /// Coins within this range drift toward the player.
    pub magnet_range: f32,
    pub magnet_speed: f32,
}

impl Default for LootTuning {
    fn default() -> Self {
        Self {
            coin_chance: 0.45,
            heart_chance: 0.08,
            item_chance: 0.03,
            weapon_chance: 0.02,
            elite_rare_mult: 2.0,
            clear_coin_chance: 0.35,
            magnet_range: 60.0,
            magnet_speed: 260.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub base_count: u32,
    pub max_count: u32,
    /// Fractional hp gain per point of effective depth.
    pub hp_per_depth: f32,
    pub speed_per_depth: f32,
    pub fire_rate_per_depth: f32,
    /// Elites fire `tier` times as often.
    pub elite_tier: f32,
    pub elite_hp_mult: f32,
    pub bullet_speed: f32,
    pub boss_hp: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            base_count: 3,
            max_count: 9,
            hp_per_depth: 0.12,
            speed_per_depth: 0.04,
            fire_rate_per_depth: 0.05,
            elite_tier: 1.35,
            elite_hp_mult: 1.8,
            bullet_speed: 180.0,
            boss_hp: 120.0,
        }
    }
}

/// A single out-of-range tuning value.
#[derive(Debug, Clone, PartialEq)]
pub enum TuningIssue {
    /// The graph needs at least two rings to hold a boss room.
    MaxDepthTooSmall(u32),
    NonPositive(&'static str),
    /// A probability outside `[0, 1]`.
    BadChance(&'static str),
    /// Phase thresholds must be in `(0, 1)` and strictly descending.
    BadPhaseThresholds,
}

impl std::fmt::Display for TuningIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuningIssue::MaxDepthTooSmall(d) => write!(f, "world.max_depth must be >= 2, got {}", d),
            TuningIssue::NonPositive(field) => write!(f, "{} must be positive", field),
            TuningIssue::BadChance(field) => write!(f, "{} must be within [0, 1]", field),
            TuningIssue::BadPhaseThresholds => {
                write!(f, "combat.boss_phase_thresholds must descend within (0, 1)")
            }
        }
    }
}

/// Smallest graph that still holds a boss ring.
pub const MIN_MAX_DEPTH: u32 = 2;

/// Errors from loading a tuning file.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(Vec<TuningIssue>),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "Tuning parse error: {}", e),
            ConfigError::Invalid(issues) => {
                write!(f, "Invalid tuning:")?;
                for issue in issues {
                    write!(f, " {};", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Tuning {
    /// Parse and validate a (possibly partial) JSON tuning document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        let issues = tuning.validate();
        if !issues.is_empty() {
            log::warn!("Rejected tuning with {} issue(s)", issues.len());
            return Err(ConfigError::Invalid(issues));
        }
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value, returning all problems found.
    pub fn validate(&self) -> Vec<TuningIssue> {
        let mut issues = Vec::new();

        if self.world.max_depth < MIN_MAX_DEPTH {
            issues.push(TuningIssue::MaxDepthTooSmall(self.world.max_depth));
        }
        let positives = [
            ("world.max_dt", self.world.max_dt),
            ("player.radius", self.player.radius),
            ("player.hp_max", self.player.hp_max),
            ("player.speed", self.player.speed),
            ("enemies.bullet_speed", self.enemies.bullet_speed),
            ("enemies.boss_hp", self.enemies.boss_hp),
            ("enemies.elite_tier", self.enemies.elite_tier),
        ];
        for (name, value) in positives {
            if !(value > 0.0) {
                issues.push(TuningIssue::NonPositive(name));
            }
        }
        let chances = [
            ("loot.coin_chance", self.loot.coin_chance),
            ("loot.heart_chance", self.loot.heart_chance),
            ("loot.item_chance", self.loot.item_chance),
            ("loot.weapon_chance", self.loot.weapon_chance),
            ("loot.clear_coin_chance", self.loot.clear_coin_chance),
            ("combat.elite_armor", self.combat.elite_armor),
            ("combat.boss_armor", self.combat.boss_armor),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                issues.push(TuningIssue::BadChance(name));
            }
        }
        let th = &self.combat.boss_phase_thresholds;
        let in_range = th.iter().all(|t| *t > 0.0 && *t < 1.0);
        let descending = th.windows(2).all(|w| w[0] > w[1]);
        if !in_range || !descending {
            issues.push(TuningIssue::BadPhaseThresholds);
        }

        issues
    }

    /// Replace every value `validate` rejects with a usable one and return
    /// what was wrong. Chances are clamped; everything else falls back to
    /// its default.
    pub fn repair(&mut self) -> Vec<TuningIssue> {
        let issues = self.validate();
        if issues.is_empty() {
            return issues;
        }
        let defaults = Tuning::default();

        self.world.max_depth = self.world.max_depth.max(MIN_MAX_DEPTH);
        let positives = [
            (&mut self.world.max_dt, defaults.world.max_dt),
            (&mut self.player.radius, defaults.player.radius),
            (&mut self.player.hp_max, defaults.player.hp_max),
            (&mut self.player.speed, defaults.player.speed),
            (&mut self.enemies.bullet_speed, defaults.enemies.bullet_speed),
            (&mut self.enemies.boss_hp, defaults.enemies.boss_hp),
            (&mut self.enemies.elite_tier, defaults.enemies.elite_tier),
        ];
        for (value, fallback) in positives {
            if !(*value > 0.0) {
                *value = fallback;
            }
        }
        let chances = [
            (&mut self.loot.coin_chance, defaults.loot.coin_chance),
            (&mut self.loot.heart_chance, defaults.loot.heart_chance),
            (&mut self.loot.item_chance, defaults.loot.item_chance),
            (&mut self.loot.weapon_chance, defaults.loot.weapon_chance),
            (&mut self.loot.clear_coin_chance, defaults.loot.clear_coin_chance),
            (&mut self.combat.elite_armor, defaults.combat.elite_armor),
            (&mut self.combat.boss_armor, defaults.combat.boss_armor),
        ];
        for (value, fallback) in chances {
            *value = if value.is_nan() { fallback } else { value.clamp(0.0, 1.0) };
        }
        if issues.contains(&TuningIssue::BadPhaseThresholds) {
            self.combat.boss_phase_thresholds = defaults.combat.boss_phase_thresholds;
        }

        issues
    }
}
