//! Game settings and balance
//!
//! Every tunable number of the simulation lives here. Defaults match the
//! shipped game; a JSON file can override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which optional subsystems are switched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Parts, enemies, thieves and chairs only
    Classic,
    /// Classic plus boomerang and speed boost pickups
    Arsenal,
    /// Everything, including the Super Boomer boss
    #[default]
    Full,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classic => "Classic",
            Variant::Arsenal => "Arsenal",
            Variant::Full => "Full",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(Variant::Classic),
            "arsenal" => Some(Variant::Arsenal),
            "full" | "boss" => Some(Variant::Full),
            _ => None,
        }
    }

    pub fn boomerang_enabled(&self) -> bool {
        !matches!(self, Variant::Classic)
    }

    pub fn speed_boost_enabled(&self) -> bool {
        !matches!(self, Variant::Classic)
    }

    pub fn boss_enabled(&self) -> bool {
        matches!(self, Variant::Full)
    }
}

/// Errors from loading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Game balance and subsystem toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Arena ===
    pub screen_width: f32,
    pub screen_height: f32,
    /// How long the intro crawl runs before play starts on its own (ms)
    pub intro_duration_ms: u64,

    // === Subsystems ===
    pub boomerang_enabled: bool,
    pub speed_boost_enabled: bool,
    pub boss_enabled: bool,

    // === Population ===
    pub num_parts: usize,
    pub num_enemies: usize,
    /// Every Nth delivery adds a thief
    pub thief_every: u32,

    // === Movement (pixels per tick) ===
    pub player_speed: f32,
    pub enemy_speed: f32,
    /// Enemies closer than this push apart
    pub min_enemy_separation: f32,
    /// Respawned enemies appear at least this far from the player
    pub respawn_safe_distance: f32,

    // === Thieves ===
    pub thief_speed: f32,
    pub thief_drop_min_ms: u64,
    pub thief_drop_max_ms: u64,
    pub thief_cooldown_ms: u64,
    /// Per-tick chance of a fresh random heading
    pub thief_turn_chance: f64,

    // === Long line at the cashier ===
    pub line_probability: f64,
    pub wait_time_ms: u64,
    pub come_back_delay_ms: u64,

    // === Chairs ===
    pub chair_drop_interval_ms: u64,
    pub chair_drop_chance: f64,
    pub chair_invincibility_ms: u64,

    // === Boomerang ===
    pub boomerang_spawn_interval_ms: u64,
    pub boomerang_spawn_chance: f64,
    pub boomerang_respawn_delay_ms: u64,
    /// Curve parameter advance per tick
    pub boomerang_step: f32,
    /// Distance from the thrower to the curve's control point, along the aim
    pub boomerang_reach: f32,
    /// Upward offset of the control point
    pub boomerang_lift: f32,

    // === Speed boost ===
    pub speed_boost_spawn_interval_ms: u64,
    pub speed_boost_spawn_chance: f64,
    pub speed_boost_duration_ms: u64,
    pub speed_boost_multiplier: f32,

    // === Super Boomer ===
    /// Every Nth delivery triggers the boss warning
    pub boss_every: u32,
    pub boss_warning_ms: u64,
    pub boss_charge_ms: u64,
    pub boss_sprint_speed: f32,
    pub boss_pursuit_speed: f32,
    pub boss_chair_interval_ms: u64,
    pub boss_hit_points: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: 1024.0,
            screen_height: 768.0,
            intro_duration_ms: 23_160,

            boomerang_enabled: true,
            speed_boost_enabled: true,
            boss_enabled: true,

            num_parts: 5,
            num_enemies: 3,
            thief_every: 10,

            player_speed: 4.0,
            enemy_speed: 2.0,
            min_enemy_separation: 40.0,
            respawn_safe_distance: 150.0,

            thief_speed: 1.0,
            thief_drop_min_ms: 3_000,
            thief_drop_max_ms: 30_000,
            thief_cooldown_ms: 500,
            thief_turn_chance: 0.02,

            line_probability: 0.5,
            wait_time_ms: 1_200,
            come_back_delay_ms: 5_000,

            chair_drop_interval_ms: 10_000,
            chair_drop_chance: 0.5,
            chair_invincibility_ms: 2_000,

            boomerang_spawn_interval_ms: 20_000,
            boomerang_spawn_chance: 0.3,
            boomerang_respawn_delay_ms: 10_000,
            boomerang_step: 0.015,
            boomerang_reach: 150.0,
            boomerang_lift: 75.0,

            speed_boost_spawn_interval_ms: 30_000,
            speed_boost_spawn_chance: 0.2,
            speed_boost_duration_ms: 10_000,
            speed_boost_multiplier: 2.0,

            boss_every: 1,
            boss_warning_ms: 1_000,
            boss_charge_ms: 3_000,
            boss_sprint_speed: 10.0,
            boss_pursuit_speed: 1.0,
            boss_chair_interval_ms: 2_000,
            boss_hit_points: 5,
        }
    }
}

impl Settings {
    /// Environment variable naming a settings file for [`Settings::load`]
    pub const ENV_VAR: &'static str = "JUNKYARD_SETTINGS";

    /// Create settings from a variant (applies the variant's toggles)
    pub fn from_variant(variant: Variant) -> Self {
        let mut settings = Self::default();
        settings.apply_variant(variant);
        settings
    }

    /// Switch the optional subsystems to match a variant
    pub fn apply_variant(&mut self, variant: Variant) {
        self.boomerang_enabled = variant.boomerang_enabled();
        self.speed_boost_enabled = variant.speed_boost_enabled();
        self.boss_enabled = variant.boss_enabled();
    }

    /// Check value ranges the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        let probabilities = [
            ("line_probability", self.line_probability),
            ("chair_drop_chance", self.chair_drop_chance),
            ("boomerang_spawn_chance", self.boomerang_spawn_chance),
            ("speed_boost_spawn_chance", self.speed_boost_spawn_chance),
            ("thief_turn_chance", self.thief_turn_chance),
        ];
        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SettingsError::Invalid {
                    field,
                    reason: format!("{p} is not a probability"),
                });
            }
        }

        // Random spawns sample [50, size - 150], so the arena must be wider than that
        let min_side = (crate::consts::SPAWN_MARGIN + crate::consts::PART_SPAWN_FAR_MARGIN) as f32;
        if self.screen_width <= min_side || self.screen_height <= min_side {
            return Err(SettingsError::Invalid {
                field: "screen_width",
                reason: format!(
                    "arena {}x{} is smaller than the spawn margins",
                    self.screen_width, self.screen_height
                ),
            });
        }

        if self.thief_drop_min_ms > self.thief_drop_max_ms {
            return Err(SettingsError::Invalid {
                field: "thief_drop_min_ms",
                reason: "exceeds thief_drop_max_ms".to_string(),
            });
        }
        if self.thief_every == 0 {
            return Err(SettingsError::Invalid {
                field: "thief_every",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.boss_every == 0 {
            return Err(SettingsError::Invalid {
                field: "boss_every",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.boomerang_step <= 0.0 {
            return Err(SettingsError::Invalid {
                field: "boomerang_step",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings from the file named by `JUNKYARD_SETTINGS`, or defaults
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_VAR) else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file {path}: {e}");
                Self::default()
            }
        }
    }

    /// Save settings as pretty-printed JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}
