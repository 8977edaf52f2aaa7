//! Tournament configuration
//!
//! Loaded from TOML (every field optional, missing ones fall back to the
//! defaults below) or built in code.

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TournamentError;
use crate::sim::ability::AbilityKind;
use crate::sim::arena::Arena;

/// Battle speed preset: how many full ticks run per presentation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BattleSpeed {
    #[default]
    Normal,
    Double,
    Quad,
    Hyper,
}

impl BattleSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            BattleSpeed::Normal => "Normal",
            BattleSpeed::Double => "Double",
            BattleSpeed::Quad => "Quad",
            BattleSpeed::Hyper => "Hyper",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" | "1" | "1x" => Some(BattleSpeed::Normal),
            "double" | "2" | "2x" => Some(BattleSpeed::Double),
            "quad" | "4" | "4x" => Some(BattleSpeed::Quad),
            "hyper" | "8" | "8x" => Some(BattleSpeed::Hyper),
            _ => None,
        }
    }

    /// Ticks per frame for this preset
    pub fn ticks_per_frame(&self) -> u32 {
        match self {
            BattleSpeed::Normal => 1,
            BattleSpeed::Double => 2,
            BattleSpeed::Quad => 4,
            BattleSpeed::Hyper => 8,
        }
    }
}

/// Arena shape as written in config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ArenaConfig {
    Circle { radius: f32, slope: f32 },
    Rectangle { width: f32, height: f32, bumpers: bool },
}

impl ArenaConfig {
    pub fn heat_default() -> Self {
        ArenaConfig::Circle {
            radius: ARENA_RADIUS,
            slope: ARENA_SLOPE,
        }
    }

    pub fn finals_default() -> Self {
        ArenaConfig::Rectangle {
            width: FINALS_WIDTH,
            height: FINALS_HEIGHT,
            bumpers: true,
        }
    }

    pub fn to_arena(&self) -> Arena {
        match *self {
            ArenaConfig::Circle { radius, slope } => Arena::circle(Vec2::ZERO, radius, slope),
            ArenaConfig::Rectangle {
                width,
                height,
                bumpers: true,
            } => Arena::finals_pit(Vec2::ZERO, width, height),
            ArenaConfig::Rectangle {
                width,
                height,
                bumpers: false,
            } => Arena::rectangle(Vec2::ZERO, width, height, Vec::new()),
        }
    }

    fn validate(&self) -> Result<(), TournamentError> {
        let ok = match *self {
            ArenaConfig::Circle { radius, slope } => radius > RADIUS_BASE * 4.0 && slope >= 0.0,
            ArenaConfig::Rectangle { width, height, .. } => {
                width > RADIUS_BASE * 4.0 && height > RADIUS_BASE * 4.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(TournamentError::InvalidConfig(format!("arena too small: {self:?}")))
        }
    }
}

/// Tournament tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Seed for the default random source
    pub seed: u64,
    /// Up to this many entrants play a single heat straight to a winner
    pub single_heat_cap: usize,
    /// Entrants advancing out of each regular heat
    pub advancers_per_heat: usize,
    /// Above this many entrants a preliminary group stage runs first
    pub preliminary_threshold: usize,
    pub preliminary_group_size: usize,
    pub heat_arena: ArenaConfig,
    pub finals_arena: ArenaConfig,
    pub speed: BattleSpeed,
    /// Chance an entrant without a forced ability rolls a random one
    pub ability_chance: f64,
    /// Forced abilities by entrant label
    pub abilities: BTreeMap<String, String>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            single_heat_cap: 11,
            advancers_per_heat: 2,
            preliminary_threshold: 55,
            preliminary_group_size: 10,
            heat_arena: ArenaConfig::heat_default(),
            finals_arena: ArenaConfig::finals_default(),
            speed: BattleSpeed::Normal,
            ability_chance: 1.0,
            abilities: BTreeMap::new(),
        }
    }
}

impl TournamentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, TournamentError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TournamentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded tournament config from {}", path.display());
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.single_heat_cap < 2 {
            return Err(TournamentError::InvalidConfig(
                "single_heat_cap must be at least 2".into(),
            ));
        }
        if self.advancers_per_heat == 0 {
            return Err(TournamentError::InvalidConfig(
                "advancers_per_heat must be at least 1".into(),
            ));
        }
        if self.preliminary_group_size < 2 {
            return Err(TournamentError::InvalidConfig(
                "preliminary_group_size must be at least 2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ability_chance) {
            return Err(TournamentError::InvalidConfig(format!(
                "ability_chance {} outside 0..=1",
                self.ability_chance
            )));
        }
        self.heat_arena.validate()?;
        self.finals_arena.validate()
    }

    /// Ability forced on a label by the `[abilities]` table
    ///
    /// `None` when the label has no entry. `Some(None)` when the entry names
    /// an unknown ability: it is ignored with a warning and the entrant plays
    /// without one.
    pub fn ability_override(&self, label: &str) -> Option<Option<AbilityKind>> {
        let (_, name) = self
            .abilities
            .iter()
            .find(|(who, _)| who.trim().eq_ignore_ascii_case(label.trim()))?;
        let kind = AbilityKind::from_name(name);
        if kind.is_none() {
            log::warn!("Ignoring unknown ability {name:?} for {label}");
        }
        Some(kind)
    }
}
