//! Ability catalog
//!
//! Every spinner may carry at most one ability. [`AbilityKind`] is the closed,
//! fieldless tag used for assignment, configuration and snapshots;
//! [`Ability`] is the live variant carrying only the state that ability needs.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Ticks between Blink teleports
pub const BLINK_PERIOD: u32 = 240;
/// Ticks between Dash kicks
pub const DASH_PERIOD: u32 = 120;
pub const DASH_KICK: f32 = 8.0;
pub const MAGNET_RANGE: f32 = 200.0;
pub const MAGNET_PULL: f32 = 0.05;
pub const REPULSOR_RANGE: f32 = 120.0;
pub const REPULSOR_PUSH: f32 = 0.08;
/// Healing per tick and total healing budget per heat
pub const REGEN_RATE: f32 = 0.05;
pub const REGEN_POOL: f32 = 40.0;
pub const GHOST_PERIOD: u32 = 300;
pub const GHOST_DURATION: u32 = 60;

pub const EDGE_SAVES: u8 = 2;
pub const GRAVITY_BOWL_FACTOR: f32 = 3.0;
pub const HYPERDRIVE_MOVE_FACTOR: f32 = 2.0;
pub const HYPERDRIVE_FRICTION: f32 = 0.999;
pub const HYPERDRIVE_SPEED_FACTOR: f32 = 1.5;

pub const SLICE_CHANCE: f64 = 0.2;
pub const SLICE_DAMAGE: f32 = 8.0;

pub const BURST_CHANCE: f64 = 0.2;
pub const DODGE_CHANCE: f64 = 0.25;
pub const COUNTER_CHANCE: f64 = 0.3;
pub const GAMBLER_CHANCE: f64 = 0.5;
pub const COPYCAT_CHANCE: f64 = 0.25;
pub const CRITICAL_CHANCE: f64 = 0.1;
pub const SWAP_CHANCE: f64 = 0.15;

pub const CAPACITOR_CAP: f32 = 40.0;
pub const THORNS_REFLECT: f32 = 0.3;
pub const VAMPIRE_DRAIN: f32 = 0.25;
pub const VENOM_TICKS: u32 = 180;
pub const VENOM_RATE: f32 = 0.1;
pub const CHILL_TICKS: u32 = 120;
pub const CHILL_FRICTION: f32 = 0.97;
pub const GROWTH_STEP: f32 = 1.5;
pub const MAX_RADIUS: f32 = 60.0;
pub const MIN_RADIUS: f32 = 12.0;
pub const TETHER_TICKS: u32 = 300;
pub const PARASITE_INCUBATION: u32 = 240;

pub const EXPLOSION_RADIUS: f32 = 180.0;
pub const EXPLOSION_FORCE: f32 = 400.0;
/// Distances closer than this are treated as this distance
pub const EXPLOSION_MIN_DISTANCE: f32 = 10.0;
pub const EXPLOSION_DAMAGE: f32 = 8.0;
pub const MARTYR_RADIUS: f32 = 150.0;
pub const MARTYR_DAMAGE: f32 = 20.0;
pub const CURSE_DAMAGE: f32 = 25.0;
pub const PHOENIX_STAMINA: f32 = 0.5;
pub const NEO_GRACE_TICKS: u64 = 180;
pub const SPLIT_FRAGMENTS: usize = 2;
pub const CLONE_THRESHOLD: f32 = 0.5;

/// Fieldless ability tag (stable, serializable, used in config and snapshots)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityKind {
    Hyperdrive,
    Gravity,
    Rebound,
    SoulBound,
    Blink,
    Dash,
    Magnet,
    Repulsor,
    Regenerator,
    Ghost,
    Revenge,
    Rival,
    Bully,
    Prism,
    Immune,
    Bouncy,
    Rubber,
    Spiky,
    Tank,
    GlassCannon,
    Heavyweight,
    Featherweight,
    Juggernaut,
    Thorns,
    Brawler,
    Momentum,
    Rage,
    LastStand,
    Underdog,
    Burst,
    Dodge,
    Counter,
    Gambler,
    Copycat,
    Critical,
    Capacitor,
    Swapper,
    Venom,
    Vampire,
    Grower,
    Shrinker,
    Tether,
    Parasite,
    Freezer,
    Mirror,
    Slice,
    Gunner,
    Trapper,
    Shockwave,
    Laser,
    Pulsar,
    Bomber,
    Reflector,
    Explosive,
    Martyr,
    Splitter,
    Phoenix,
    Neo,
    Curse,
    Cloner,
}

impl AbilityKind {
    /// The whole catalog, in declaration order
    pub const ALL: [AbilityKind; 60] = [
        AbilityKind::Hyperdrive,
        AbilityKind::Gravity,
        AbilityKind::Rebound,
        AbilityKind::SoulBound,
        AbilityKind::Blink,
        AbilityKind::Dash,
        AbilityKind::Magnet,
        AbilityKind::Repulsor,
        AbilityKind::Regenerator,
        AbilityKind::Ghost,
        AbilityKind::Revenge,
        AbilityKind::Rival,
        AbilityKind::Bully,
        AbilityKind::Prism,
        AbilityKind::Immune,
        AbilityKind::Bouncy,
        AbilityKind::Rubber,
        AbilityKind::Spiky,
        AbilityKind::Tank,
        AbilityKind::GlassCannon,
        AbilityKind::Heavyweight,
        AbilityKind::Featherweight,
        AbilityKind::Juggernaut,
        AbilityKind::Thorns,
        AbilityKind::Brawler,
        AbilityKind::Momentum,
        AbilityKind::Rage,
        AbilityKind::LastStand,
        AbilityKind::Underdog,
        AbilityKind::Burst,
        AbilityKind::Dodge,
        AbilityKind::Counter,
        AbilityKind::Gambler,
        AbilityKind::Copycat,
        AbilityKind::Critical,
        AbilityKind::Capacitor,
        AbilityKind::Swapper,
        AbilityKind::Venom,
        AbilityKind::Vampire,
        AbilityKind::Grower,
        AbilityKind::Shrinker,
        AbilityKind::Tether,
        AbilityKind::Parasite,
        AbilityKind::Freezer,
        AbilityKind::Mirror,
        AbilityKind::Slice,
        AbilityKind::Gunner,
        AbilityKind::Trapper,
        AbilityKind::Shockwave,
        AbilityKind::Laser,
        AbilityKind::Pulsar,
        AbilityKind::Bomber,
        AbilityKind::Reflector,
        AbilityKind::Explosive,
        AbilityKind::Martyr,
        AbilityKind::Splitter,
        AbilityKind::Phoenix,
        AbilityKind::Neo,
        AbilityKind::Curse,
        AbilityKind::Cloner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityKind::Hyperdrive => "Hyperdrive",
            AbilityKind::Gravity => "Gravity",
            AbilityKind::Rebound => "Rebound",
            AbilityKind::SoulBound => "SoulBound",
            AbilityKind::Blink => "Blink",
            AbilityKind::Dash => "Dash",
            AbilityKind::Magnet => "Magnet",
            AbilityKind::Repulsor => "Repulsor",
            AbilityKind::Regenerator => "Regenerator",
            AbilityKind::Ghost => "Ghost",
            AbilityKind::Revenge => "Revenge",
            AbilityKind::Rival => "Rival",
            AbilityKind::Bully => "Bully",
            AbilityKind::Prism => "Prism",
            AbilityKind::Immune => "Immune",
            AbilityKind::Bouncy => "Bouncy",
            AbilityKind::Rubber => "Rubber",
            AbilityKind::Spiky => "Spiky",
            AbilityKind::Tank => "Tank",
            AbilityKind::GlassCannon => "GlassCannon",
            AbilityKind::Heavyweight => "Heavyweight",
            AbilityKind::Featherweight => "Featherweight",
            AbilityKind::Juggernaut => "Juggernaut",
            AbilityKind::Thorns => "Thorns",
            AbilityKind::Brawler => "Brawler",
            AbilityKind::Momentum => "Momentum",
            AbilityKind::Rage => "Rage",
            AbilityKind::LastStand => "LastStand",
            AbilityKind::Underdog => "Underdog",
            AbilityKind::Burst => "Burst",
            AbilityKind::Dodge => "Dodge",
            AbilityKind::Counter => "Counter",
            AbilityKind::Gambler => "Gambler",
            AbilityKind::Copycat => "Copycat",
            AbilityKind::Critical => "Critical",
            AbilityKind::Capacitor => "Capacitor",
            AbilityKind::Swapper => "Swapper",
            AbilityKind::Venom => "Venom",
            AbilityKind::Vampire => "Vampire",
            AbilityKind::Grower => "Grower",
            AbilityKind::Shrinker => "Shrinker",
            AbilityKind::Tether => "Tether",
            AbilityKind::Parasite => "Parasite",
            AbilityKind::Freezer => "Freezer",
            AbilityKind::Mirror => "Mirror",
            AbilityKind::Slice => "Slice",
            AbilityKind::Gunner => "Gunner",
            AbilityKind::Trapper => "Trapper",
            AbilityKind::Shockwave => "Shockwave",
            AbilityKind::Laser => "Laser",
            AbilityKind::Pulsar => "Pulsar",
            AbilityKind::Bomber => "Bomber",
            AbilityKind::Reflector => "Reflector",
            AbilityKind::Explosive => "Explosive",
            AbilityKind::Martyr => "Martyr",
            AbilityKind::Splitter => "Splitter",
            AbilityKind::Phoenix => "Phoenix",
            AbilityKind::Neo => "Neo",
            AbilityKind::Curse => "Curse",
            AbilityKind::Cloner => "Cloner",
        }
    }

    /// Case-insensitive lookup that ignores spaces, underscores and hyphens;
    /// unknown names yield `None` (treated as "no ability")
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(&wanted))
    }
}

impl std::fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live ability with its per-heat state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    Hyperdrive,
    Gravity,
    Rebound { saves_left: u8 },
    /// Immortal while the anchor lives
    SoulBound { anchor: Option<EntityId> },
    Blink { cooldown: u32 },
    Dash { cooldown: u32 },
    Magnet,
    Repulsor,
    Regenerator { pool: f32 },
    Ghost { cooldown: u32, phased: u32 },
    Revenge { last_attacker: Option<EntityId> },
    Rival { rival: Option<EntityId> },
    Bully,
    Prism,
    Immune,
    Bouncy,
    Rubber,
    Spiky,
    Tank,
    GlassCannon,
    Heavyweight,
    Featherweight,
    Juggernaut,
    Thorns,
    Brawler,
    Momentum,
    Rage,
    LastStand,
    Underdog,
    Burst,
    Dodge,
    Counter,
    Gambler,
    Copycat,
    Critical,
    Capacitor { stored: f32 },
    Swapper,
    Venom,
    Vampire,
    Grower,
    Shrinker,
    /// Entities already latched this heat
    Tether { latched: Vec<EntityId> },
    Parasite { host: Option<EntityId>, emerge_in: u32 },
    Freezer,
    Mirror,
    Slice,
    Gunner { cooldown: u32 },
    Trapper { cooldown: u32 },
    Shockwave { cooldown: u32 },
    Laser { cooldown: u32 },
    Pulsar { cooldown: u32 },
    Bomber { cooldown: u32 },
    Reflector,
    /// Armed on death, consumed by the aftermath pass
    Explosive { armed: bool },
    Martyr,
    Splitter,
    Phoenix { used: bool },
    Neo,
    Curse { last_attacker: Option<EntityId> },
    Cloner { used: bool },
}

impl Ability {
    /// Fresh state for a newly spawned holder
    pub fn new(kind: AbilityKind) -> Self {
        use super::hazard::{
            BOMBER_PERIOD, GUNNER_PERIOD, LASER_PERIOD, PULSAR_PERIOD, SHOCKWAVE_PERIOD,
            TRAPPER_PERIOD,
        };

        match kind {
            AbilityKind::Hyperdrive => Ability::Hyperdrive,
            AbilityKind::Gravity => Ability::Gravity,
            AbilityKind::Rebound => Ability::Rebound {
                saves_left: EDGE_SAVES,
            },
            AbilityKind::SoulBound => Ability::SoulBound { anchor: None },
            AbilityKind::Blink => Ability::Blink {
                cooldown: BLINK_PERIOD,
            },
            AbilityKind::Dash => Ability::Dash {
                cooldown: DASH_PERIOD,
            },
            AbilityKind::Magnet => Ability::Magnet,
            AbilityKind::Repulsor => Ability::Repulsor,
            AbilityKind::Regenerator => Ability::Regenerator { pool: REGEN_POOL },
            AbilityKind::Ghost => Ability::Ghost {
                cooldown: GHOST_PERIOD,
                phased: 0,
            },
            AbilityKind::Revenge => Ability::Revenge {
                last_attacker: None,
            },
            AbilityKind::Rival => Ability::Rival { rival: None },
            AbilityKind::Bully => Ability::Bully,
            AbilityKind::Prism => Ability::Prism,
            AbilityKind::Immune => Ability::Immune,
            AbilityKind::Bouncy => Ability::Bouncy,
            AbilityKind::Rubber => Ability::Rubber,
            AbilityKind::Spiky => Ability::Spiky,
            AbilityKind::Tank => Ability::Tank,
            AbilityKind::GlassCannon => Ability::GlassCannon,
            AbilityKind::Heavyweight => Ability::Heavyweight,
            AbilityKind::Featherweight => Ability::Featherweight,
            AbilityKind::Juggernaut => Ability::Juggernaut,
            AbilityKind::Thorns => Ability::Thorns,
            AbilityKind::Brawler => Ability::Brawler,
            AbilityKind::Momentum => Ability::Momentum,
            AbilityKind::Rage => Ability::Rage,
            AbilityKind::LastStand => Ability::LastStand,
            AbilityKind::Underdog => Ability::Underdog,
            AbilityKind::Burst => Ability::Burst,
            AbilityKind::Dodge => Ability::Dodge,
            AbilityKind::Counter => Ability::Counter,
            AbilityKind::Gambler => Ability::Gambler,
            AbilityKind::Copycat => Ability::Copycat,
            AbilityKind::Critical => Ability::Critical,
            AbilityKind::Capacitor => Ability::Capacitor { stored: 0.0 },
            AbilityKind::Swapper => Ability::Swapper,
            AbilityKind::Venom => Ability::Venom,
            AbilityKind::Vampire => Ability::Vampire,
            AbilityKind::Grower => Ability::Grower,
            AbilityKind::Shrinker => Ability::Shrinker,
            AbilityKind::Tether => Ability::Tether {
                latched: Vec::new(),
            },
            AbilityKind::Parasite => Ability::Parasite {
                host: None,
                emerge_in: 0,
            },
            AbilityKind::Freezer => Ability::Freezer,
            AbilityKind::Mirror => Ability::Mirror,
            AbilityKind::Slice => Ability::Slice,
            AbilityKind::Gunner => Ability::Gunner {
                cooldown: GUNNER_PERIOD,
            },
            AbilityKind::Trapper => Ability::Trapper {
                cooldown: TRAPPER_PERIOD,
            },
            AbilityKind::Shockwave => Ability::Shockwave {
                cooldown: SHOCKWAVE_PERIOD,
            },
            AbilityKind::Laser => Ability::Laser {
                cooldown: LASER_PERIOD,
            },
            AbilityKind::Pulsar => Ability::Pulsar {
                cooldown: PULSAR_PERIOD,
            },
            AbilityKind::Bomber => Ability::Bomber {
                cooldown: BOMBER_PERIOD,
            },
            AbilityKind::Reflector => Ability::Reflector,
            AbilityKind::Explosive => Ability::Explosive { armed: false },
            AbilityKind::Martyr => Ability::Martyr,
            AbilityKind::Splitter => Ability::Splitter,
            AbilityKind::Phoenix => Ability::Phoenix { used: false },
            AbilityKind::Neo => Ability::Neo,
            AbilityKind::Curse => Ability::Curse {
                last_attacker: None,
            },
            AbilityKind::Cloner => Ability::Cloner { used: false },
        }
    }

    pub fn kind(&self) -> AbilityKind {
        match self {
            Ability::Hyperdrive => AbilityKind::Hyperdrive,
            Ability::Gravity => AbilityKind::Gravity,
            Ability::Rebound { .. } => AbilityKind::Rebound,
            Ability::SoulBound { .. } => AbilityKind::SoulBound,
            Ability::Blink { .. } => AbilityKind::Blink,
            Ability::Dash { .. } => AbilityKind::Dash,
            Ability::Magnet => AbilityKind::Magnet,
            Ability::Repulsor => AbilityKind::Repulsor,
            Ability::Regenerator { .. } => AbilityKind::Regenerator,
            Ability::Ghost { .. } => AbilityKind::Ghost,
            Ability::Revenge { .. } => AbilityKind::Revenge,
            Ability::Rival { .. } => AbilityKind::Rival,
            Ability::Bully => AbilityKind::Bully,
            Ability::Prism => AbilityKind::Prism,
            Ability::Immune => AbilityKind::Immune,
            Ability::Bouncy => AbilityKind::Bouncy,
            Ability::Rubber => AbilityKind::Rubber,
            Ability::Spiky => AbilityKind::Spiky,
            Ability::Tank => AbilityKind::Tank,
            Ability::GlassCannon => AbilityKind::GlassCannon,
            Ability::Heavyweight => AbilityKind::Heavyweight,
            Ability::Featherweight => AbilityKind::Featherweight,
            Ability::Juggernaut => AbilityKind::Juggernaut,
            Ability::Thorns => AbilityKind::Thorns,
            Ability::Brawler => AbilityKind::Brawler,
            Ability::Momentum => AbilityKind::Momentum,
            Ability::Rage => AbilityKind::Rage,
            Ability::LastStand => AbilityKind::LastStand,
            Ability::Underdog => AbilityKind::Underdog,
            Ability::Burst => AbilityKind::Burst,
            Ability::Dodge => AbilityKind::Dodge,
            Ability::Counter => AbilityKind::Counter,
            Ability::Gambler => AbilityKind::Gambler,
            Ability::Copycat => AbilityKind::Copycat,
            Ability::Critical => AbilityKind::Critical,
            Ability::Capacitor { .. } => AbilityKind::Capacitor,
            Ability::Swapper => AbilityKind::Swapper,
            Ability::Venom => AbilityKind::Venom,
            Ability::Vampire => AbilityKind::Vampire,
            Ability::Grower => AbilityKind::Grower,
            Ability::Shrinker => AbilityKind::Shrinker,
            Ability::Tether { .. } => AbilityKind::Tether,
            Ability::Parasite { .. } => AbilityKind::Parasite,
            Ability::Freezer => AbilityKind::Freezer,
            Ability::Mirror => AbilityKind::Mirror,
            Ability::Slice => AbilityKind::Slice,
            Ability::Gunner { .. } => AbilityKind::Gunner,
            Ability::Trapper { .. } => AbilityKind::Trapper,
            Ability::Shockwave { .. } => AbilityKind::Shockwave,
            Ability::Laser { .. } => AbilityKind::Laser,
            Ability::Pulsar { .. } => AbilityKind::Pulsar,
            Ability::Bomber { .. } => AbilityKind::Bomber,
            Ability::Reflector => AbilityKind::Reflector,
            Ability::Explosive { .. } => AbilityKind::Explosive,
            Ability::Martyr => AbilityKind::Martyr,
            Ability::Splitter => AbilityKind::Splitter,
            Ability::Phoenix { .. } => AbilityKind::Phoenix,
            Ability::Neo => AbilityKind::Neo,
            Ability::Curse { .. } => AbilityKind::Curse,
            Ability::Cloner { .. } => AbilityKind::Cloner,
        }
    }

    /// Whether this ability lets its holder copy another's ability
    pub fn copies_others(&self) -> bool {
        matches!(self, Ability::Copycat | Ability::Mirror)
    }
}
