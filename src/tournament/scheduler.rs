//! Tournament state machine
//!
//! Drives heats tick by tick on one shared [`SimulationContext`]. Between
//! heats the machine parks in [`TournamentPhase::HeatTransition`] until the
//! caller asks it to move on with [`TournamentHandle::request_heat_advance`].

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bracket::{advancers_for, dedupe_entrants, split_into_groups, split_into_heats};
use crate::config::TournamentConfig;
use crate::error::TournamentError;
use crate::sim::ability::AbilityKind;
use crate::sim::context::SimulationContext;
use crate::sim::entity::EntrantProfile;
use crate::sim::events::BattleEvent;
use crate::sim::tick::{Battle, BattleSnapshot, tick};
use crate::standings::Standings;

/// Tournament phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentPhase {
    /// Group stage heat running
    Preliminary,
    HeatRunning,
    /// A heat finished; waiting for `request_heat_advance`
    HeatTransition,
    FinalsRunning,
    Complete,
}

impl TournamentPhase {
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            TournamentPhase::Preliminary | TournamentPhase::HeatRunning | TournamentPhase::FinalsRunning
        )
    }
}

/// What kind of heat is (or was) being fought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatKind {
    Preliminary,
    Regular,
    /// The deciding heat: either the finals or the only heat of a small bracket
    Final,
}

/// A finished heat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatRecord {
    pub number: usize,
    pub kind: HeatKind,
    pub entrants: Vec<String>,
    pub survivors: Vec<String>,
    /// Whether a reset ability restarted this heat
    pub was_reset: bool,
}

/// What `request_heat_advance` will do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextStep {
    MainBracket,
    NextHeat,
    Finals,
}

/// Preliminary group standing in for its members
#[derive(Debug, Clone)]
struct Group {
    profile: EntrantProfile,
    members: Vec<String>,
}

/// Running tournament
pub struct TournamentHandle {
    config: TournamentConfig,
    ctx: SimulationContext,
    phase: TournamentPhase,
    profiles: BTreeMap<String, EntrantProfile>,
    groups: Vec<Group>,
    /// Planned regular heats of the main bracket
    heats: Vec<Vec<String>>,
    next_heat: usize,
    next_step: Option<NextStep>,
    battle: Option<Battle>,
    heat_kind: HeatKind,
    heat_entrants: Vec<String>,
    heat_number: usize,
    /// Battle labels eliminated in the current heat, in order
    heat_eliminated: Vec<String>,
    reset_used: bool,
    advanced: Vec<String>,
    elimination_order: Vec<String>,
    winner: Option<String>,
    history: Vec<HeatRecord>,
}

impl std::fmt::Debug for TournamentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TournamentHandle")
            .field("phase", &self.phase)
            .field("heat", &self.heat_number)
            .field("tick", &self.ctx.tick)
            .field("advanced", &self.advanced)
            .field("winner", &self.winner)
            .finish()
    }
}

/// Start a tournament with the config's seeded random source
pub fn start_tournament<S: AsRef<str>>(
    entrants: &[S],
    config: TournamentConfig,
) -> Result<TournamentHandle, TournamentError> {
    let rng = Pcg32::seed_from_u64(config.seed);
    TournamentHandle::with_rng(entrants, config, Box::new(rng))
}

impl TournamentHandle {
    /// Start a tournament drawing all randomness from `rng`
    pub fn with_rng<S: AsRef<str>>(
        entrants: &[S],
        config: TournamentConfig,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, TournamentError> {
        config.validate()?;
        let labels = dedupe_entrants(entrants);
        if labels.len() < 2 {
            return Err(TournamentError::NotEnoughEntrants(labels.len()));
        }

        let mut ctx = SimulationContext::with_rng(rng, config.heat_arena.to_arena());
        let profiles = labels
            .iter()
            .map(|label| (label.clone(), roll_profile(label, &config, &mut ctx)))
            .collect();

        log::info!(
            "Tournament starting with {} entrants (seed {})",
            labels.len(),
            config.seed
        );

        let mut handle = Self {
            config,
            ctx,
            phase: TournamentPhase::HeatRunning,
            profiles,
            groups: Vec::new(),
            heats: Vec::new(),
            next_heat: 0,
            next_step: None,
            battle: None,
            heat_kind: HeatKind::Regular,
            heat_entrants: Vec::new(),
            heat_number: 0,
            heat_eliminated: Vec::new(),
            reset_used: false,
            advanced: Vec::new(),
            elimination_order: Vec::new(),
            winner: None,
            history: Vec::new(),
        };

        let groups = split_into_groups(&labels, handle.config.preliminary_group_size);
        if labels.len() > handle.config.preliminary_threshold && groups.len() >= 2 {
            handle.start_preliminary(groups);
        } else {
            handle.start_main_bracket(labels);
        }
        Ok(handle)
    }

    fn start_preliminary(&mut self, groups: Vec<Vec<String>>) {
        log::info!("Preliminary stage: {} groups", groups.len());
        self.groups = groups
            .into_iter()
            .enumerate()
            .map(|(i, members)| {
                let label = format!("Group {}", i + 1);
                Group {
                    profile: roll_profile(&label, &self.config, &mut self.ctx),
                    members,
                }
            })
            .collect();
        let labels = self.groups.iter().map(|g| g.profile.label.clone()).collect();
        self.start_heat(labels, HeatKind::Preliminary);
    }

    fn start_main_bracket(&mut self, mut pool: Vec<String>) {
        if pool.len() <= self.config.single_heat_cap {
            self.start_heat(pool, HeatKind::Final);
            return;
        }
        pool.shuffle(&mut *self.ctx.rng);
        self.heats = split_into_heats(&pool, self.config.single_heat_cap);
        self.next_heat = 0;
        log::info!("Main bracket: {} heats", self.heats.len());
        self.start_next_heat();
    }

    fn start_next_heat(&mut self) {
        let labels = self.heats[self.next_heat].clone();
        self.next_heat += 1;
        self.start_heat(labels, HeatKind::Regular);
    }

    fn start_heat(&mut self, labels: Vec<String>, kind: HeatKind) {
        self.heat_number += 1;
        self.heat_kind = kind;
        self.heat_entrants = labels;
        self.reset_used = false;
        if self.heat_entrants.len() < 2 {
            // Nobody to fight: a lone entrant goes straight through
            log::info!("Heat {} has a single entrant, no battle", self.heat_number);
            self.battle = None;
            self.heat_eliminated.clear();
            let survivors = self.heat_entrants.clone();
            self.conclude_heat(survivors);
            return;
        }
        self.setup_heat();
    }

    /// Spawn the current heat from its entrant profiles (also used by resets)
    fn setup_heat(&mut self) {
        let (arena, target) = match self.heat_kind {
            HeatKind::Preliminary => (self.config.heat_arena.to_arena(), 1),
            HeatKind::Regular => (
                self.config.heat_arena.to_arena(),
                advancers_for(self.heat_entrants.len(), self.config.advancers_per_heat),
            ),
            HeatKind::Final => (self.finals_arena(), 1),
        };
        self.ctx.reset_for_heat(arena);

        let profiles: Vec<EntrantProfile> = self
            .heat_entrants
            .iter()
            .filter_map(|label| self.profile_for(label).cloned())
            .collect();
        debug_assert_eq!(profiles.len(), self.heat_entrants.len(), "missing entrant profile");

        self.battle = Some(Battle::new(&profiles, &mut self.ctx, target));
        self.heat_eliminated.clear();
        self.phase = match self.heat_kind {
            HeatKind::Preliminary => TournamentPhase::Preliminary,
            HeatKind::Regular => TournamentPhase::HeatRunning,
            HeatKind::Final if self.heats.is_empty() => TournamentPhase::HeatRunning,
            HeatKind::Final => TournamentPhase::FinalsRunning,
        };

        log::info!(
            "Heat {} ({:?}) starting with {} entrants, {} advance",
            self.heat_number,
            self.heat_kind,
            self.heat_entrants.len(),
            target
        );
        self.ctx.emit(BattleEvent::HeatStarted {
            heat: self.heat_number,
            entrants: self.heat_entrants.clone(),
            finals: self.phase == TournamentPhase::FinalsRunning,
        });
    }

    /// A single-heat bracket fights in the regular arena; real finals in the pit
    fn finals_arena(&self) -> crate::sim::arena::Arena {
        if self.heats.is_empty() {
            self.config.heat_arena.to_arena()
        } else {
            self.config.finals_arena.to_arena()
        }
    }

    fn profile_for(&self, label: &str) -> Option<&EntrantProfile> {
        match self.heat_kind {
            HeatKind::Preliminary => self
                .groups
                .iter()
                .map(|g| &g.profile)
                .find(|p| p.label == label),
            _ => self.profiles.get(label),
        }
    }

    /// Entrant labels a battle label stands for
    fn members_of(&self, battle_label: &str) -> Vec<String> {
        match self.heat_kind {
            HeatKind::Preliminary => self
                .groups
                .iter()
                .find(|g| g.profile.label == battle_label)
                .map(|g| g.members.clone())
                .unwrap_or_default(),
            _ => vec![battle_label.to_string()],
        }
    }

    /// Advance the running heat by one tick; a no-op outside running phases
    pub fn advance_one_tick(&mut self) {
        if !self.phase.is_running() {
            return;
        }
        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        let first_new = self.ctx.events.len();
        tick(battle, &mut self.ctx);

        for event in &self.ctx.events[first_new..] {
            if let BattleEvent::Eliminated {
                entity,
                summon: false,
                ..
            } = event
            {
                self.heat_eliminated.push(entity.clone());
            }
        }

        if let Some(trigger) = self.ctx.reset_requested.take() {
            if !self.reset_used {
                self.reset_heat(trigger);
                return;
            }
        }

        if battle.is_decided() {
            self.end_heat();
        }
    }

    /// Run one presentation frame: `ticks_per_frame` full ticks at the configured speed
    pub fn advance_frame(&mut self) -> u32 {
        let mut ran = 0;
        for _ in 0..self.config.speed.ticks_per_frame() {
            if !self.phase.is_running() {
                break;
            }
            self.advance_one_tick();
            ran += 1;
        }
        ran
    }

    fn reset_heat(&mut self, trigger: String) {
        log::info!("Heat {} reset by {}", self.heat_number, trigger);
        self.ctx.emit(BattleEvent::HeatReset {
            heat: self.heat_number,
            trigger,
        });
        self.setup_heat();
        self.reset_used = true;
    }

    fn end_heat(&mut self) {
        let Some(battle) = self.battle.take() else {
            return;
        };
        let mut survivors = battle.survivors();
        if survivors.is_empty() {
            // Everyone fell on the same tick: the last one out survives
            if let Some(last) = self.heat_eliminated.pop() {
                survivors.push(last);
            }
        }
        self.conclude_heat(survivors);
    }

    /// Commit the heat's eliminations and move to the next phase
    fn conclude_heat(&mut self, survivors: Vec<String>) {
        let eliminated = std::mem::take(&mut self.heat_eliminated);
        for label in &eliminated {
            let members = self.members_of(label);
            self.elimination_order.extend(members);
        }

        log::info!("Heat {} ended, survivors: {:?}", self.heat_number, survivors);
        self.ctx.emit(BattleEvent::HeatEnded {
            heat: self.heat_number,
            survivors: survivors.clone(),
        });
        self.history.push(HeatRecord {
            number: self.heat_number,
            kind: self.heat_kind,
            entrants: self.heat_entrants.clone(),
            survivors: survivors.clone(),
            was_reset: self.reset_used,
        });

        match self.heat_kind {
            HeatKind::Preliminary => {
                let group = survivors.first().cloned().unwrap_or_default();
                let members = self.members_of(&group);
                log::info!("{} wins the preliminary: {:?}", group, members);
                self.ctx.emit(BattleEvent::PreliminaryDecided { group, members });
                self.next_step = Some(NextStep::MainBracket);
                self.phase = TournamentPhase::HeatTransition;
            }
            HeatKind::Regular => {
                self.advanced.extend(survivors);
                self.next_step = Some(if self.next_heat < self.heats.len() {
                    NextStep::NextHeat
                } else {
                    NextStep::Finals
                });
                self.phase = TournamentPhase::HeatTransition;
            }
            HeatKind::Final => {
                let winner = survivors.first().cloned().unwrap_or_default();
                // Anyone else still standing places right behind the winner
                self.elimination_order
                    .extend(survivors.iter().skip(1).rev().cloned());
                log::info!("{} wins the tournament", winner);
                self.ctx.emit(BattleEvent::TournamentEnded {
                    winner: winner.clone(),
                });
                self.winner = Some(winner);
                self.phase = TournamentPhase::Complete;
            }
        }
    }

    /// Leave the transition pause and start whatever comes next
    pub fn request_heat_advance(&mut self) -> Result<(), TournamentError> {
        if self.phase != TournamentPhase::HeatTransition {
            return Err(TournamentError::NotAwaitingAdvance(self.phase));
        }
        match self.next_step.take() {
            Some(NextStep::MainBracket) => {
                let pool = self
                    .history
                    .last()
                    .and_then(|h| h.survivors.first())
                    .map(|group| self.members_of(group))
                    .unwrap_or_default();
                self.groups.clear();
                self.heat_kind = HeatKind::Regular;
                self.start_main_bracket(pool);
            }
            Some(NextStep::NextHeat) => self.start_next_heat(),
            Some(NextStep::Finals) => {
                let finalists = self.advanced.clone();
                self.start_heat(finalists, HeatKind::Final);
            }
            None => return Err(TournamentError::NotAwaitingAdvance(self.phase)),
        }
        Ok(())
    }

    /// Drive the whole tournament to the end, approving every transition
    pub fn run_to_completion(&mut self) -> Result<Standings, TournamentError> {
        loop {
            match self.phase {
                TournamentPhase::Complete => break,
                TournamentPhase::HeatTransition => self.request_heat_advance()?,
                _ => self.advance_one_tick(),
            }
        }
        Ok(self.standings())
    }

    pub fn phase(&self) -> TournamentPhase {
        self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.ctx.tick
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Current heat's entities and hazards (None between heats)
    pub fn snapshots(&self) -> Option<BattleSnapshot> {
        self.battle.as_ref().map(|b| b.snapshot(&self.ctx))
    }

    pub fn battle(&self) -> Option<&Battle> {
        self.battle.as_ref()
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.ctx.events
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.ctx.events)
    }

    /// Heat winners collected so far (the finals pool once all heats ran)
    pub fn advanced(&self) -> &[String] {
        &self.advanced
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Eliminated entrants in order, including the heat in progress
    pub fn elimination_order(&self) -> Vec<String> {
        let mut order = self.elimination_order.clone();
        for label in &self.heat_eliminated {
            order.extend(self.members_of(label));
        }
        order
    }

    /// Winner followed by everyone else, last eliminated first
    pub fn ranking(&self) -> Vec<String> {
        self.standings()
            .entries
            .into_iter()
            .map(|e| e.label)
            .collect()
    }

    pub fn standings(&self) -> Standings {
        Standings::new(self.winner.as_deref(), &self.elimination_order())
    }

    /// Finished heats, oldest first
    pub fn heats(&self) -> &[HeatRecord] {
        &self.history
    }

    /// Planned regular heats of the main bracket
    pub fn bracket(&self) -> &[Vec<String>] {
        &self.heats
    }

    pub fn profile(&self, label: &str) -> Option<&EntrantProfile> {
        self.profiles.get(label)
    }
}

/// Stats and ability for one entrant, rolled once for the whole tournament
fn roll_profile(label: &str, config: &TournamentConfig, ctx: &mut SimulationContext) -> EntrantProfile {
    let ability = match config.ability_override(label) {
        Some(forced) => forced,
        None if ctx.roll(config.ability_chance) => {
            let pick = ctx.rng.random_range(0..AbilityKind::ALL.len());
            Some(AbilityKind::ALL[pick])
        }
        None => None,
    };
    EntrantProfile::roll(label, ability, &mut *ctx.rng)
}
