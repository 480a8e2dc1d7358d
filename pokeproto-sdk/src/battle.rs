//! Battle data model: roles, phases, stats, combatants, and the repository
//! seam through which static Pokemon data enters the core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which side of the session this peer owns. Immutable for the session.
///
/// The role decides who issues the PRNG seed (Host) and who attacks on
/// which turn: Host on odd-numbered turns, Joiner on even-numbered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Joiner,
    Spectator,
}

impl Role {
    /// Whether this role is the attacker of turn `turn`.
    pub fn attacks_on(self, turn: u32) -> bool {
        match self {
            Role::Host => turn % 2 == 1,
            Role::Joiner => turn % 2 == 0,
            Role::Spectator => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => f.write_str("HOST"),
            Role::Joiner => f.write_str("JOINER"),
            Role::Spectator => f.write_str("SPECTATOR"),
        }
    }
}

/// Battle lifecycle phase, invariant-equal on both peers between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SetupExchanging,
    WaitingForMove,
    ProcessingTurn,
    GameOver,
}

/// Immutable base stats for one Pokemon, supplied by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    /// The Pokemon's own types, used for the same-type attack bonus.
    pub types: Vec<String>,
    /// Effectiveness of each attacking type against this Pokemon.
    /// Missing entries mean 1.0.
    pub type_multipliers: HashMap<String, f64>,
}

/// Damage classification of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCategory {
    Physical,
    Special,
    /// Non-damaging.
    Status,
}

/// Static data for one move, supplied by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    pub name: String,
    pub move_type: String,
    pub power: u32,
    pub category: MoveCategory,
}

/// Ceiling on declared boost uses per stat.
pub const MAX_BOOST_USES: u32 = 3;

/// Remaining boost budgets, declared in BATTLE_SETUP and counted down
/// identically on both peers. A peer's first `sp_attack_uses` special
/// attacks get a 1.5x attacking-stat multiplier; the defense counter is
/// exchanged for parity with the setup payload but never consumed by the
/// damage formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBoosts {
    pub sp_attack_uses: u32,
    pub sp_defense_uses: u32,
}

impl StatBoosts {
    /// Clamp declared budgets to [`MAX_BOOST_USES`].
    pub fn clamped(self) -> Self {
        StatBoosts {
            sp_attack_uses: self.sp_attack_uses.min(MAX_BOOST_USES),
            sp_defense_uses: self.sp_defense_uses.min(MAX_BOOST_USES),
        }
    }
}

/// One side's active Pokemon.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub pokemon_name: String,
    pub base: BaseStats,
    pub current_hp: u32,
    pub boosts: StatBoosts,
}

impl Combatant {
    pub fn new(pokemon_name: String, base: BaseStats) -> Self {
        let current_hp = base.hp;
        Combatant {
            pokemon_name,
            base,
            current_hp,
            boosts: StatBoosts::default(),
        }
    }

    pub fn with_boosts(mut self, boosts: StatBoosts) -> Self {
        self.boosts = boosts.clamped();
        self
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }
}

/// Per-peer battle state. After every completed turn both peers hold
/// equal copies (with `local` and `opponent` mirrored).
#[derive(Debug, Clone, PartialEq)]
pub struct BattleState {
    /// Current turn, starting at 1, incremented once per completed
    /// announce/defense/report/confirm cycle.
    pub turn: u32,
    pub phase: Phase,
    /// Session seed issued by the Host.
    pub seed: u32,
    pub local: Combatant,
    pub opponent: Option<Combatant>,
}

impl BattleState {
    pub fn new(seed: u32, local: Combatant) -> Self {
        BattleState {
            turn: 1,
            phase: Phase::SetupExchanging,
            seed,
            local,
            opponent: None,
        }
    }

    /// Install the opponent once their BATTLE_SETUP arrives.
    pub fn install_opponent(&mut self, opponent: Combatant) {
        self.opponent = Some(opponent);
        self.phase = Phase::WaitingForMove;
    }

    pub fn opponent(&self) -> Option<&Combatant> {
        self.opponent.as_ref()
    }
}

/// Lookup interface for static Pokemon data.
///
/// The surrounding application owns loading (spreadsheets, bundled tables);
/// the core only ever calls these two methods. A `None` surfaces to the
/// user as `UnknownPokemon`/`UnknownMove` and never reaches the wire.
pub trait PokemonStatsRepository: Send + Sync {
    fn pokemon(&self, name: &str) -> Option<BaseStats>;
    fn move_info(&self, name: &str) -> Option<MoveInfo>;
}
