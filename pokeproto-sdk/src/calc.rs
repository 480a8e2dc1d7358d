//! Deterministic battle calculator.
//!
//! Both peers evaluate every attack independently; the exchanged
//! CALCULATION_REPORTs are only meaningful because this module is
//! bit-identical on both sides. The PRNG advances exactly once per call to
//! [`resolve_attack`], so peers stay in lockstep as long as they resolve the
//! same turns in the same order.

use crate::battle::{Combatant, MoveCategory, MoveInfo};

/// Fixed combatant level used by the damage formula.
pub const LEVEL: u32 = 50;

/// Same-type attack bonus multiplier.
const STAB: f64 = 1.5;

/// Attacking-stat multiplier while a boost is consumed.
const BOOST: f64 = 1.5;

/// Mulberry32: a 32-bit-state PRNG.
///
/// All intermediate multiplications are modulo 2^32; [`Mulberry32::next_f64`]
/// yields a float in `[0, 1)` with the low 32 bits of the final mix as the
/// numerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Mulberry32 { state: seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / 4_294_967_296.0
    }
}

/// What one resolved attack did, as computed locally.
///
/// This is the tuple compared field-by-field against the opponent's
/// CALCULATION_REPORT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageOutcome {
    pub damage: u32,
    pub defender_hp_after: u32,
    pub attacker_hp_after: u32,
    pub status_text: String,
}

/// Resolve one attack. Pure in everything except the single PRNG advance.
///
/// `boost_active` is decided by the caller (the turn machine) from shared
/// state, never from local-only input, so both peers pass the same flag.
pub fn resolve_attack(
    attacker: &Combatant,
    defender: &Combatant,
    mv: &MoveInfo,
    boost_active: bool,
    rng: &mut Mulberry32,
) -> DamageOutcome {
    // One advance per call, even for moves that deal no damage, so both
    // peers consume the stream at the same rate.
    let roll = 0.85 + rng.next_f64() * 0.15;

    let (attack_stat, defense_stat) = match mv.category {
        MoveCategory::Physical => (attacker.base.attack, defender.base.defense),
        MoveCategory::Special => (attacker.base.sp_attack, defender.base.sp_defense),
        MoveCategory::Status => {
            return DamageOutcome {
                damage: 0,
                defender_hp_after: defender.current_hp,
                attacker_hp_after: attacker.current_hp,
                status_text: format!(
                    "{} used {}! But nothing happened!",
                    attacker.pokemon_name, mv.name
                ),
            };
        }
    };

    let mut attack = f64::from(attack_stat);
    if boost_active {
        attack *= BOOST;
    }
    let defense = if defense_stat == 0 {
        1.0
    } else {
        f64::from(defense_stat)
    };

    let base = ((f64::from(2 * LEVEL / 5 + 2) * f64::from(mv.power) * attack / defense) / 50.0
        + 2.0)
        .floor();

    let mut modifiers = 1.0;
    if attacker.base.types.iter().any(|t| *t == mv.move_type) {
        modifiers *= STAB;
    }
    let type_multiplier = defender
        .base
        .type_multipliers
        .get(&mv.move_type)
        .copied()
        .unwrap_or(1.0);
    modifiers *= type_multiplier;
    modifiers *= roll;

    let damage = if type_multiplier == 0.0 {
        0
    } else {
        ((base * modifiers).floor() as u32).max(1)
    };

    let defender_hp_after = defender.current_hp.saturating_sub(damage);
    let status_text = status_text(attacker, defender, mv, damage, type_multiplier);

    DamageOutcome {
        damage,
        defender_hp_after,
        attacker_hp_after: attacker.current_hp,
        status_text,
    }
}

fn status_text(
    attacker: &Combatant,
    defender: &Combatant,
    mv: &MoveInfo,
    damage: u32,
    type_multiplier: f64,
) -> String {
    let mut text = format!(
        "{} used {}! It dealt {damage} damage.",
        attacker.pokemon_name, mv.name
    );
    if type_multiplier == 0.0 {
        text = format!(
            "{} used {}! It doesn't affect {}...",
            attacker.pokemon_name, mv.name, defender.pokemon_name
        );
    } else if type_multiplier > 1.0 {
        text.push_str(" It's super effective!");
    } else if type_multiplier < 1.0 {
        text.push_str(" It's not very effective...");
    }
    text
}
