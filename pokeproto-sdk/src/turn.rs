//! Turn state machine.
//!
//! A turn is the atomic five-step exchange
//! ATTACK_ANNOUNCE → DEFENSE_ANNOUNCE → CALCULATION_REPORT (both ways) →
//! CALCULATION_CONFIRM. Both peers run the damage calculation independently
//! with identical inputs and compare results; a turn only completes once a
//! confirm has been both sent and received, which keeps the flow symmetric
//! regardless of datagram reordering.
//!
//! The machine never touches the transport. Every handler returns a list of
//! [`TurnAction`]s (frames to send, events to emit) that the session
//! interprets; that keeps the layering strict and the machine testable
//! without sockets.

use tracing::{debug, warn};

use crate::battle::{BattleState, MoveCategory, MoveInfo, Phase, Role};
use crate::calc::{self, DamageOutcome, Mulberry32};
use crate::error::ProtocolError;
use crate::event::Event;
use crate::wire::{Payload, TurnReport};

/// Where the machine is inside the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    /// No turn in flight (battle phase WAITING_FOR_MOVE).
    Idle,
    /// We announced an attack and wait for DEFENSE_ANNOUNCE.
    AwaitingDefense,
    /// Our report is out; waiting for the opponent's.
    AwaitingReport,
    /// Reports compared; waiting for the closing confirm.
    AwaitingConfirm,
}

/// Context held while a turn is in flight.
#[derive(Debug, Clone)]
struct PendingTurn {
    attacker_is_local: bool,
    mv: MoveInfo,
    local_result: Option<DamageOutcome>,
    /// Opponent report that arrived before we computed our own
    /// (datagram reordering).
    early_report: Option<TurnReport>,
    confirm_sent: bool,
    confirm_received: bool,
    resolution_sent: bool,
    applied: bool,
}

impl PendingTurn {
    fn new(attacker_is_local: bool, mv: MoveInfo) -> Self {
        PendingTurn {
            attacker_is_local,
            mv,
            local_result: None,
            early_report: None,
            confirm_sent: false,
            confirm_received: false,
            resolution_sent: false,
            applied: false,
        }
    }
}

/// Output of a turn-machine step, interpreted by the session.
#[derive(Debug, Clone)]
pub enum TurnAction {
    /// Send this payload reliably to the opponent.
    Send(Payload),
    /// Emit this event on the display channel.
    Emit(Event),
}

/// The per-session turn machine.
#[derive(Debug)]
pub struct TurnMachine {
    role: Role,
    stage: TurnStage,
    pending: Option<PendingTurn>,
}

impl TurnMachine {
    pub fn new(role: Role) -> Self {
        TurnMachine {
            role,
            stage: TurnStage::Idle,
            pending: None,
        }
    }

    pub fn stage(&self) -> TurnStage {
        self.stage
    }

    /// The user picked a move. Announces the attack and opens the turn.
    ///
    /// The session has already validated that it is our turn and that the
    /// move exists; this only guards against a turn already in flight.
    pub fn begin_local_attack(&mut self, battle: &mut BattleState, mv: MoveInfo) -> Vec<TurnAction> {
        if self.stage != TurnStage::Idle || battle.phase != Phase::WaitingForMove {
            return vec![TurnAction::Emit(Event::ProtocolWarning {
                text: "a turn is already in progress".to_string(),
            })];
        }

        let move_name = mv.name.clone();
        self.pending = Some(PendingTurn::new(true, mv));
        self.stage = TurnStage::AwaitingDefense;
        battle.phase = Phase::ProcessingTurn;
        vec![TurnAction::Send(Payload::AttackAnnounce { move_name })]
    }

    /// Opponent announced an attack: acknowledge with DEFENSE_ANNOUNCE and
    /// immediately compute and report our result.
    pub fn on_attack_announce(
        &mut self,
        battle: &mut BattleState,
        mv: MoveInfo,
        rng: &mut Mulberry32,
    ) -> Vec<TurnAction> {
        if self.stage != TurnStage::Idle
            || battle.phase != Phase::WaitingForMove
            || self.role.attacks_on(battle.turn)
        {
            return drop_out_of_phase("ATTACK_ANNOUNCE", self.stage);
        }
        if battle.opponent.is_none() {
            return drop_out_of_phase("ATTACK_ANNOUNCE", self.stage);
        }

        self.pending = Some(PendingTurn::new(false, mv));
        battle.phase = Phase::ProcessingTurn;

        let mut actions = vec![TurnAction::Send(Payload::DefenseAnnounce)];
        actions.extend(self.compute_and_report(battle, rng));
        self.stage = TurnStage::AwaitingReport;

        // Their report may already be here if the announce was retransmitted
        // after the original reached us late. (Not expected, but harmless.)
        actions.extend(self.try_compare(battle));
        actions
    }

    /// Opponent confirmed they saw our attack: compute and report.
    pub fn on_defense_announce(
        &mut self,
        battle: &mut BattleState,
        rng: &mut Mulberry32,
    ) -> Vec<TurnAction> {
        if self.stage != TurnStage::AwaitingDefense {
            return drop_out_of_phase("DEFENSE_ANNOUNCE", self.stage);
        }

        let mut actions = self.compute_and_report(battle, rng);
        self.stage = TurnStage::AwaitingReport;
        actions.extend(self.try_compare(battle));
        actions
    }

    /// The opponent's CALCULATION_REPORT arrived.
    pub fn on_report(&mut self, battle: &mut BattleState, report: TurnReport) -> Vec<TurnAction> {
        match self.stage {
            TurnStage::AwaitingDefense => {
                // Reordered ahead of DEFENSE_ANNOUNCE; hold it until we have
                // computed our own result.
                if let Some(pending) = self.pending.as_mut() {
                    debug!("holding early CALCULATION_REPORT until defense arrives");
                    pending.early_report = Some(report);
                    return Vec::new();
                }
                drop_out_of_phase("CALCULATION_REPORT", self.stage)
            }
            TurnStage::AwaitingReport => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.early_report = Some(report);
                }
                self.try_compare(battle)
            }
            TurnStage::AwaitingConfirm => {
                // A late or retransmitted report after we already settled the
                // comparison (possibly by adopting resolution values).
                debug!("ignoring stale CALCULATION_REPORT");
                Vec::new()
            }
            TurnStage::Idle => drop_out_of_phase("CALCULATION_REPORT", self.stage),
        }
    }

    /// The opponent's CALCULATION_CONFIRM arrived.
    pub fn on_confirm(&mut self, battle: &mut BattleState) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_mut() else {
            // Retransmitted confirm for a turn we already completed.
            debug!("ignoring duplicate CALCULATION_CONFIRM");
            return Vec::new();
        };
        pending.confirm_received = true;

        let mut actions = Vec::new();
        if pending.resolution_sent && !pending.confirm_sent {
            // Their confirm means they adopted our values; settle our side
            // with our own result and close the exchange.
            actions.extend(self.apply_local_result(battle));
            if let Some(pending) = self.pending.as_mut() {
                pending.confirm_sent = true;
            }
            actions.push(TurnAction::Send(Payload::CalculationConfirm));
        }

        actions.extend(self.try_complete(battle));
        actions
    }

    /// The opponent observed a mismatch and proposes its values as the
    /// source of truth.
    pub fn on_resolution_request(
        &mut self,
        battle: &mut BattleState,
        request_damage: u32,
        request_defender_hp: u32,
    ) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_mut() else {
            return drop_out_of_phase("RESOLUTION_REQUEST", self.stage);
        };

        if pending.resolution_sent {
            // Both sides detected the mismatch. Host values win: the host
            // keeps its own request in flight, the joiner adopts.
            if self.role == Role::Host {
                warn!("simultaneous mismatch; keeping host values");
                return Vec::new();
            }
            warn!("simultaneous mismatch; adopting host values");
        }

        let mut actions = self.apply_adopted(battle, request_damage, request_defender_hp);
        if let Some(pending) = self.pending.as_mut() {
            pending.confirm_sent = true;
        }
        actions.push(TurnAction::Send(Payload::CalculationConfirm));
        self.stage = TurnStage::AwaitingConfirm;
        actions.extend(self.try_complete(battle));
        actions
    }

    /// GAME_OVER from the peer: unconditional terminal transition.
    pub fn on_game_over(
        &mut self,
        battle: &mut BattleState,
        winner: String,
        loser: String,
    ) -> Vec<TurnAction> {
        if battle.phase == Phase::GameOver {
            debug!("ignoring duplicate GAME_OVER");
            return Vec::new();
        }
        battle.phase = Phase::GameOver;
        self.stage = TurnStage::Idle;
        self.pending = None;
        vec![TurnAction::Emit(Event::GameOver { winner, loser })]
    }

    /// Run the calculator for the turn in flight and report the result.
    fn compute_and_report(
        &mut self,
        battle: &mut BattleState,
        rng: &mut Mulberry32,
    ) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_mut() else {
            return Vec::new();
        };
        let Some(opponent) = battle.opponent.as_mut() else {
            return Vec::new();
        };

        let (attacker, defender) = if pending.attacker_is_local {
            (&mut battle.local, opponent)
        } else {
            (opponent, &mut battle.local)
        };

        // Boost consumption is derived from state both peers share, so the
        // flag and the countdown stay in lockstep across the wire.
        let boost_active = pending.mv.category == MoveCategory::Special
            && attacker.boosts.sp_attack_uses > 0;
        if boost_active {
            attacker.boosts.sp_attack_uses -= 1;
        }

        let result = calc::resolve_attack(attacker, defender, &pending.mv, boost_active, rng);
        let report = TurnReport {
            attacker: attacker.pokemon_name.clone(),
            move_used: pending.mv.name.clone(),
            remaining_health: result.attacker_hp_after,
            damage_dealt: result.damage,
            defender_hp_remaining: result.defender_hp_after,
            status_message: result.status_text.clone(),
        };
        pending.local_result = Some(result);
        vec![TurnAction::Send(Payload::CalculationReport(report))]
    }

    /// Compare our result with the opponent's report, if both are in.
    fn try_compare(&mut self, battle: &mut BattleState) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_mut() else {
            return Vec::new();
        };
        let (Some(ours), Some(theirs)) = (&pending.local_result, &pending.early_report) else {
            return Vec::new();
        };

        if ours.damage == theirs.damage_dealt && ours.defender_hp_after == theirs.defender_hp_remaining
        {
            let mut actions = self.apply_local_result(battle);
            if let Some(pending) = self.pending.as_mut() {
                pending.confirm_sent = true;
            }
            actions.push(TurnAction::Send(Payload::CalculationConfirm));
            self.stage = TurnStage::AwaitingConfirm;
            actions.extend(self.try_complete(battle));
            actions
        } else {
            warn!(
                ours = ours.damage,
                theirs = theirs.damage_dealt,
                "calculation mismatch; requesting resolution"
            );
            let request = Payload::ResolutionRequest {
                attacker: if pending.attacker_is_local {
                    battle.local.pokemon_name.clone()
                } else {
                    theirs.attacker.clone()
                },
                move_used: pending.mv.name.clone(),
                damage_dealt: ours.damage,
                defender_hp_remaining: ours.defender_hp_after,
            };
            pending.resolution_sent = true;
            self.stage = TurnStage::AwaitingConfirm;
            vec![TurnAction::Send(request)]
        }
    }

    /// Write our locally computed result into the battle state.
    fn apply_local_result(&mut self, battle: &mut BattleState) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_mut() else {
            return Vec::new();
        };
        if pending.applied {
            return Vec::new();
        }
        let Some(result) = pending.local_result.clone() else {
            return Vec::new();
        };
        let Some(opponent) = battle.opponent.as_mut() else {
            return Vec::new();
        };

        let (attacker, defender) = if pending.attacker_is_local {
            (&mut battle.local, opponent)
        } else {
            (opponent, &mut battle.local)
        };
        attacker.current_hp = result.attacker_hp_after;
        defender.current_hp = result.defender_hp_after;
        pending.applied = true;

        vec![
            TurnAction::Emit(Event::StatusMessage {
                text: result.status_text,
            }),
            TurnAction::Emit(Event::HpUpdate {
                pokemon_name: defender.pokemon_name.clone(),
                hp: defender.current_hp,
                max_hp: defender.base.hp,
            }),
        ]
    }

    /// Overwrite the defender's HP with the values from a
    /// RESOLUTION_REQUEST.
    fn apply_adopted(
        &mut self,
        battle: &mut BattleState,
        damage: u32,
        defender_hp: u32,
    ) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_mut() else {
            return Vec::new();
        };

        let attacker_name = if pending.attacker_is_local {
            battle.local.pokemon_name.clone()
        } else {
            match battle.opponent.as_ref() {
                Some(opponent) => opponent.pokemon_name.clone(),
                None => return Vec::new(),
            }
        };
        let text = format!(
            "{attacker_name} used {}! It dealt {damage} damage.",
            pending.mv.name
        );

        let defender = if pending.attacker_is_local {
            match battle.opponent.as_mut() {
                Some(opponent) => opponent,
                None => return Vec::new(),
            }
        } else {
            &mut battle.local
        };
        defender.current_hp = defender_hp;
        pending.applied = true;

        vec![
            TurnAction::Emit(Event::StatusMessage { text }),
            TurnAction::Emit(Event::HpUpdate {
                pokemon_name: defender.pokemon_name.clone(),
                hp: defender.current_hp,
                max_hp: defender.base.hp,
            }),
        ]
    }

    /// Close the turn once a confirm has been both sent and received.
    fn try_complete(&mut self, battle: &mut BattleState) -> Vec<TurnAction> {
        let Some(pending) = self.pending.as_ref() else {
            return Vec::new();
        };
        if !(pending.confirm_sent && pending.confirm_received) {
            return Vec::new();
        }

        let attacker_is_local = pending.attacker_is_local;
        let (attacker_name, defender_name, defender_fainted) = {
            let Some(opponent) = battle.opponent.as_ref() else {
                return Vec::new();
            };
            let (attacker, defender) = if attacker_is_local {
                (&battle.local, opponent)
            } else {
                (opponent, &battle.local)
            };
            (
                attacker.pokemon_name.clone(),
                defender.pokemon_name.clone(),
                defender.is_fainted(),
            )
        };

        self.pending = None;
        self.stage = TurnStage::Idle;

        if defender_fainted {
            battle.phase = Phase::GameOver;
            let mut actions = Vec::new();
            if attacker_is_local {
                // The loser's opponent announces the result.
                actions.push(TurnAction::Send(Payload::GameOver {
                    winner: attacker_name.clone(),
                    loser: defender_name.clone(),
                }));
            }
            actions.push(TurnAction::Emit(Event::GameOver {
                winner: attacker_name,
                loser: defender_name,
            }));
            return actions;
        }

        battle.turn += 1;
        battle.phase = Phase::WaitingForMove;
        let turn = battle.turn;
        if self.role.attacks_on(turn) {
            vec![TurnAction::Emit(Event::YourTurn { turn })]
        } else {
            vec![TurnAction::Emit(Event::OpponentTurn { turn })]
        }
    }
}

fn drop_out_of_phase(message_type: &str, stage: TurnStage) -> Vec<TurnAction> {
    let err = ProtocolError::OutOfPhase {
        message_type: message_type.to_string(),
        state: format!("{stage:?}"),
    };
    warn!("dropping: {err}");
    vec![TurnAction::Emit(Event::ProtocolWarning {
        text: err.to_string(),
    })]
}
