//! UDP battle session.
//!
//! This is the main entry point for SDK consumers. [`host`], [`join`], and
//! [`spectate`] bind the socket, validate the local Pokemon against the
//! stats repository, and spawn the protocol task. The caller gets back a
//! [`SessionHandle`] for commands and an `mpsc::Receiver<Event>` for
//! display updates.
//!
//! The protocol task is the only owner of all mutable session state: the
//! socket, the retransmission outbox, the battle state, the PRNG, and both
//! state machines. It suspends only on the next datagram, the next command,
//! or the next retransmission deadline, so no locking is needed anywhere.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::battle::{
    BaseStats, BattleState, Combatant, Phase, PokemonStatsRepository, Role, StatBoosts,
};
use crate::calc::Mulberry32;
use crate::error::ProtocolError;
use crate::event::Event;
use crate::reliability::{ReliableOutbox, RetryAction};
use crate::turn::{TurnAction, TurnMachine};
use crate::wire::{self, ChatBody, CommunicationMode, Frame, Payload};

/// Configuration for one battle session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Display name for this peer.
    pub peer_id: String,
    /// The Pokemon this peer fields. Ignored for spectators.
    pub pokemon: String,
    /// Declared boost budgets, exchanged in BATTLE_SETUP and counted down
    /// on both peers.
    pub stat_boosts: StatBoosts,
    /// Local bind address. Hosts usually pin a port; joiners and
    /// spectators can bind port 0.
    pub bind_addr: SocketAddr,
    /// Remote address: the opponent for a joiner, the host for a
    /// spectator. Hosts learn the peer from the inbound handshake.
    pub peer_addr: Option<SocketAddr>,
    /// Also emit [`Event::RawFrame`] for every inbound datagram.
    pub verbose: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            peer_id: "player".to_string(),
            pokemon: "Pikachu".to_string(),
            stat_boosts: StatBoosts::default(),
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            peer_addr: None,
            verbose: false,
        }
    }
}

/// Commands the consumer can send to the session.
#[derive(Debug)]
pub enum Command {
    Attack { move_name: String },
    Chat { text: String },
    Sticker { data: Vec<u8> },
    Disconnect,
}

/// A handle to a running battle session.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Pick a move for this turn.
    pub async fn attack(&self, move_name: &str) -> Result<()> {
        self.cmd_tx
            .send(Command::Attack {
                move_name: move_name.to_string(),
            })
            .await?;
        Ok(())
    }

    /// Send a text chat line. Works in any state.
    pub async fn chat(&self, text: &str) -> Result<()> {
        self.cmd_tx
            .send(Command::Chat {
                text: text.to_string(),
            })
            .await?;
        Ok(())
    }

    /// Send a sticker (raw image bytes; base64 happens at the codec).
    pub async fn sticker(&self, data: Vec<u8>) -> Result<()> {
        self.cmd_tx.send(Command::Sticker { data }).await?;
        Ok(())
    }

    /// Tell the peer goodbye and shut the session down.
    pub async fn disconnect(&self) -> Result<()> {
        self.cmd_tx.send(Command::Disconnect).await?;
        Ok(())
    }
}

/// Host a battle: bind, then wait for a joiner's handshake.
pub async fn host(
    config: SessionConfig,
    repo: Arc<dyn PokemonStatsRepository>,
) -> Result<(SessionHandle, mpsc::Receiver<Event>)> {
    spawn_session(config, repo, Role::Host).await
}

/// Join a battle hosted at `config.peer_addr`.
pub async fn join(
    config: SessionConfig,
    repo: Arc<dyn PokemonStatsRepository>,
) -> Result<(SessionHandle, mpsc::Receiver<Event>)> {
    if config.peer_addr.is_none() {
        anyhow::bail!("join requires peer_addr");
    }
    spawn_session(config, repo, Role::Joiner).await
}

/// Watch a battle hosted at `config.peer_addr` without fighting.
pub async fn spectate(
    config: SessionConfig,
    repo: Arc<dyn PokemonStatsRepository>,
) -> Result<(SessionHandle, mpsc::Receiver<Event>)> {
    if config.peer_addr.is_none() {
        anyhow::bail!("spectate requires peer_addr");
    }
    spawn_session(config, repo, Role::Spectator).await
}

async fn spawn_session(
    config: SessionConfig,
    repo: Arc<dyn PokemonStatsRepository>,
    role: Role,
) -> Result<(SessionHandle, mpsc::Receiver<Event>)> {
    // Resolve the local Pokemon up front so a typo fails here, not
    // mid-handshake.
    let local_base = if role == Role::Spectator {
        None
    } else {
        Some(
            repo.pokemon(&config.pokemon)
                .ok_or_else(|| ProtocolError::UnknownPokemon(config.pokemon.clone()))?,
        )
    };

    let socket = UdpSocket::bind(config.bind_addr).await?;
    let local_addr = socket.local_addr()?;
    info!(%local_addr, %role, "session socket bound");

    let (event_tx, event_rx) = mpsc::channel(4096);
    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    let handle = SessionHandle {
        cmd_tx: cmd_tx.clone(),
    };

    let _ = event_tx.send(Event::Connected { local_addr }).await;

    let session = Session {
        peer: config.peer_addr,
        config,
        role,
        repo,
        socket,
        local_base,
        spectators: Vec::new(),
        state: ConnState::Disconnected,
        outbox: ReliableOutbox::new(),
        rng: None,
        battle: None,
        turn: TurnMachine::new(role),
        setup_sent: false,
        early_announce: None,
        event_tx: event_tx.clone(),
        cmd_rx,
    };

    tokio::spawn(async move {
        if let Err(e) = session.run().await {
            let _ = event_tx
                .send(Event::Disconnected {
                    reason: e.to_string(),
                })
                .await;
        }
    });

    Ok((handle, event_rx))
}

/// Connection-level state; battle-level phase lives in [`BattleState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    /// Host waiting for a handshake; joiner before sending one.
    Disconnected,
    /// Joiner sent HANDSHAKE_REQUEST, awaiting the response.
    InitSent,
    /// Seed agreed; battle state exists.
    Active,
    /// Read-only observer of someone else's battle.
    Spectating,
    /// Terminal.
    Closed,
}

struct Session {
    config: SessionConfig,
    role: Role,
    repo: Arc<dyn PokemonStatsRepository>,
    socket: UdpSocket,
    /// The opposing peer (or the host, when spectating).
    peer: Option<SocketAddr>,
    local_base: Option<BaseStats>,
    spectators: Vec<(String, SocketAddr)>,
    state: ConnState,
    outbox: ReliableOutbox,
    rng: Option<Mulberry32>,
    battle: Option<BattleState>,
    turn: TurnMachine,
    setup_sent: bool,
    /// An ATTACK_ANNOUNCE that raced ahead of the opponent's BATTLE_SETUP.
    /// It was already ACKed, so it must be replayed, not dropped.
    early_announce: Option<String>,
    event_tx: mpsc::Sender<Event>,
    cmd_rx: mpsc::Receiver<Command>,
}

impl Session {
    async fn run(mut self) -> Result<()> {
        match self.role {
            Role::Host => {
                info!("waiting for a joiner");
            }
            Role::Joiner => {
                let Some(peer) = self.peer else {
                    anyhow::bail!("joiner has no peer address");
                };
                self.send_reliable(
                    Payload::HandshakeRequest {
                        peer_id: self.config.peer_id.clone(),
                        seed: None,
                        team_preview: vec![self.config.pokemon.clone()],
                    },
                    peer,
                )
                .await;
                self.state = ConnState::InitSent;
            }
            Role::Spectator => {
                let Some(peer) = self.peer else {
                    anyhow::bail!("spectator has no peer address");
                };
                self.send_reliable(
                    Payload::SpectatorRequest {
                        peer_id: self.config.peer_id.clone(),
                    },
                    peer,
                )
                .await;
                self.state = ConnState::Spectating;
            }
        }

        let mut buf = vec![0u8; 2048];
        while self.state != ConnState::Closed {
            let deadline = self.outbox.next_deadline();
            eprintln!("DIAG loop: deadline={:?} now={:?}", deadline, Instant::now());
            tokio::select! {
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    eprintln!("DIAG branch sleep_until fired");
                    self.handle_retransmissions().await;
                }
            }
        }
        Ok(())
    }

    // ── Inbound path ──

    async fn handle_datagram(&mut self, bytes: &[u8], src: SocketAddr) {
        if self.config.verbose {
            let _ = self
                .event_tx
                .send(Event::RawFrame(String::from_utf8_lossy(bytes).into_owned()))
                .await;
        }

        let header = match wire::parse_header(bytes) {
            Ok(header) => header,
            Err(e) => {
                warn!(%src, "dropping unroutable datagram: {e}");
                return;
            }
        };

        // Piggybacked or bare, the ack is processed before the payload.
        if let Some(ack) = header.ack {
            if self.outbox.acknowledge(ack) {
                debug!(ack, "cleared from retransmission buffer");
            } else {
                debug!(ack, "duplicate ACK ignored");
            }
        }
        if header.message_type == "ACK" {
            return;
        }

        // Every reliable frame is ACKed immediately, duplicates included:
        // the retransmission may exist only because our earlier ACK was
        // lost. The one exception is a handshake request we are about to
        // answer, whose ack rides on the HANDSHAKE_RESPONSE instead.
        if let Some(seq) = header.sequence {
            let answers_with_piggyback = header.message_type == "HANDSHAKE_REQUEST"
                && self.role == Role::Host
                && self.state == ConnState::Disconnected;
            if seq > 0 && !answers_with_piggyback {
                self.transmit(&wire::encode(&Frame::ack(seq)), src).await;
            }
        }

        let frame = match wire::decode(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%src, "dropping malformed frame: {e}");
                let _ = self
                    .event_tx
                    .send(Event::ProtocolWarning {
                        text: format!("dropped malformed frame: {e}"),
                    })
                    .await;
                return;
            }
        };
        self.dispatch(frame, src).await;
    }

    async fn dispatch(&mut self, frame: Frame, src: SocketAddr) {
        if self.state == ConnState::Spectating {
            self.dispatch_spectating(frame.payload).await;
            return;
        }

        match frame.payload {
            Payload::HandshakeRequest { peer_id, .. } => {
                self.on_handshake_request(frame.sequence, peer_id, src).await;
            }
            Payload::HandshakeResponse { seed, peer_id, .. } => {
                self.on_handshake_response(seed, peer_id).await;
            }
            Payload::SpectatorRequest { peer_id } => {
                info!(%src, %peer_id, "spectator registered");
                self.spectators.push((peer_id.clone(), src));
                let _ = self.event_tx.send(Event::SpectatorJoined { peer_id }).await;
            }
            Payload::BattleSetup {
                pokemon_name,
                stat_boosts,
                communication_mode,
            } => {
                self.on_battle_setup(pokemon_name, stat_boosts, communication_mode)
                    .await;
            }
            Payload::AttackAnnounce { move_name } => {
                self.on_attack_announce(move_name).await;
            }
            Payload::DefenseAnnounce => {
                let actions = match (self.battle.as_mut(), self.rng.as_mut()) {
                    (Some(battle), Some(rng)) => self.turn.on_defense_announce(battle, rng),
                    _ => {
                        self.warn_out_of_phase("DEFENSE_ANNOUNCE").await;
                        return;
                    }
                };
                self.process_turn_actions(actions).await;
            }
            Payload::CalculationReport(report) => {
                let actions = match self.battle.as_mut() {
                    Some(battle) => self.turn.on_report(battle, report),
                    None => {
                        self.warn_out_of_phase("CALCULATION_REPORT").await;
                        return;
                    }
                };
                self.process_turn_actions(actions).await;
            }
            Payload::CalculationConfirm => {
                let actions = match self.battle.as_mut() {
                    Some(battle) => self.turn.on_confirm(battle),
                    None => {
                        self.warn_out_of_phase("CALCULATION_CONFIRM").await;
                        return;
                    }
                };
                self.process_turn_actions(actions).await;
            }
            Payload::ResolutionRequest {
                damage_dealt,
                defender_hp_remaining,
                ..
            } => {
                let actions = match self.battle.as_mut() {
                    Some(battle) => {
                        self.turn
                            .on_resolution_request(battle, damage_dealt, defender_hp_remaining)
                    }
                    None => {
                        self.warn_out_of_phase("RESOLUTION_REQUEST").await;
                        return;
                    }
                };
                self.process_turn_actions(actions).await;
            }
            Payload::GameOver { winner, loser } => {
                let actions = match self.battle.as_mut() {
                    Some(battle) => self.turn.on_game_over(battle, winner, loser),
                    None => {
                        self.warn_out_of_phase("GAME_OVER").await;
                        return;
                    }
                };
                self.process_turn_actions(actions).await;
            }
            Payload::Chat { sender_name, body } => {
                let _ = self
                    .event_tx
                    .send(Event::Chat {
                        from: sender_name,
                        body,
                    })
                    .await;
            }
            Payload::Disconnect => {
                info!(%src, "peer disconnected");
                self.close("peer disconnected", false).await;
            }
            Payload::Ack => {
                // Routed before decode; nothing to do here.
            }
        }
    }

    /// Spectators are read-only: battle traffic becomes display events.
    async fn dispatch_spectating(&mut self, payload: Payload) {
        match payload {
            Payload::CalculationReport(report) => {
                let _ = self
                    .event_tx
                    .send(Event::StatusMessage {
                        text: report.status_message,
                    })
                    .await;
            }
            Payload::Chat { sender_name, body } => {
                let _ = self
                    .event_tx
                    .send(Event::Chat {
                        from: sender_name,
                        body,
                    })
                    .await;
            }
            Payload::GameOver { winner, loser } => {
                let _ = self.event_tx.send(Event::GameOver { winner, loser }).await;
            }
            Payload::Disconnect => {
                self.close("host disconnected", false).await;
            }
            other => {
                debug!("spectator ignoring {}", other.message_type());
            }
        }
    }

    async fn on_handshake_request(
        &mut self,
        request_seq: Option<u32>,
        peer_id: String,
        src: SocketAddr,
    ) {
        if self.role != Role::Host || self.state != ConnState::Disconnected {
            self.warn_out_of_phase("HANDSHAKE_REQUEST").await;
            return;
        }
        let Some(base) = self.local_base.clone() else {
            return;
        };

        info!(%src, %peer_id, "handshake from joiner");
        self.peer = Some(src);

        let seed: u32 = rand::thread_rng().r#gen();
        self.rng = Some(Mulberry32::new(seed));
        let local = Combatant::new(self.config.pokemon.clone(), base)
            .with_boosts(self.config.stat_boosts);
        self.battle = Some(BattleState::new(seed, local));
        self.state = ConnState::Active;

        self.send_reliable_with_ack(
            Payload::HandshakeResponse {
                seed,
                peer_id: self.config.peer_id.clone(),
                team_preview: vec![self.config.pokemon.clone()],
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
            request_seq,
            src,
        )
        .await;
        let _ = self
            .event_tx
            .send(Event::HandshakeComplete {
                role: self.role,
                seed,
            })
            .await;

        // Both sides must eventually send BATTLE_SETUP; sending ours right
        // away keeps the exchange symmetric.
        self.send_battle_setup(src).await;
    }

    async fn on_handshake_response(&mut self, seed: u32, peer_id: String) {
        if self.role != Role::Joiner || self.state != ConnState::InitSent {
            self.warn_out_of_phase("HANDSHAKE_RESPONSE").await;
            return;
        }
        let Some(base) = self.local_base.clone() else {
            return;
        };
        let Some(peer) = self.peer else {
            return;
        };

        info!(%peer_id, seed, "handshake accepted");
        self.rng = Some(Mulberry32::new(seed));
        let local = Combatant::new(self.config.pokemon.clone(), base)
            .with_boosts(self.config.stat_boosts);
        self.battle = Some(BattleState::new(seed, local));
        self.state = ConnState::Active;

        let _ = self
            .event_tx
            .send(Event::HandshakeComplete {
                role: self.role,
                seed,
            })
            .await;
        self.send_battle_setup(peer).await;
    }

    async fn send_battle_setup(&mut self, dst: SocketAddr) {
        if self.setup_sent {
            return;
        }
        self.setup_sent = true;
        self.send_reliable(
            Payload::BattleSetup {
                communication_mode: CommunicationMode::P2p,
                pokemon_name: self.config.pokemon.clone(),
                stat_boosts: self.config.stat_boosts.clamped(),
            },
            dst,
        )
        .await;
    }

    async fn on_battle_setup(
        &mut self,
        pokemon_name: String,
        stat_boosts: StatBoosts,
        communication_mode: CommunicationMode,
    ) {
        if self.state != ConnState::Active {
            self.warn_out_of_phase("BATTLE_SETUP").await;
            return;
        }
        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        if battle.opponent.is_some() {
            self.warn_out_of_phase("BATTLE_SETUP").await;
            return;
        }

        debug!(mode = communication_mode.as_str(), "opponent setup received");
        let Some(base) = self.repo.pokemon(&pokemon_name) else {
            // The repository is our only source of stats; without the
            // opponent's entry the battle cannot be simulated. Never goes
            // on the wire.
            warn!(%pokemon_name, "opponent pokemon not in repository");
            self.close(
                &ProtocolError::UnknownPokemon(pokemon_name).to_string(),
                false,
            )
            .await;
            return;
        };

        let opponent = Combatant::new(pokemon_name, base).with_boosts(stat_boosts);
        let opponent_name = opponent.pokemon_name.clone();
        let opponent_hp = opponent.current_hp;
        battle.install_opponent(opponent);
        let turn = battle.turn;

        // Host answered the handshake with its setup already; this covers
        // the joiner (and a host whose proactive send raced the request).
        if let Some(peer) = self.peer {
            self.send_battle_setup(peer).await;
        }

        let _ = self
            .event_tx
            .send(Event::SetupComplete {
                opponent_name,
                opponent_hp,
            })
            .await;
        let event = if self.role.attacks_on(turn) {
            Event::YourTurn { turn }
        } else {
            Event::OpponentTurn { turn }
        };
        let _ = self.event_tx.send(event).await;

        if let Some(move_name) = self.early_announce.take() {
            self.on_attack_announce(move_name).await;
        }
    }

    async fn on_attack_announce(&mut self, move_name: String) {
        // Already ACKed, so if it outran the opponent's BATTLE_SETUP it
        // will never be retransmitted; hold it and replay after setup.
        if self
            .battle
            .as_ref()
            .is_some_and(|b| b.phase == Phase::SetupExchanging)
        {
            debug!(%move_name, "holding early ATTACK_ANNOUNCE until setup completes");
            self.early_announce = Some(move_name);
            return;
        }

        let Some(mv) = self.repo.move_info(&move_name) else {
            warn!(%move_name, "opponent used a move not in the repository");
            let _ = self
                .event_tx
                .send(Event::ProtocolWarning {
                    text: ProtocolError::UnknownMove(move_name).to_string(),
                })
                .await;
            return;
        };
        let actions = match (self.battle.as_mut(), self.rng.as_mut()) {
            (Some(battle), Some(rng)) => self.turn.on_attack_announce(battle, mv, rng),
            _ => {
                self.warn_out_of_phase("ATTACK_ANNOUNCE").await;
                return;
            }
        };
        self.process_turn_actions(actions).await;
    }

    // ── Commands ──

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Attack { move_name } => self.on_attack_command(move_name).await,
            Command::Chat { text } => {
                self.send_chat(ChatBody::Text(text)).await;
            }
            Command::Sticker { data } => {
                self.send_chat(ChatBody::Sticker(data)).await;
            }
            Command::Disconnect => {
                self.close("local disconnect", true).await;
            }
        }
    }

    async fn on_attack_command(&mut self, move_name: String) {
        let ready = matches!(self.state, ConnState::Active)
            && self
                .battle
                .as_ref()
                .is_some_and(|b| b.phase == Phase::WaitingForMove);
        if !ready {
            self.warn_user("no battle is waiting for a move").await;
            return;
        }
        let its_our_turn = self
            .battle
            .as_ref()
            .is_some_and(|b| self.role.attacks_on(b.turn));
        if !its_our_turn {
            self.warn_user("it is not your turn").await;
            return;
        }
        let Some(mv) = self.repo.move_info(&move_name) else {
            self.warn_user(&ProtocolError::UnknownMove(move_name).to_string())
                .await;
            return;
        };

        let actions = match self.battle.as_mut() {
            Some(battle) => self.turn.begin_local_attack(battle, mv),
            None => return,
        };
        self.process_turn_actions(actions).await;
    }

    async fn send_chat(&mut self, body: ChatBody) {
        let Some(peer) = self.peer else {
            self.warn_user("no peer to chat with yet").await;
            return;
        };
        self.send_reliable(
            Payload::Chat {
                sender_name: self.config.peer_id.clone(),
                body,
            },
            peer,
        )
        .await;
    }

    // ── Outbound path ──

    async fn process_turn_actions(&mut self, actions: Vec<TurnAction>) {
        for action in actions {
            match action {
                TurnAction::Send(payload) => {
                    let Some(peer) = self.peer else {
                        continue;
                    };
                    self.send_reliable(payload, peer).await;
                }
                TurnAction::Emit(event) => {
                    let _ = self.event_tx.send(event).await;
                }
            }
        }
    }

    async fn send_reliable(&mut self, payload: Payload, dst: SocketAddr) {
        self.send_reliable_with_ack(payload, None, dst).await;
    }

    /// Allocate a sequence number, transmit once, and buffer for
    /// retransmission. `ack` piggybacks an acknowledgment on the frame.
    async fn send_reliable_with_ack(
        &mut self,
        payload: Payload,
        ack: Option<u32>,
        dst: SocketAddr,
    ) {
        let seq = self.outbox.allocate_seq();
        let frame = Frame {
            sequence: Some(seq),
            ack,
            payload,
        };
        let bytes = wire::encode(&frame);
        debug!(seq, msg = frame.payload.message_type(), %dst, "sending");
        self.transmit(&bytes, dst).await;
        self.outbox.register(seq, bytes, dst, Instant::now());
    }

    /// Fire-and-forget datagram send. Loss is the reliability layer's
    /// problem; a syscall failure is logged and otherwise ignored.
    async fn transmit(&self, bytes: &[u8], dst: SocketAddr) {
        if let Err(e) = self.socket.send_to(bytes, dst).await {
            warn!(%dst, "send failed: {e}");
        }
    }

    async fn handle_retransmissions(&mut self) {
        eprintln!("DIAG handle_retransmissions enter");
        for action in self.outbox.fire_expired(Instant::now()) {
            eprintln!("DIAG action={:?}", action);
            match action {
                RetryAction::Resend { seq, bytes, dst } => {
                    debug!(seq, "retransmitting");
                    self.transmit(&bytes, dst).await;
                    eprintln!("DIAG resent seq={}", seq);
                }
                RetryAction::Exhausted { seq } => {
                    warn!(seq, "peer unreachable; giving up");
                    let reason = ProtocolError::ReliabilityExhausted(seq).to_string();
                    self.close(&reason, false).await;
                }
            }
        }
        eprintln!("DIAG handle_retransmissions exit");
    }

    // ── Teardown ──

    async fn close(&mut self, reason: &str, notify_peer: bool) {
        if self.state == ConnState::Closed {
            return;
        }
        if notify_peer {
            // A goodbye is sent once and never retransmitted; there is no
            // session left to service the retry timer. Spectators get the
            // same notice so they stop watching a dead battle.
            let mut recipients: Vec<SocketAddr> =
                self.spectators.iter().map(|(_, addr)| *addr).collect();
            if let Some(peer) = self.peer {
                recipients.insert(0, peer);
            }
            for dst in recipients {
                let seq = self.outbox.allocate_seq();
                let bytes = wire::encode(&Frame::reliable(seq, Payload::Disconnect));
                self.transmit(&bytes, dst).await;
            }
        }
        self.outbox.clear();
        self.state = ConnState::Closed;
        let _ = self
            .event_tx
            .send(Event::Disconnected {
                reason: reason.to_string(),
            })
            .await;
    }

    // ── Diagnostics ──

    async fn warn_out_of_phase(&mut self, message_type: &str) {
        let err = ProtocolError::OutOfPhase {
            message_type: message_type.to_string(),
            state: format!("{:?}", self.state),
        };
        warn!("dropping: {err}");
        let _ = self
            .event_tx
            .send(Event::ProtocolWarning {
                text: err.to_string(),
            })
            .await;
    }

    async fn warn_user(&mut self, text: &str) {
        let _ = self
            .event_tx
            .send(Event::ProtocolWarning {
                text: text.to_string(),
            })
            .await;
    }
}
