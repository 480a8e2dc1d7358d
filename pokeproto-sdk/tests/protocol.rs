//! End-to-end protocol tests.
//!
//! Tests cover:
//! - Handshake: seed agreement, piggybacked ACK, setup exchange
//! - Reliability: ACK clears the buffer, retransmission, fatal exhaustion
//! - Battle: full game to GAME_OVER with converging state on both peers
//! - Mismatch: induced desynchronization resolved to the requester's values
//! - Chat, spectators, and out-of-phase tolerance

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pokeproto_sdk::battle::{Combatant, PokemonStatsRepository, StatBoosts};
use pokeproto_sdk::calc::{self, Mulberry32};
use pokeproto_sdk::wire::{self, ChatBody, CommunicationMode, Frame, Payload, TurnReport};
use pokeproto_sdk::{Event, SessionConfig, StaticRepository};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn repo() -> Arc<StaticRepository> {
    Arc::new(StaticRepository::sample())
}

fn config(peer_id: &str, pokemon: &str) -> SessionConfig {
    SessionConfig {
        peer_id: peer_id.to_string(),
        pokemon: pokemon.to_string(),
        ..Default::default()
    }
}

/// Pull events until one matches, failing the test on timeout or channel
/// close.
async fn wait_for<F>(events: &mut mpsc::Receiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn local_addr_of(events: &mut mpsc::Receiver<Event>) -> SocketAddr {
    match wait_for(events, |e| matches!(e, Event::Connected { .. })).await {
        Event::Connected { local_addr } => local_addr,
        _ => unreachable!(),
    }
}

/// A hand-driven peer speaking raw datagrams, for scripting exact frame
/// sequences against a real session.
struct RawPeer {
    socket: UdpSocket,
    target: SocketAddr,
    next_seq: u32,
}

impl RawPeer {
    async fn bind(target: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind");
        RawPeer {
            socket,
            target,
            next_seq: 0,
        }
    }

    async fn send_reliable(&mut self, payload: Payload) -> u32 {
        self.next_seq += 1;
        let frame = Frame::reliable(self.next_seq, payload);
        self.socket
            .send_to(&wire::encode(&frame), self.target)
            .await
            .expect("send");
        self.next_seq
    }

    async fn send_ack(&self, ack: u32) {
        self.socket
            .send_to(&wire::encode(&Frame::ack(ack)), self.target)
            .await
            .expect("send ack");
    }

    async fn recv_frame(&self) -> Frame {
        let mut buf = vec![0u8; 2048];
        let (len, _) = timeout(WAIT, self.socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for frame")
            .expect("recv");
        wire::decode(&buf[..len]).expect("decode")
    }

    /// Receive frames, ACKing every reliable one, until the predicate
    /// matches. Duplicates and unrelated frames are skipped.
    async fn recv_until<F>(&mut self, mut pred: F) -> Frame
    where
        F: FnMut(&Payload) -> bool,
    {
        loop {
            let frame = self.recv_frame().await;
            if let Some(seq) = frame.sequence {
                self.send_ack(seq).await;
            }
            if pred(&frame.payload) {
                return frame;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// 1. Handshake
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn happy_handshake_agrees_on_seed_and_setup() {
    let (_host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let joiner_config = SessionConfig {
        peer_addr: Some(host_addr),
        ..config("JoinerB", "Bulbasaur")
    };
    let (_joiner_handle, mut joiner_events) = pokeproto_sdk::join(joiner_config, repo())
        .await
        .unwrap();

    let host_seed = match wait_for(&mut host_events, |e| {
        matches!(e, Event::HandshakeComplete { .. })
    })
    .await
    {
        Event::HandshakeComplete { seed, .. } => seed,
        _ => unreachable!(),
    };
    let joiner_seed = match wait_for(&mut joiner_events, |e| {
        matches!(e, Event::HandshakeComplete { .. })
    })
    .await
    {
        Event::HandshakeComplete { seed, .. } => seed,
        _ => unreachable!(),
    };
    assert_eq!(host_seed, joiner_seed, "both peers must share the host seed");

    // Setup completes on both sides with the other's Pokemon.
    let host_setup = wait_for(&mut host_events, |e| {
        matches!(e, Event::SetupComplete { .. })
    })
    .await;
    match host_setup {
        Event::SetupComplete { opponent_name, .. } => assert_eq!(opponent_name, "Bulbasaur"),
        _ => unreachable!(),
    }
    let joiner_setup = wait_for(&mut joiner_events, |e| {
        matches!(e, Event::SetupComplete { .. })
    })
    .await;
    match joiner_setup {
        Event::SetupComplete { opponent_name, .. } => assert_eq!(opponent_name, "Pikachu"),
        _ => unreachable!(),
    }

    // Turn 1 belongs to the host.
    wait_for(&mut host_events, |e| matches!(e, Event::YourTurn { turn: 1 })).await;
    wait_for(&mut joiner_events, |e| {
        matches!(e, Event::OpponentTurn { turn: 1 })
    })
    .await;
}

#[tokio::test]
async fn handshake_response_piggybacks_the_request_ack() {
    let (_handle, mut host_events) = pokeproto_sdk::host(config("Host", "Pikachu"), repo())
        .await
        .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let mut peer = RawPeer::bind(host_addr).await;
    let request_seq = peer
        .send_reliable(Payload::HandshakeRequest {
            peer_id: "Raw".to_string(),
            seed: None,
            team_preview: vec!["Bulbasaur".to_string()],
        })
        .await;

    let response = peer
        .recv_until(|p| matches!(p, Payload::HandshakeResponse { .. }))
        .await;
    assert_eq!(
        response.ack,
        Some(request_seq),
        "response must piggyback the request ack"
    );
    assert!(response.sequence.is_some(), "response is itself reliable");
}

// ═══════════════════════════════════════════════════════════════════
// 2. Reliability
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unacked_frames_are_retransmitted_and_acks_stop_them() {
    let (_handle, mut host_events) = pokeproto_sdk::host(config("Host", "Pikachu"), repo())
        .await
        .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let mut peer = RawPeer::bind(host_addr).await;
    peer.send_reliable(Payload::HandshakeRequest {
        peer_id: "Raw".to_string(),
        seed: None,
        team_preview: vec!["Bulbasaur".to_string()],
    })
    .await;

    // Take the response but withhold its ACK; the same bytes must come
    // around again after the retry timeout.
    let first = peer.recv_frame().await;
    let response_seq = first.sequence.expect("reliable response");

    let retransmitted = timeout(WAIT, async {
        loop {
            let frame = peer.recv_frame().await;
            if frame.sequence == Some(response_seq)
                && matches!(frame.payload, Payload::HandshakeResponse { .. })
            {
                return frame;
            }
        }
    })
    .await
    .expect("no retransmission arrived");
    assert_eq!(retransmitted.payload, first.payload);

    // Now ACK it; after a full retry window nothing but the (still
    // unacked) BATTLE_SETUP may show up.
    peer.send_ack(response_seq).await;
    let quiet = timeout(Duration::from_millis(700), async {
        loop {
            let frame = peer.recv_frame().await;
            if frame.sequence == Some(response_seq) {
                return frame;
            }
        }
    })
    .await;
    assert!(quiet.is_err(), "acked frame must not be retransmitted");
}

#[tokio::test(start_paused = true)]
async fn unreachable_peer_exhausts_retries_and_closes() {
    // A bound socket that never answers: every handshake datagram is
    // swallowed.
    let blackhole = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let blackhole_addr = blackhole.local_addr().unwrap();

    let started = tokio::time::Instant::now();
    let joiner_config = SessionConfig {
        peer_addr: Some(blackhole_addr),
        ..config("Joiner", "Bulbasaur")
    };
    let (_handle, mut events) = pokeproto_sdk::join(joiner_config, repo()).await.unwrap();

    let event = wait_for(&mut events, |e| matches!(e, Event::Disconnected { .. })).await;
    let Event::Disconnected { reason } = event else {
        unreachable!()
    };
    assert!(
        reason.contains("no ACK"),
        "expected a reliability failure, got: {reason}"
    );

    // Initial send + 3 retries at 500ms each, then the fatal fire at
    // 2000ms (virtual time).
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(2000),
        "gave up too early: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(2600),
        "gave up too late: {elapsed:?}"
    );
}

#[tokio::test]
async fn acks_carry_no_sequence_number() {
    let (_handle, mut host_events) = pokeproto_sdk::host(config("Host", "Pikachu"), repo())
        .await
        .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let mut peer = RawPeer::bind(host_addr).await;
    peer.send_reliable(Payload::Chat {
        sender_name: "Raw".to_string(),
        body: ChatBody::Text("hello?".to_string()),
    })
    .await;

    let ack = peer.recv_until(|p| matches!(p, Payload::Ack)).await;
    assert_eq!(ack.sequence, None);
    assert_eq!(ack.ack, Some(1));
}

// ═══════════════════════════════════════════════════════════════════
// 3. Full battle
// ═══════════════════════════════════════════════════════════════════

/// Answer YourTurn with a fixed move until the battle ends; collect the
/// rest.
async fn autoplay(
    handle: pokeproto_sdk::SessionHandle,
    mut events: mpsc::Receiver<Event>,
    move_name: &'static str,
) -> (Vec<(String, u32)>, Option<(String, String)>) {
    let mut hp_log = Vec::new();
    let mut outcome = None;
    let result = timeout(Duration::from_secs(30), async {
        while let Some(event) = events.recv().await {
            match event {
                Event::YourTurn { .. } => {
                    handle.attack(move_name).await.expect("attack");
                }
                Event::HpUpdate {
                    pokemon_name, hp, ..
                } => hp_log.push((pokemon_name, hp)),
                Event::GameOver { winner, loser } => {
                    outcome = Some((winner, loser));
                    return;
                }
                _ => {}
            }
        }
    })
    .await;
    assert!(result.is_ok(), "battle never finished");
    (hp_log, outcome)
}

#[tokio::test]
async fn full_battle_converges_to_the_same_outcome() {
    let (host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let joiner_config = SessionConfig {
        peer_addr: Some(host_addr),
        ..config("JoinerB", "Bulbasaur")
    };
    let (joiner_handle, joiner_events) = pokeproto_sdk::join(joiner_config, repo())
        .await
        .unwrap();

    let host_task = tokio::spawn(autoplay(host_handle, host_events, "Thunderbolt"));
    let joiner_task = tokio::spawn(autoplay(joiner_handle, joiner_events, "Vine Whip"));

    let (host_hp_log, host_outcome) = host_task.await.unwrap();
    let (joiner_hp_log, joiner_outcome) = joiner_task.await.unwrap();

    let host_outcome = host_outcome.expect("host saw no game over");
    let joiner_outcome = joiner_outcome.expect("joiner saw no game over");
    assert_eq!(host_outcome, joiner_outcome);

    // Every HP value either peer observed for a given Pokemon matches the
    // other peer's observation turn for turn.
    assert_eq!(host_hp_log, joiner_hp_log);

    // The loser ended at exactly zero.
    let (_, loser) = host_outcome;
    let final_loser_hp = host_hp_log
        .iter()
        .rev()
        .find(|(name, _)| *name == loser)
        .map(|(_, hp)| *hp);
    assert_eq!(final_loser_hp, Some(0));
}

#[tokio::test]
async fn boosted_attacks_stay_in_sync() {
    let host_config = SessionConfig {
        stat_boosts: StatBoosts {
            sp_attack_uses: 2,
            sp_defense_uses: 0,
        },
        ..config("HostUserA", "Pikachu")
    };
    let (host_handle, mut host_events) = pokeproto_sdk::host(host_config, repo())
        .await
        .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let joiner_config = SessionConfig {
        peer_addr: Some(host_addr),
        ..config("JoinerB", "Bulbasaur")
    };
    let (joiner_handle, joiner_events) = pokeproto_sdk::join(joiner_config, repo())
        .await
        .unwrap();

    let host_task = tokio::spawn(autoplay(host_handle, host_events, "Thunderbolt"));
    let joiner_task = tokio::spawn(autoplay(joiner_handle, joiner_events, "Vine Whip"));

    let (host_hp_log, host_outcome) = host_task.await.unwrap();
    let (joiner_hp_log, joiner_outcome) = joiner_task.await.unwrap();
    assert_eq!(host_outcome, joiner_outcome);
    assert_eq!(host_hp_log, joiner_hp_log);
}

// ═══════════════════════════════════════════════════════════════════
// 4. Mismatch resolution
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn induced_mismatch_resolves_to_the_requester_values() {
    let sample = StaticRepository::sample();
    let (host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    // Scripted joiner.
    let mut peer = RawPeer::bind(host_addr).await;
    peer.send_reliable(Payload::HandshakeRequest {
        peer_id: "Raw".to_string(),
        seed: None,
        team_preview: vec!["Bulbasaur".to_string()],
    })
    .await;

    let response = peer
        .recv_until(|p| matches!(p, Payload::HandshakeResponse { .. }))
        .await;
    let Payload::HandshakeResponse { seed, .. } = response.payload else {
        unreachable!()
    };
    peer.recv_until(|p| matches!(p, Payload::BattleSetup { .. }))
        .await;
    peer.send_reliable(Payload::BattleSetup {
        communication_mode: CommunicationMode::P2p,
        pokemon_name: "Bulbasaur".to_string(),
        stat_boosts: StatBoosts::default(),
    })
    .await;

    // Shadow the battle locally so we know the true values.
    let mut rng = Mulberry32::new(seed);
    let pikachu = Combatant::new("Pikachu".to_string(), sample.pokemon("Pikachu").unwrap());
    let bulbasaur = Combatant::new(
        "Bulbasaur".to_string(),
        sample.pokemon("Bulbasaur").unwrap(),
    );
    let thunderbolt = sample.move_info("Thunderbolt").unwrap();
    let truth = calc::resolve_attack(&pikachu, &bulbasaur, &thunderbolt, false, &mut rng);

    // Host takes turn 1.
    wait_for(&mut host_events, |e| matches!(e, Event::YourTurn { turn: 1 })).await;
    host_handle.attack("Thunderbolt").await.unwrap();
    peer.recv_until(|p| matches!(p, Payload::AttackAnnounce { .. }))
        .await;

    peer.send_reliable(Payload::DefenseAnnounce).await;
    // Report deliberately off-by-one values.
    peer.send_reliable(Payload::CalculationReport(TurnReport {
        attacker: "Pikachu".to_string(),
        move_used: "Thunderbolt".to_string(),
        remaining_health: truth.attacker_hp_after,
        damage_dealt: truth.damage + 1,
        defender_hp_remaining: truth.defender_hp_after.saturating_sub(1),
        status_message: "desync".to_string(),
    }))
    .await;

    // The host's own report carries the true values...
    let report = peer
        .recv_until(|p| matches!(p, Payload::CalculationReport(_)))
        .await;
    let Payload::CalculationReport(host_report) = report.payload else {
        unreachable!()
    };
    assert_eq!(host_report.damage_dealt, truth.damage);

    // ...and the mismatch makes it propose exactly those values.
    let request = peer
        .recv_until(|p| matches!(p, Payload::ResolutionRequest { .. }))
        .await;
    let Payload::ResolutionRequest {
        damage_dealt,
        defender_hp_remaining,
        ..
    } = request.payload
    else {
        unreachable!()
    };
    assert_eq!(damage_dealt, truth.damage);
    assert_eq!(defender_hp_remaining, truth.defender_hp_after);

    // Adopt and confirm; the host settles on its own values and closes the
    // turn with a confirm of its own.
    peer.send_reliable(Payload::CalculationConfirm).await;
    peer.recv_until(|p| matches!(p, Payload::CalculationConfirm))
        .await;

    let update = wait_for(&mut host_events, |e| matches!(e, Event::HpUpdate { .. })).await;
    let Event::HpUpdate {
        pokemon_name, hp, ..
    } = update
    else {
        unreachable!()
    };
    assert_eq!(pokemon_name, "Bulbasaur");
    assert_eq!(hp, truth.defender_hp_after);

    wait_for(&mut host_events, |e| {
        matches!(e, Event::OpponentTurn { turn: 2 })
    })
    .await;
}

// ═══════════════════════════════════════════════════════════════════
// 5. Chat, spectators, out-of-phase
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn chat_and_stickers_flow_in_any_state() {
    let (host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let joiner_config = SessionConfig {
        peer_addr: Some(host_addr),
        ..config("JoinerB", "Bulbasaur")
    };
    let (joiner_handle, mut joiner_events) = pokeproto_sdk::join(joiner_config, repo())
        .await
        .unwrap();

    // Text from the joiner arrives even before the battle is underway.
    joiner_handle.chat("glhf!").await.unwrap();
    let chat = wait_for(&mut host_events, |e| matches!(e, Event::Chat { .. })).await;
    let Event::Chat { from, body } = chat else {
        unreachable!()
    };
    assert_eq!(from, "JoinerB");
    assert_eq!(body, ChatBody::Text("glhf!".to_string()));

    // Sticker bytes survive the base64 hop.
    let sticker = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
    host_handle.sticker(sticker.clone()).await.unwrap();
    let chat = wait_for(&mut joiner_events, |e| matches!(e, Event::Chat { .. })).await;
    let Event::Chat { from, body } = chat else {
        unreachable!()
    };
    assert_eq!(from, "HostUserA");
    assert_eq!(body, ChatBody::Sticker(sticker));
}

#[tokio::test]
async fn spectators_are_registered_and_fed_events() {
    let (_host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let spectator_config = SessionConfig {
        peer_addr: Some(host_addr),
        ..config("Watcher", "Pikachu")
    };
    let (_spec_handle, mut spec_events) = pokeproto_sdk::spectate(spectator_config, repo())
        .await
        .unwrap();

    let joined = wait_for(&mut host_events, |e| {
        matches!(e, Event::SpectatorJoined { .. })
    })
    .await;
    let Event::SpectatorJoined { peer_id } = joined else {
        unreachable!()
    };
    assert_eq!(peer_id, "Watcher");

    // The spectator channel stays open and quiet.
    let nothing = timeout(Duration::from_millis(200), spec_events.recv()).await;
    assert!(nothing.is_err() || nothing.is_ok_and(|e| e.is_some()));
}

#[tokio::test]
async fn out_of_phase_messages_are_dropped_not_fatal() {
    let (_host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let mut peer = RawPeer::bind(host_addr).await;
    // A confirm with no battle anywhere in sight.
    peer.send_reliable(Payload::CalculationConfirm).await;

    let warning = wait_for(&mut host_events, |e| {
        matches!(e, Event::ProtocolWarning { .. })
    })
    .await;
    let Event::ProtocolWarning { text } = warning else {
        unreachable!()
    };
    assert!(text.contains("CALCULATION_CONFIRM"), "got: {text}");

    // The session is still healthy: a real handshake goes through.
    peer.send_reliable(Payload::HandshakeRequest {
        peer_id: "Raw".to_string(),
        seed: None,
        team_preview: vec!["Bulbasaur".to_string()],
    })
    .await;
    peer.recv_until(|p| matches!(p, Payload::HandshakeResponse { .. }))
        .await;
}

#[tokio::test]
async fn duplicated_frames_are_tolerated() {
    let (_host_handle, mut host_events) =
        pokeproto_sdk::host(config("HostUserA", "Pikachu"), repo())
            .await
            .unwrap();
    let host_addr = local_addr_of(&mut host_events).await;

    let mut peer = RawPeer::bind(host_addr).await;
    let request_seq = peer
        .send_reliable(Payload::HandshakeRequest {
            peer_id: "Raw".to_string(),
            seed: None,
            team_preview: vec!["Bulbasaur".to_string()],
        })
        .await;
    peer.recv_until(|p| matches!(p, Payload::HandshakeResponse { .. }))
        .await;
    peer.recv_until(|p| matches!(p, Payload::BattleSetup { .. }))
        .await;

    // Replay the handshake request byte-for-byte, as a retransmission
    // would. The host must ACK it again but not restart the session.
    let replay = Frame::reliable(
        request_seq,
        Payload::HandshakeRequest {
            peer_id: "Raw".to_string(),
            seed: None,
            team_preview: vec!["Bulbasaur".to_string()],
        },
    );
    peer.socket
        .send_to(&wire::encode(&replay), peer.target)
        .await
        .unwrap();
    let ack = peer.recv_until(|p| matches!(p, Payload::Ack)).await;
    assert_eq!(ack.ack, Some(request_seq));

    // Setup twice: the second is dropped with a warning, not applied.
    let setup = Payload::BattleSetup {
        communication_mode: CommunicationMode::P2p,
        pokemon_name: "Bulbasaur".to_string(),
        stat_boosts: StatBoosts::default(),
    };
    peer.send_reliable(setup.clone()).await;
    wait_for(&mut host_events, |e| matches!(e, Event::SetupComplete { .. })).await;
    wait_for(&mut host_events, |e| matches!(e, Event::YourTurn { turn: 1 })).await;

    peer.send_reliable(setup).await;
    wait_for(&mut host_events, |e| {
        matches!(e, Event::ProtocolWarning { text } if text.contains("BATTLE_SETUP"))
    })
    .await;
}

#[tokio::test]
async fn unknown_pokemon_is_rejected_before_any_packet() {
    let bad = SessionConfig {
        pokemon: "Missingno".to_string(),
        ..config("Host", "Missingno")
    };
    let err = pokeproto_sdk::host(bad, repo()).await.err();
    assert!(err.is_some());
    assert!(err.unwrap().to_string().contains("Missingno"));
}

// ═══════════════════════════════════════════════════════════════════
// 6. Codec interop smoke check
// ═══════════════════════════════════════════════════════════════════

#[test]
fn documented_handshake_response_frame_decodes() {
    let bytes = b"message_type: HANDSHAKE_RESPONSE\nsequence_number: 3\nack_number: 1\nseed: 998877\npeer_id: HostUserA\nteam_preview: [\"Charizard\"]\ntimestamp: 1699999999999";
    let frame = wire::decode(bytes).expect("decode");
    assert_eq!(frame.sequence, Some(3));
    assert_eq!(frame.ack, Some(1));
    let Payload::HandshakeResponse {
        seed,
        peer_id,
        team_preview,
        timestamp,
    } = frame.payload
    else {
        panic!("wrong payload");
    };
    assert_eq!(seed, 998877);
    assert_eq!(peer_id, "HostUserA");
    assert_eq!(team_preview, vec!["Charizard".to_string()]);
    assert_eq!(timestamp, 1699999999999);
}

// Shared-stats sanity for the shadow battle in the mismatch test.
#[test]
fn sample_repository_has_the_fixtures_these_tests_rely_on() {
    let sample = StaticRepository::sample();
    let bulbasaur = sample.pokemon("Bulbasaur").unwrap();
    assert_eq!(
        bulbasaur.type_multipliers,
        HashMap::from([
            ("electric".to_string(), 0.5),
            ("fire".to_string(), 2.0),
            ("water".to_string(), 0.5),
        ])
    );
    assert!(sample.move_info("Vine Whip").is_some());
}
