//! Line-oriented `key: value` wire codec.
//!
//! A frame is a sequence of `\n`-separated lines, each `<key>: <value>`.
//! `message_type` is always the first line; `sequence_number` and
//! `ack_number` (when present) come next, in that order, before any payload
//! fields. Structured values (arrays, mappings) are JSON on a single line;
//! integers and floats use their canonical textual form.
//!
//! Decoding is deliberately lenient at the line level: only the first `:` of
//! a line separates key from value, lines without a `:` are skipped, and a
//! value that fails numeric parsing falls back to a plain string. Decoding is
//! strict at the message level: the payload is validated into one of the
//! [`Payload`] variants and anything missing a mandatory field is rejected
//! as [`ProtocolError::MalformedFrame`].

use std::collections::HashMap;

use base64::Engine;
use serde_json::Value;

use crate::battle::StatBoosts;
use crate::error::ProtocolError;

/// How many leading lines [`parse_header`] will scan before giving up.
const HEADER_SCAN_LINES: usize = 5;

/// A decoded datagram: routing header plus validated payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Per-sender monotone sequence number. Present on every reliable
    /// frame, absent on ACKs.
    pub sequence: Option<u32>,
    /// Sequence number being acknowledged. Present on ACK frames and on
    /// the piggybacking HANDSHAKE_RESPONSE.
    pub ack: Option<u32>,
    pub payload: Payload,
}

impl Frame {
    /// A reliable frame carrying `seq`.
    pub fn reliable(seq: u32, payload: Payload) -> Self {
        Frame {
            sequence: Some(seq),
            ack: None,
            payload,
        }
    }

    /// A bare ACK for `ack`. Carries no sequence number of its own.
    pub fn ack(ack: u32) -> Self {
        Frame {
            sequence: None,
            ack: Some(ack),
            payload: Payload::Ack,
        }
    }
}

/// The fast-parse view of a frame used for routing before a full decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub message_type: String,
    pub sequence: Option<u32>,
    pub ack: Option<u32>,
}

/// Transport topology announced in BATTLE_SETUP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationMode {
    P2p,
    Broadcast,
}

impl CommunicationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CommunicationMode::P2p => "P2P",
            CommunicationMode::Broadcast => "BROADCAST",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "P2P" => Some(CommunicationMode::P2p),
            "BROADCAST" => Some(CommunicationMode::Broadcast),
            _ => None,
        }
    }
}

/// Body of a CHAT_MESSAGE: plain text or a binary sticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatBody {
    Text(String),
    Sticker(Vec<u8>),
}

/// The cross-verified per-turn result exchanged in CALCULATION_REPORT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Pokemon name of the turn's attacker.
    pub attacker: String,
    pub move_used: String,
    /// Attacker's own HP after the turn.
    pub remaining_health: u32,
    pub damage_dealt: u32,
    pub defender_hp_remaining: u32,
    pub status_message: String,
}

/// Tagged sum over the message taxonomy.
///
/// Each variant carries its validated field set; [`decode`] rejects frames
/// that do not fit one of these shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Joiner initiates a session. `seed` may be proposed but the host's
    /// seed is the only one that counts.
    HandshakeRequest {
        peer_id: String,
        seed: Option<u32>,
        team_preview: Vec<String>,
    },
    /// Host accepts; carries the authoritative PRNG seed and piggybacks
    /// the request's ACK.
    HandshakeResponse {
        seed: u32,
        peer_id: String,
        team_preview: Vec<String>,
        timestamp: i64,
    },
    SpectatorRequest {
        peer_id: String,
    },
    BattleSetup {
        communication_mode: CommunicationMode,
        pokemon_name: String,
        stat_boosts: StatBoosts,
    },
    AttackAnnounce {
        move_name: String,
    },
    DefenseAnnounce,
    CalculationReport(TurnReport),
    CalculationConfirm,
    /// Sent by a peer that observed a result mismatch, proposing its own
    /// values as authoritative.
    ResolutionRequest {
        attacker: String,
        move_used: String,
        damage_dealt: u32,
        defender_hp_remaining: u32,
    },
    GameOver {
        winner: String,
        loser: String,
    },
    Chat {
        sender_name: String,
        body: ChatBody,
    },
    /// Session close notice. No payload fields.
    Disconnect,
    /// Acknowledgment; never retransmitted, never acknowledged.
    Ack,
}

impl Payload {
    /// The wire tag for this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            Payload::HandshakeRequest { .. } => "HANDSHAKE_REQUEST",
            Payload::HandshakeResponse { .. } => "HANDSHAKE_RESPONSE",
            Payload::SpectatorRequest { .. } => "SPECTATOR_REQUEST",
            Payload::BattleSetup { .. } => "BATTLE_SETUP",
            Payload::AttackAnnounce { .. } => "ATTACK_ANNOUNCE",
            Payload::DefenseAnnounce => "DEFENSE_ANNOUNCE",
            Payload::CalculationReport(_) => "CALCULATION_REPORT",
            Payload::CalculationConfirm => "CALCULATION_CONFIRM",
            Payload::ResolutionRequest { .. } => "RESOLUTION_REQUEST",
            Payload::GameOver { .. } => "GAME_OVER",
            Payload::Chat { .. } => "CHAT_MESSAGE",
            Payload::Disconnect => "DISCONNECT",
            Payload::Ack => "ACK",
        }
    }
}

/// Encode a frame. `message_type` first, then `sequence_number` and
/// `ack_number` when present, then payload fields in a stable order.
/// No trailing newline.
pub fn encode(frame: &Frame) -> Vec<u8> {
    let mut lines: Vec<String> = Vec::with_capacity(8);
    lines.push(format!("message_type: {}", frame.payload.message_type()));
    if let Some(seq) = frame.sequence {
        lines.push(format!("sequence_number: {seq}"));
    }
    if let Some(ack) = frame.ack {
        lines.push(format!("ack_number: {ack}"));
    }

    match &frame.payload {
        Payload::HandshakeRequest {
            peer_id,
            seed,
            team_preview,
        } => {
            lines.push(format!("peer_id: {peer_id}"));
            if let Some(seed) = seed {
                lines.push(format!("seed: {seed}"));
            }
            lines.push(format!("team_preview: {}", json(team_preview)));
        }
        Payload::HandshakeResponse {
            seed,
            peer_id,
            team_preview,
            timestamp,
        } => {
            lines.push(format!("seed: {seed}"));
            lines.push(format!("peer_id: {peer_id}"));
            lines.push(format!("team_preview: {}", json(team_preview)));
            lines.push(format!("timestamp: {timestamp}"));
        }
        Payload::SpectatorRequest { peer_id } => {
            lines.push(format!("peer_id: {peer_id}"));
        }
        Payload::BattleSetup {
            communication_mode,
            pokemon_name,
            stat_boosts,
        } => {
            lines.push(format!("communication_mode: {}", communication_mode.as_str()));
            lines.push(format!("pokemon_name: {pokemon_name}"));
            lines.push(format!("stat_boosts: {}", json(stat_boosts)));
        }
        Payload::AttackAnnounce { move_name } => {
            lines.push(format!("move_name: {move_name}"));
        }
        Payload::DefenseAnnounce | Payload::CalculationConfirm | Payload::Disconnect | Payload::Ack => {}
        Payload::CalculationReport(report) => {
            lines.push(format!("attacker: {}", report.attacker));
            lines.push(format!("move_used: {}", report.move_used));
            lines.push(format!("remaining_health: {}", report.remaining_health));
            lines.push(format!("damage_dealt: {}", report.damage_dealt));
            lines.push(format!("defender_hp_remaining: {}", report.defender_hp_remaining));
            lines.push(format!("status_message: {}", report.status_message));
        }
        Payload::ResolutionRequest {
            attacker,
            move_used,
            damage_dealt,
            defender_hp_remaining,
        } => {
            lines.push(format!("attacker: {attacker}"));
            lines.push(format!("move_used: {move_used}"));
            lines.push(format!("damage_dealt: {damage_dealt}"));
            lines.push(format!("defender_hp_remaining: {defender_hp_remaining}"));
        }
        Payload::GameOver { winner, loser } => {
            lines.push(format!("winner: {winner}"));
            lines.push(format!("loser: {loser}"));
        }
        Payload::Chat { sender_name, body } => {
            lines.push(format!("sender_name: {sender_name}"));
            match body {
                ChatBody::Text(text) => {
                    lines.push("content_type: TEXT".to_string());
                    lines.push(format!("message_text: {text}"));
                }
                ChatBody::Sticker(bytes) => {
                    lines.push("content_type: STICKER".to_string());
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    lines.push(format!("sticker_data: {encoded}"));
                }
            }
        }
    }

    lines.join("\n").into_bytes()
}

fn json<T: serde::Serialize>(value: &T) -> String {
    // Only called on in-memory values that always serialize.
    serde_json::to_string(value).unwrap_or_default()
}

/// Scan only the leading lines of a datagram for routing information.
pub fn parse_header(bytes: &[u8]) -> Result<Header, ProtocolError> {
    let text = frame_text(bytes)?;

    let mut message_type = None;
    let mut sequence = None;
    let mut ack = None;
    for line in text.split('\n').take(HEADER_SCAN_LINES) {
        let Some((key, value)) = split_line(line) else {
            continue;
        };
        match key {
            "message_type" => message_type = Some(value.to_string()),
            "sequence_number" => sequence = value.parse::<u32>().ok(),
            "ack_number" => ack = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    let message_type = message_type
        .ok_or_else(|| ProtocolError::MalformedFrame("no message_type line".to_string()))?;
    Ok(Header {
        message_type,
        sequence,
        ack,
    })
}

/// Decode a full frame and validate its payload.
pub fn decode(bytes: &[u8]) -> Result<Frame, ProtocolError> {
    let text = frame_text(bytes)?;

    let mut message_type = None;
    let mut fields = Fields(HashMap::new());
    for line in text.split('\n') {
        let Some((key, value)) = split_line(line) else {
            continue;
        };
        if key == "message_type" {
            message_type = Some(value.to_string());
        } else {
            fields.0.insert(key.to_string(), parse_value(value));
        }
    }

    let message_type = message_type
        .ok_or_else(|| ProtocolError::MalformedFrame("no message_type line".to_string()))?;

    let sequence = fields.opt_u32("sequence_number")?;
    let ack = fields.opt_u32("ack_number")?;

    let payload = match message_type.as_str() {
        "HANDSHAKE_REQUEST" => Payload::HandshakeRequest {
            peer_id: fields.str("peer_id")?,
            seed: fields.opt_u32("seed")?,
            team_preview: fields.json("team_preview")?,
        },
        "HANDSHAKE_RESPONSE" => Payload::HandshakeResponse {
            seed: fields.u32("seed")?,
            peer_id: fields.str("peer_id")?,
            team_preview: fields.json("team_preview")?,
            timestamp: fields.i64("timestamp")?,
        },
        "SPECTATOR_REQUEST" => Payload::SpectatorRequest {
            peer_id: fields.str("peer_id")?,
        },
        "BATTLE_SETUP" => {
            let mode = fields.str("communication_mode")?;
            Payload::BattleSetup {
                communication_mode: CommunicationMode::parse(&mode).ok_or_else(|| {
                    ProtocolError::MalformedFrame(format!("bad communication_mode `{mode}`"))
                })?,
                pokemon_name: fields.str("pokemon_name")?,
                stat_boosts: fields.json("stat_boosts")?,
            }
        }
        "ATTACK_ANNOUNCE" => Payload::AttackAnnounce {
            move_name: fields.str("move_name")?,
        },
        "DEFENSE_ANNOUNCE" => Payload::DefenseAnnounce,
        "CALCULATION_REPORT" => Payload::CalculationReport(TurnReport {
            attacker: fields.str("attacker")?,
            move_used: fields.str("move_used")?,
            remaining_health: fields.u32("remaining_health")?,
            damage_dealt: fields.u32("damage_dealt")?,
            defender_hp_remaining: fields.u32("defender_hp_remaining")?,
            status_message: fields.str("status_message")?,
        }),
        "CALCULATION_CONFIRM" => Payload::CalculationConfirm,
        "RESOLUTION_REQUEST" => Payload::ResolutionRequest {
            attacker: fields.str("attacker")?,
            move_used: fields.str("move_used")?,
            damage_dealt: fields.u32("damage_dealt")?,
            defender_hp_remaining: fields.u32("defender_hp_remaining")?,
        },
        "GAME_OVER" => Payload::GameOver {
            winner: fields.str("winner")?,
            loser: fields.str("loser")?,
        },
        "CHAT_MESSAGE" => {
            let sender_name = fields.str("sender_name")?;
            let content_type = fields.str("content_type")?;
            let body = match content_type.as_str() {
                "TEXT" => ChatBody::Text(fields.str("message_text")?),
                "STICKER" => {
                    let data = fields.str("sticker_data")?;
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(data.as_bytes())
                        .map_err(|e| {
                            ProtocolError::MalformedFrame(format!("bad sticker_data: {e}"))
                        })?;
                    ChatBody::Sticker(bytes)
                }
                other => {
                    return Err(ProtocolError::MalformedFrame(format!(
                        "bad content_type `{other}`"
                    )));
                }
            };
            Payload::Chat { sender_name, body }
        }
        "DISCONNECT" => Payload::Disconnect,
        "ACK" => Payload::Ack,
        other => {
            return Err(ProtocolError::MalformedFrame(format!(
                "unknown message_type `{other}`"
            )));
        }
    };

    Ok(Frame {
        sequence,
        ack,
        payload,
    })
}

fn frame_text(bytes: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(bytes)
        .map_err(|_| ProtocolError::MalformedFrame("frame is not valid UTF-8".to_string()))
}

/// Split a line at its first `:`. Values may themselves contain `:`.
fn split_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Interpret a raw value: JSON when it opens a structure, then integer,
/// then float, then plain string.
fn parse_value(raw: &str) -> Value {
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
        return Value::String(raw.to_string());
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

/// Decoded key/value lines with typed accessors.
struct Fields(HashMap<String, Value>);

impl Fields {
    fn str(&self, key: &str) -> Result<String, ProtocolError> {
        match self.0.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            // A value that happened to look numeric is still usable as text.
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(missing(key)),
        }
    }

    fn u32(&self, key: &str) -> Result<u32, ProtocolError> {
        self.opt_u32(key)?.ok_or_else(|| missing(key))
    }

    fn opt_u32(&self, key: &str) -> Result<Option<u32>, ProtocolError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => {
                let n = value
                    .as_i64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        ProtocolError::MalformedFrame(format!(
                            "field `{key}` is not an unsigned integer"
                        ))
                    })?;
                Ok(Some(n))
            }
        }
    }

    fn i64(&self, key: &str) -> Result<i64, ProtocolError> {
        self.0
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| missing(key))
    }

    fn json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T, ProtocolError> {
        let value = self.0.get(key).ok_or_else(|| missing(key))?;
        serde_json::from_value(value.clone())
            .map_err(|e| ProtocolError::MalformedFrame(format!("field `{key}`: {e}")))
    }
}

fn missing(key: &str) -> ProtocolError {
    ProtocolError::MalformedFrame(format!("missing or mistyped field `{key}`"))
}
