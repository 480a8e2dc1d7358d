//! Events emitted by the session for the UI layer to consume.

use std::net::SocketAddr;

use crate::battle::Role;
use crate::wire::ChatBody;

/// Events that the SDK emits to the consumer (TUI, GUI, bot, etc.)
#[derive(Debug, Clone)]
pub enum Event {
    /// The socket is bound and the session task is running.
    Connected {
        local_addr: SocketAddr,
    },

    /// Handshake finished; the shared PRNG seed is fixed.
    HandshakeComplete {
        role: Role,
        seed: u32,
    },

    /// Both BATTLE_SETUPs have been exchanged; the battle can begin.
    SetupComplete {
        opponent_name: String,
        opponent_hp: u32,
    },

    /// It is the local player's turn to pick a move.
    YourTurn {
        turn: u32,
    },

    /// Waiting on the opponent's move.
    OpponentTurn {
        turn: u32,
    },

    /// A combatant's HP changed. One authoritative update per turn, even
    /// when the peers had to resolve a mismatch first.
    HpUpdate {
        pokemon_name: String,
        hp: u32,
        max_hp: u32,
    },

    /// Battle log line ("X used Y! It's super effective!").
    StatusMessage {
        text: String,
    },

    /// An inbound CHAT_MESSAGE (text or sticker).
    Chat {
        from: String,
        body: ChatBody,
    },

    /// A spectator registered with us.
    SpectatorJoined {
        peer_id: String,
    },

    /// The battle ended.
    GameOver {
        winner: String,
        loser: String,
    },

    /// A dropped or rejected message worth telling the user about.
    ProtocolWarning {
        text: String,
    },

    /// Session closed: explicit disconnect, game over teardown, or a fatal
    /// reliability failure.
    Disconnected {
        reason: String,
    },

    /// Raw inbound frame (verbose mode only, for debugging).
    RawFrame(String),
}
