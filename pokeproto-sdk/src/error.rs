//! Error taxonomy for the protocol core.

use crate::reliability::MAX_RETRIES;

/// Errors produced by the protocol stack.
///
/// Wire-level faults (`MalformedFrame`, `OutOfPhase`) are logged and dropped
/// by the session rather than propagated; they exist as values so that the
/// codec and state machines can report them to the caller that decides.
/// Input faults (`UnknownPokemon`, `UnknownMove`) are surfaced to the user
/// and never produce an outgoing packet. `ReliabilityExhausted` is fatal and
/// tears the session down.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The datagram could not be parsed into a frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The stats repository has no entry for this Pokemon.
    #[error("unknown pokemon `{0}`")]
    UnknownPokemon(String),

    /// The stats repository has no entry for this move.
    #[error("unknown move `{0}`")]
    UnknownMove(String),

    /// A well-formed message arrived in a state where it is not meaningful.
    #[error("{message_type} is not valid while {state}")]
    OutOfPhase {
        message_type: String,
        state: String,
    },

    /// No acknowledgment arrived for an outbound packet within the retry budget.
    #[error("no ACK for packet {0} after {MAX_RETRIES} retries")]
    ReliabilityExhausted(u32),

    /// The underlying datagram socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
