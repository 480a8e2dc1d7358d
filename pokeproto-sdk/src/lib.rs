//! Peer-to-peer turn-based battle protocol over UDP.
//!
//! Two peers exchange text-framed datagrams to negotiate a session,
//! deterministically simulate a 1-versus-1 battle, and cross-verify every
//! turn's outcome, so both sides converge on identical state without a
//! central authority. The stack:
//!
//! - [`wire`] — line-oriented `key: value` codec with a fast header parse
//!   for routing.
//! - [`reliability`] — sequence numbering, per-packet ACKs, bounded
//!   retransmission, fatal escalation on extended loss.
//! - [`session`] — handshake, role assignment, seed propagation, setup
//!   exchange, and the single-task event loop that owns all state.
//! - [`turn`] — the ATTACK/DEFENSE/REPORT/CONFIRM/RESOLUTION cycle.
//! - [`calc`] — the seeded Mulberry32 PRNG and the damage formula both
//!   peers evaluate identically.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use pokeproto_sdk::{Event, SessionConfig, StaticRepository};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let repo = Arc::new(StaticRepository::sample());
//! let config = SessionConfig {
//!     peer_id: "HostUserA".into(),
//!     pokemon: "Charizard".into(),
//!     bind_addr: "127.0.0.1:7777".parse()?,
//!     ..Default::default()
//! };
//! let (handle, mut events) = pokeproto_sdk::host(config, repo).await?;
//! while let Some(event) = events.recv().await {
//!     if let Event::YourTurn { .. } = event {
//!         handle.attack("Flamethrower").await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The UI, CLI wrapping, and stats loading live outside the SDK; they reach
//! the core through [`battle::PokemonStatsRepository`], the
//! [`session::SessionHandle`] command surface, and the [`Event`] channel.

pub mod battle;
pub mod calc;
pub mod error;
pub mod event;
pub mod reliability;
pub mod session;
pub mod stats;
pub mod turn;
pub mod wire;

pub use battle::{BaseStats, MoveCategory, MoveInfo, Phase, PokemonStatsRepository, Role, StatBoosts};
pub use error::ProtocolError;
pub use event::Event;
pub use session::{Command, SessionConfig, SessionHandle, host, join, spectate};
pub use stats::StaticRepository;
pub use wire::ChatBody;
