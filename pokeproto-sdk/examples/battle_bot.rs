//! Battle bot example — two in-process peers fighting over loopback UDP.
//!
//! Usage:
//!   cargo run --example battle_bot
//!
//! Demonstrates:
//!   - Hosting and joining a session
//!   - Reacting to YourTurn events with a scripted move choice
//!   - Chat (text and sticker) alongside the battle
//!   - Reading HP updates and the final GAME_OVER

use std::sync::Arc;

use anyhow::Result;
use pokeproto_sdk::{Event, SessionConfig, StatBoosts, StaticRepository};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let repo = Arc::new(StaticRepository::sample());

    let host_config = SessionConfig {
        peer_id: "HostUserA".to_string(),
        pokemon: "Pikachu".to_string(),
        stat_boosts: StatBoosts {
            sp_attack_uses: 1,
            sp_defense_uses: 0,
        },
        ..Default::default()
    };
    let (host_handle, host_events) = pokeproto_sdk::host(host_config, repo.clone()).await?;

    // The host bound an ephemeral port; the first event tells us which.
    let mut host_events = host_events;
    let host_addr = loop {
        match host_events.recv().await {
            Some(Event::Connected { local_addr }) => break local_addr,
            Some(_) => continue,
            None => anyhow::bail!("host session died before binding"),
        }
    };

    let joiner_config = SessionConfig {
        peer_id: "JoinerB".to_string(),
        pokemon: "Bulbasaur".to_string(),
        peer_addr: Some(host_addr),
        ..Default::default()
    };
    let (joiner_handle, joiner_events) = pokeproto_sdk::join(joiner_config, repo).await?;

    host_handle.chat("good luck, have fun!").await?;

    let host_task = tokio::spawn(drive("host", host_handle, host_events, "Thunderbolt"));
    let joiner_task = tokio::spawn(drive("joiner", joiner_handle, joiner_events, "Vine Whip"));

    host_task.await??;
    joiner_task.await??;
    Ok(())
}

/// Play every turn with the same move until the battle ends.
async fn drive(
    tag: &'static str,
    handle: pokeproto_sdk::SessionHandle,
    mut events: mpsc::Receiver<Event>,
    move_name: &'static str,
) -> Result<()> {
    while let Some(event) = events.recv().await {
        match event {
            Event::HandshakeComplete { role, seed } => {
                println!("[{tag}] handshake complete as {role}, seed {seed}");
            }
            Event::SetupComplete {
                opponent_name,
                opponent_hp,
            } => {
                println!("[{tag}] facing {opponent_name} ({opponent_hp} HP)");
            }
            Event::YourTurn { turn } => {
                println!("[{tag}] turn {turn}: using {move_name}");
                handle.attack(move_name).await?;
            }
            Event::StatusMessage { text } => println!("[{tag}] {text}"),
            Event::HpUpdate {
                pokemon_name, hp, ..
            } => {
                println!("[{tag}] {pokemon_name} is at {hp} HP");
            }
            Event::Chat { from, body } => match body {
                pokeproto_sdk::ChatBody::Text(text) => println!("[{tag}] <{from}> {text}"),
                pokeproto_sdk::ChatBody::Sticker(bytes) => {
                    println!("[{tag}] <{from}> sent a sticker ({} bytes)", bytes.len());
                }
            },
            Event::GameOver { winner, loser } => {
                println!("[{tag}] game over: {winner} beat {loser}");
                handle.disconnect().await?;
            }
            Event::Disconnected { reason } => {
                println!("[{tag}] disconnected: {reason}");
                break;
            }
            _ => {}
        }
    }
    Ok(())
}
