//! In-memory stats repository.
//!
//! Real applications load stats from their own data sources and implement
//! [`PokemonStatsRepository`] over them; this map-backed version covers
//! examples, bots, and tests.

use std::collections::HashMap;

use crate::battle::{BaseStats, MoveCategory, MoveInfo, PokemonStatsRepository};

/// A repository over two in-memory maps.
#[derive(Debug, Default, Clone)]
pub struct StaticRepository {
    pokemon: HashMap<String, BaseStats>,
    moves: HashMap<String, MoveInfo>,
}

impl StaticRepository {
    pub fn new() -> Self {
        StaticRepository::default()
    }

    pub fn add_pokemon(&mut self, name: &str, stats: BaseStats) -> &mut Self {
        self.pokemon.insert(name.to_string(), stats);
        self
    }

    pub fn add_move(&mut self, info: MoveInfo) -> &mut Self {
        self.moves.insert(info.name.clone(), info);
        self
    }

    /// A small roster big enough to run a full battle.
    pub fn sample() -> Self {
        let mut repo = StaticRepository::new();
        repo.add_pokemon(
            "Pikachu",
            BaseStats {
                hp: 95,
                attack: 55,
                defense: 40,
                sp_attack: 50,
                sp_defense: 50,
                types: vec!["electric".to_string()],
                type_multipliers: HashMap::from([("ground".to_string(), 2.0)]),
            },
        );
        repo.add_pokemon(
            "Bulbasaur",
            BaseStats {
                hp: 105,
                attack: 49,
                defense: 49,
                sp_attack: 65,
                sp_defense: 65,
                types: vec!["grass".to_string(), "poison".to_string()],
                type_multipliers: HashMap::from([
                    ("electric".to_string(), 0.5),
                    ("fire".to_string(), 2.0),
                    ("water".to_string(), 0.5),
                ]),
            },
        );
        repo.add_pokemon(
            "Charizard",
            BaseStats {
                hp: 138,
                attack: 84,
                defense: 78,
                sp_attack: 109,
                sp_defense: 85,
                types: vec!["fire".to_string(), "flying".to_string()],
                type_multipliers: HashMap::from([
                    ("water".to_string(), 2.0),
                    ("electric".to_string(), 2.0),
                    ("grass".to_string(), 0.25),
                    ("ground".to_string(), 0.0),
                ]),
            },
        );
        repo.add_move(MoveInfo {
            name: "Thunderbolt".to_string(),
            move_type: "electric".to_string(),
            power: 90,
            category: MoveCategory::Special,
        });
        repo.add_move(MoveInfo {
            name: "Tackle".to_string(),
            move_type: "normal".to_string(),
            power: 40,
            category: MoveCategory::Physical,
        });
        repo.add_move(MoveInfo {
            name: "Vine Whip".to_string(),
            move_type: "grass".to_string(),
            power: 45,
            category: MoveCategory::Special,
        });
        repo.add_move(MoveInfo {
            name: "Flamethrower".to_string(),
            move_type: "fire".to_string(),
            power: 90,
            category: MoveCategory::Special,
        });
        repo.add_move(MoveInfo {
            name: "Growl".to_string(),
            move_type: "normal".to_string(),
            power: 0,
            category: MoveCategory::Status,
        });
        repo
    }
}

impl PokemonStatsRepository for StaticRepository {
    fn pokemon(&self, name: &str) -> Option<BaseStats> {
        self.pokemon.get(name).cloned()
    }

    fn move_info(&self, name: &str) -> Option<MoveInfo> {
        self.moves.get(name).cloned()
    }
}
