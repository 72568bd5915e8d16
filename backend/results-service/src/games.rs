//! Target game catalog and request validation

use crate::error::{Result, ServiceError};

pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 50;

/// Target games in dashboard order: `(game_name, display_name)`
pub const TARGET_GAMES: [(&str, &str); 5] = [
    ("lotofacil", "Lotofácil"),
    ("lotomania", "Lotomania"),
    ("quina", "Quina"),
    ("megasena", "Mega-Sena"),
    ("diadesorte", "Dia de Sorte"),
];

pub fn is_target_game(game_name: &str) -> bool {
    TARGET_GAMES.iter().any(|(name, _)| *name == game_name)
}

pub fn display_name(game_name: &str) -> Option<&'static str> {
    TARGET_GAMES
        .iter()
        .find(|(name, _)| *name == game_name)
        .map(|(_, display)| *display)
}

/// Position of a game in the catalog, used to keep listings in dashboard order
pub fn catalog_position(game_name: &str) -> Option<usize> {
    TARGET_GAMES.iter().position(|(name, _)| *name == game_name)
}

pub fn validate_game(game_name: &str) -> Result<&str> {
    if is_target_game(game_name) {
        Ok(game_name)
    } else {
        Err(ServiceError::InvalidInput(format!(
            "unknown game '{game_name}'"
        )))
    }
}

/// Zero is rejected; anything above `MAX_LIMIT` is clamped
pub fn validate_limit(limit: u32) -> Result<u32> {
    match limit {
        0 => Err(ServiceError::InvalidInput(
            "limit must be greater than 0".to_string(),
        )),
        n => Ok(n.min(MAX_LIMIT)),
    }
}
