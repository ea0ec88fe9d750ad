//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

pub mod config;
pub mod deck;
pub mod error;
pub mod fields;
pub mod game_actions;
pub mod game_data;
pub mod game_state;
pub mod game_validation;
pub mod message;
pub mod player;

pub use config::GameConfig;
pub use deck::{CardFace, Deck};
pub use error::{CodecError, GameError, ProtocolViolation};
pub use game_data::{GameData, GameShape};
pub use game_state::{CardOwner, GameState};
pub use game_validation::is_valid_transition;
pub use message::GameMessage;
pub use player::{Player, PlayerKeys, PlayerSecrets, RevealedSecrets};

#[cfg(test)]
pub mod tests;
