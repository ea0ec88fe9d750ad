use serde::{Deserialize, Serialize};

use crate::error::GameError;

pub const NUM_PLAYERS: usize = 2;
pub const INITIAL_NUM_CARDS: usize = 5;

/// Table parameters every peer must agree on before the game starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub num_players: usize,
    /// Cards each player receives on the first deal.
    pub hand_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(NUM_PLAYERS, INITIAL_NUM_CARDS)
    }
}

impl GameConfig {
    pub const fn new(num_players: usize, hand_size: usize) -> Self {
        Self {
            num_players,
            hand_size,
        }
    }

    pub const fn cards_to_deal(&self) -> usize {
        self.num_players * self.hand_size
    }

    /// Every hand plus the top card must fit in the deck.
    pub fn validate(&self, num_cards: usize) -> Result<(), GameError> {
        if self.num_players < 2 {
            return Err(GameError::Argument(format!(
                "at least 2 players are required, got {}",
                self.num_players
            )));
        }
        if self.hand_size == 0 {
            return Err(GameError::Argument("hand size must not be zero".into()));
        }
        let needed = self
            .num_players
            .checked_mul(self.hand_size)
            .and_then(|cards| cards.checked_add(1));
        match needed {
            Some(needed) if needed <= num_cards => Ok(()),
            _ => Err(GameError::Argument(format!(
                "{} players with {} cards each do not fit in a deck of {} cards",
                self.num_players, self.hand_size, num_cards
            ))),
        }
    }
}
