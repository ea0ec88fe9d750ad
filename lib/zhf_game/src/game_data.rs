use zhf_mask::Card;

use crate::{
    config::GameConfig,
    game_state::{CardOwner, GameState},
    player::{PlayerKeys, RevealedSecrets},
};

/// Number of cards and players a [`GameData`] is laid out for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameShape {
    pub num_cards: usize,
    pub num_players: usize,
}

impl GameShape {
    pub const fn new(num_cards: usize, num_players: usize) -> Self {
        Self {
            num_cards,
            num_players,
        }
    }

    pub const fn from_config(config: &GameConfig, num_cards: usize) -> Self {
        Self::new(num_cards, config.num_players)
    }
}

/// Public game record.
///
/// Whoever proposes the next state owns it; once broadcast it is only ever
/// read, and every move produces a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameData {
    /// Increases by one with every state.
    pub nonce: u64,
    /// The player who made the move that produced this state. `None` before
    /// anyone joined.
    pub current_player: Option<usize>,
    /// Masked cards. Once shuffled they keep their position and are only
    /// opened in place.
    pub deck: Vec<Card>,
    pub card_owner: Vec<CardOwner>,
    pub players: Vec<PlayerKeys>,
    /// Filled in only as players reveal card secrets.
    pub player_secrets: Vec<RevealedSecrets>,
    pub game_state: GameState,
    pub challenge: u64,
}

/// Seat of whoever moves after `current_player`.
pub const fn bump_current_player(current_player: Option<usize>, num_players: usize) -> usize {
    match current_player {
        Some(player) if player.saturating_add(1) < num_players => player + 1,
        _ => 0,
    }
}

impl GameData {
    pub fn num_cards(&self) -> usize {
        self.deck.len()
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn shape(&self) -> GameShape {
        GameShape::new(self.num_cards(), self.num_players())
    }

    /// Every array has the length `shape` asks for.
    pub fn has_shape(&self, shape: GameShape) -> bool {
        self.deck.len() == shape.num_cards
            && self.card_owner.len() == shape.num_cards
            && self.players.len() == shape.num_players
            && self.player_secrets.len() == shape.num_players
            && self
                .players
                .iter()
                .all(|keys| keys.num_cards() == shape.num_cards)
            && self
                .player_secrets
                .iter()
                .all(|secrets| secrets.num_cards() == shape.num_cards)
    }

    pub fn next_player(&self) -> usize {
        bump_current_player(self.current_player, self.num_players())
    }

    pub fn current_player_keys(&self) -> Option<&PlayerKeys> {
        self.current_player.and_then(|player| self.players.get(player))
    }

    pub fn current_player_secrets(&self) -> Option<&RevealedSecrets> {
        self.current_player
            .and_then(|player| self.player_secrets.get(player))
    }

    pub fn cards_owned_by(&self, owner: CardOwner) -> impl Iterator<Item = usize> + '_ {
        self.card_owner
            .iter()
            .enumerate()
            .filter(move |(_, card_owner)| **card_owner == owner)
            .map(|(index, _)| index)
    }
}
