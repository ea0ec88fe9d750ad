/// Moves a player can make. Each one reads the last accepted state and
/// proposes the next, never touching the old one.
use rand::{CryptoRng, Rng};

use crate::{
    config::GameConfig,
    deck::{CardFace, Deck},
    error::GameError,
    game_data::GameData,
    game_state::{CardOwner, GameState},
    player::{Player, PlayerKeys, RevealedSecrets},
};

/// Initial record: unshuffled deck, empty seats, nobody moved yet.
pub fn create_game(deck: &Deck, config: &GameConfig) -> Result<GameData, GameError> {
    config.validate(deck.len())?;

    Ok(GameData {
        nonce: 0,
        current_player: None,
        deck: deck.cards().to_vec(),
        card_owner: vec![CardOwner::FreshStack; deck.len()],
        players: vec![PlayerKeys::blank(deck.len()); config.num_players],
        player_secrets: vec![RevealedSecrets::blank(deck.len()); config.num_players],
        game_state: GameState::Introductions,
        challenge: 0,
    })
}

/// Copy of `old` with the nonce and the turn advanced.
fn successor(old: &GameData, game_state: GameState) -> GameData {
    let mut new = old.clone();
    new.nonce = old.nonce + 1;
    new.current_player = Some(old.next_player());
    new.game_state = game_state;
    new
}

fn seat(new: &GameData) -> Result<usize, GameError> {
    new.current_player
        .filter(|player| *player < new.num_players())
        .ok_or_else(|| GameError::Argument("game has no seat for the next player".into()))
}

/// Takes the next free seat with `keys`.
pub fn join_game(old: &GameData, keys: &PlayerKeys) -> Result<GameData, GameError> {
    if keys.num_cards() != old.num_cards() {
        return Err(GameError::Argument(format!(
            "player brings {} card keys for a deck of {} cards",
            keys.num_cards(),
            old.num_cards()
        )));
    }

    let mut new = successor(old, GameState::Introductions);
    let player = seat(&new)?;
    new.players[player] = keys.clone();

    tracing::debug!(nonce = new.nonce, player, "joined game");
    Ok(new)
}

pub fn apply_shuffle<R: Rng + CryptoRng>(
    old: &GameData,
    player: &Player,
    rng: &mut R,
) -> Result<GameData, GameError> {
    let mut new = successor(old, GameState::Shuffle);
    new.deck = player.shuffle_and_mask_deck(&old.deck, rng)?;

    tracing::debug!(nonce = new.nonce, player = ?new.current_player, "shuffled and masked deck");
    Ok(new)
}

pub fn apply_mask<R: Rng + CryptoRng>(
    old: &GameData,
    player: &Player,
    rng: &mut R,
) -> Result<GameData, GameError> {
    let mut new = successor(old, GameState::Mask);
    new.deck = player.re_mask_each_card(&old.deck, rng)?;

    tracing::debug!(nonce = new.nonce, player = ?new.current_player, "re-masked each card");
    Ok(new)
}

/// Opens a card for the others and publishes the scalar that opened it.
fn open_and_reveal(
    new: &mut GameData,
    player: &Player,
    seat: usize,
    card_index: usize,
) -> Result<(), GameError> {
    new.deck = player.open_card(&new.deck, card_index)?;
    let card_scalar = player
        .secrets()
        .card_scalar(card_index)
        .copied()
        .ok_or_else(|| GameError::Argument(format!("no secret for card {card_index}")))?;
    new.player_secrets[seat].reveal_card(card_index, card_scalar)
}

/// Walking down from the top of the deck, deals `hand_size` cards to each
/// player in seat order, then one top card. The dealer opens every card
/// except its own.
pub fn deal_first_hand(
    old: &GameData,
    player: &Player,
    config: &GameConfig,
) -> Result<GameData, GameError> {
    config.validate(old.num_cards())?;
    if old.num_players() != config.num_players
        || old.player_secrets.len() != config.num_players
        || old.card_owner.len() != old.num_cards()
    {
        return Err(GameError::Argument(
            "game data does not match the game configuration".into(),
        ));
    }

    let mut new = successor(old, GameState::Deal);
    let dealer = seat(&new)?;

    let mut card_index = new.num_cards();
    for i in 0..config.cards_to_deal() {
        card_index -= 1;
        let owner = i / config.hand_size;
        new.card_owner[card_index] = CardOwner::Player(owner);
        // a player does not open cards for themselves
        if owner != dealer {
            open_and_reveal(&mut new, player, dealer, card_index)?;
        }
    }

    card_index -= 1;
    new.card_owner[card_index] = CardOwner::TopCard;
    open_and_reveal(&mut new, player, dealer, card_index)?;

    tracing::debug!(nonce = new.nonce, dealer, "dealt first hand");
    Ok(new)
}

/// Hands the turn over without touching anything else.
pub fn broadcast_demo_state(old: &GameData) -> GameData {
    successor(old, GameState::Demo)
}

/// What a player can see after dealing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownCards {
    pub hand: Vec<Option<CardFace>>,
    pub top_card: Option<CardFace>,
}

/// Opens, locally, the cards owned by `seat` and reads them together with
/// the face-up top card.
pub fn known_cards(
    game: &GameData,
    player: &Player,
    seat: usize,
    deck: &Deck,
) -> Result<KnownCards, GameError> {
    let mut cards = game.deck.clone();
    let mut known = KnownCards::default();

    for (card_index, owner) in game.card_owner.iter().enumerate() {
        match owner {
            CardOwner::Player(owner) if *owner == seat => {
                cards = player.open_card(&cards, card_index)?;
                known.hand.push(deck.card_to_face(&cards[card_index]));
            }
            CardOwner::TopCard => {
                known.top_card = cards.get(card_index).and_then(|card| deck.card_to_face(card));
            }
            _ => {}
        }
    }

    Ok(known)
}
