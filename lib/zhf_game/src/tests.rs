use super::{
    config::GameConfig,
    deck::{CARDS_IN_DECK, Deck},
    error::{CodecError, GameError, ProtocolViolation},
    fields::{decimal_to_field, field_count, field_to_decimal},
    game_actions::{
        apply_mask, apply_shuffle, broadcast_demo_state, create_game, deal_first_hand, join_game,
        known_cards,
    },
    game_data::{GameData, GameShape, bump_current_player},
    game_state::{CardOwner, GameState},
    game_validation::{is_valid_transition, transition_holds},
    message::GameMessage,
    player::Player,
};
use bls12_381::Scalar;
use ff::Field;
use itertools::Itertools;

struct Table {
    config: GameConfig,
    deck: Deck,
    players: Vec<Player>,
    history: Vec<GameData>,
}

impl Table {
    fn new(config: GameConfig) -> Self {
        let mut rng = rand::thread_rng();
        let deck = Deck::new();
        let players = (0..config.num_players)
            .map(|_| Player::new(deck.len(), &mut rng))
            .collect();
        let game = create_game(&deck, &config).unwrap();
        Self {
            config,
            deck,
            players,
            history: vec![game],
        }
    }

    fn last(&self) -> &GameData {
        self.history.last().unwrap()
    }

    fn next_seat(&self) -> usize {
        self.last().next_player()
    }

    /// Accepts `new` only if it is a valid successor of the last state.
    fn propose(&mut self, new: GameData) -> Result<(), ProtocolViolation> {
        is_valid_transition(&self.config, &self.deck, self.last(), &new)?;
        self.history.push(new);
        Ok(())
    }

    fn join_all(&mut self) {
        for seat in 0..self.config.num_players {
            let new = join_game(self.last(), self.players[seat].public_keys()).unwrap();
            self.propose(new).unwrap();
        }
    }

    fn shuffle_all(&mut self) {
        let mut rng = rand::thread_rng();
        for _ in 0..self.config.num_players {
            let seat = self.next_seat();
            let new = apply_shuffle(self.last(), &self.players[seat], &mut rng).unwrap();
            self.propose(new).unwrap();
        }
    }

    fn mask_all(&mut self) {
        let mut rng = rand::thread_rng();
        for _ in 0..self.config.num_players {
            let seat = self.next_seat();
            let new = apply_mask(self.last(), &self.players[seat], &mut rng).unwrap();
            self.propose(new).unwrap();
        }
    }

    fn deal_all(&mut self) {
        for _ in 0..self.config.num_players {
            let seat = self.next_seat();
            let new = deal_first_hand(self.last(), &self.players[seat], &self.config).unwrap();
            self.propose(new).unwrap();
        }
    }

    fn dealt(config: GameConfig) -> Self {
        let mut table = Self::new(config);
        table.join_all();
        table.shuffle_all();
        table.mask_all();
        table.deal_all();
        table
    }
}

#[test]
fn test_full_game_flow() {
    let mut table = Table::dealt(GameConfig::default());

    assert_eq!(table.last().game_state, GameState::Deal);
    assert_eq!(table.last().nonce, 8);

    let mut hands = Vec::new();
    let mut top_cards = Vec::new();
    for seat in 0..table.config.num_players {
        let known = known_cards(table.last(), &table.players[seat], seat, &table.deck).unwrap();
        assert_eq!(known.hand.len(), table.config.hand_size);
        assert!(known.hand.iter().all(Option::is_some), "Hand not readable!");
        assert!(known.top_card.is_some());
        top_cards.push(known.top_card.clone());
        hands.extend(known.hand.into_iter().flatten());
    }

    // every player sees the same top card, and nobody shares a card
    assert!(top_cards.iter().all_equal());
    assert!(hands.iter().all_unique());
    assert!(!hands.contains(top_cards[0].as_ref().unwrap()));

    let demo = broadcast_demo_state(table.last());
    table.propose(demo).unwrap();
    assert_eq!(table.last().game_state, GameState::Demo);
}

#[test]
fn test_three_player_game_flow() {
    let table = Table::dealt(GameConfig::new(3, 4));

    assert_eq!(table.last().cards_owned_by(CardOwner::TopCard).count(), 1);
    assert_eq!(
        table.last().cards_owned_by(CardOwner::FreshStack).count(),
        CARDS_IN_DECK - 3 * 4 - 1
    );
    for seat in 0..3 {
        assert_eq!(table.last().cards_owned_by(CardOwner::Player(seat)).count(), 4);
        let known = known_cards(table.last(), &table.players[seat], seat, &table.deck).unwrap();
        assert!(known.hand.iter().all(Option::is_some));
    }
}

#[test]
fn test_cards_are_hidden_from_other_players() {
    let table = Table::dealt(GameConfig::default());

    // player 1 tries to read the hand of player 0
    let peeked = known_cards(table.last(), &table.players[1], 0, &table.deck);
    assert!(
        matches!(peeked, Ok(known) if known.hand.iter().all(Option::is_none)),
        "Other player's hand leaked!"
    );
}

#[test]
fn test_wrong_nonce_and_player() {
    let mut table = Table::new(GameConfig::default());

    let mut new = join_game(table.last(), table.players[0].public_keys()).unwrap();
    new.nonce += 1;
    assert_eq!(table.propose(new), Err(ProtocolViolation::WrongNonce));

    let mut new = join_game(table.last(), table.players[0].public_keys()).unwrap();
    new.current_player = Some(1);
    assert_eq!(table.propose(new), Err(ProtocolViolation::WrongPlayer));
}

#[test]
fn test_join_must_not_touch_other_seats() {
    let mut table = Table::new(GameConfig::default());

    let mut new = join_game(table.last(), table.players[0].public_keys()).unwrap();
    new.players[1] = table.players[1].public_keys().clone();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Introductions))
    );
}

#[test]
fn test_filled_seat_cannot_be_taken_again() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();

    // turn is back at seat 0, which is already taken
    let stranger = Player::new(table.deck.len(), &mut rng);
    let new = join_game(table.last(), stranger.public_keys()).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Introductions))
    );
    assert_eq!(&table.last().players[0], table.players[0].public_keys());
}

#[test]
fn test_shuffle_with_wrong_keys_is_rejected() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();

    // seat 0 moves, but masks with the keys of seat 1
    let new = apply_shuffle(table.last(), &table.players[1], &mut rng).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Shuffle))
    );
}

#[test]
fn test_shuffle_before_everyone_joined() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());

    let new = join_game(table.last(), table.players[0].public_keys()).unwrap();
    table.propose(new).unwrap();

    // seat 1 shuffles before the last seat was taken
    let new = apply_shuffle(table.last(), &table.players[1], &mut rng).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotCompletedCorrectly(GameState::Introductions))
    );
}

#[test]
fn test_phases_out_of_order() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();

    let new = apply_mask(table.last(), &table.players[0], &mut rng).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::OutOfOrder {
            phase: GameState::Mask,
            previous: GameState::Shuffle,
        })
    );

    table.shuffle_all();
    let new = deal_first_hand(table.last(), &table.players[0], &table.config).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::OutOfOrder {
            phase: GameState::Deal,
            previous: GameState::Mask,
        })
    );

    table.mask_all();
    table.deal_all();
    let new = apply_shuffle(table.last(), &table.players[0], &mut rng).unwrap();
    let err = table.propose(new).unwrap_err();
    assert_eq!(
        err,
        ProtocolViolation::OutOfOrder {
            phase: GameState::Shuffle,
            previous: GameState::Introductions,
        }
    );
    assert_eq!(err.to_string(), "shuffling can only be done after introductions");
}

#[test]
fn test_masking_before_everyone_shuffled() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();

    let new = apply_shuffle(table.last(), &table.players[0], &mut rng).unwrap();
    table.propose(new).unwrap();

    let new = apply_mask(table.last(), &table.players[1], &mut rng).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotCompletedCorrectly(GameState::Shuffle))
    );
}

#[test]
fn test_mask_with_wrong_keys_is_rejected() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();
    table.shuffle_all();

    // seat 0 moves, but re-masks with the keys of seat 1
    let new = apply_mask(table.last(), &table.players[1], &mut rng).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Mask))
    );
}

#[test]
fn test_dealing_requires_fresh_stack() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();
    table.shuffle_all();

    let new = apply_mask(table.last(), &table.players[0], &mut rng).unwrap();
    table.propose(new).unwrap();
    let new = deal_first_hand(table.last(), &table.players[1], &table.config).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotCompletedCorrectly(GameState::Mask))
    );

    let new = apply_mask(table.last(), &table.players[1], &mut rng).unwrap();
    table.propose(new).unwrap();

    // a card left the fresh stack before anyone dealt
    let mut old = table.last().clone();
    old.card_owner[0] = CardOwner::DiscardStack;
    let new = deal_first_hand(&old, &table.players[0], &table.config).unwrap();
    assert_eq!(
        is_valid_transition(&table.config, &table.deck, &old, &new),
        Err(ProtocolViolation::NotCompletedCorrectly(GameState::Mask))
    );
}

#[test]
fn test_each_seat_deals_once() {
    let mut table = Table::dealt(GameConfig::default());

    let new = deal_first_hand(table.last(), &table.players[0], &table.config).unwrap();
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Deal))
    );
}

#[test]
fn test_dealing_with_wrong_secret_is_rejected() {
    let mut rng = rand::thread_rng();
    let mut table = Table::new(GameConfig::default());
    table.join_all();
    table.shuffle_all();
    table.mask_all();

    let mut new = deal_first_hand(table.last(), &table.players[0], &table.config).unwrap();
    let dealt_to_other = new.cards_owned_by(CardOwner::Player(1)).next().unwrap();
    new.player_secrets[0].card_scalars[dealt_to_other] = Some(Scalar::random(&mut rng));

    assert!(!bool::from(transition_holds(
        &table.config,
        &table.deck,
        table.last(),
        &new
    )));
    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Deal))
    );
}

#[test]
fn test_dealer_must_not_open_own_cards() {
    let mut table = Table::new(GameConfig::default());
    table.join_all();
    table.shuffle_all();
    table.mask_all();

    let mut new = deal_first_hand(table.last(), &table.players[0], &table.config).unwrap();
    let own = new.cards_owned_by(CardOwner::Player(0)).next().unwrap();
    new.deck = table.players[0].open_card(&new.deck, own).unwrap();

    assert_eq!(
        table.propose(new),
        Err(ProtocolViolation::NotPerformedCorrectly(GameState::Deal))
    );
}

#[test]
fn test_malformed_state_is_rejected() {
    let mut table = Table::new(GameConfig::default());

    let mut new = join_game(table.last(), table.players[0].public_keys()).unwrap();
    new.card_owner.pop();
    assert_eq!(table.propose(new), Err(ProtocolViolation::Malformed));
}

#[test]
fn test_bump_current_player() {
    assert_eq!(bump_current_player(None, 2), 0);
    assert_eq!(bump_current_player(Some(0), 2), 1);
    assert_eq!(bump_current_player(Some(1), 2), 0);
    assert_eq!(bump_current_player(Some(usize::MAX), 2), 0);
}

#[test]
fn test_field_encoding() {
    let table = Table::dealt(GameConfig::default());
    let mut game = table.last().clone();
    // a revealed zero scalar must not read back as a missing one
    game.player_secrets[1].card_scalars[0] = Some(Scalar::zero());
    game.challenge = 7;

    let fields = game.to_fields();
    assert_eq!(fields.len(), field_count(game.shape()));

    let decoded = GameData::from_fields(&fields, game.shape()).unwrap();
    assert_eq!(decoded, game);
    assert_eq!(decoded.player_secrets[1].card_scalars[0], Some(Scalar::zero()));
    assert_eq!(decoded.player_secrets[1].card_scalars[1], None);

    let json = game.serialize().unwrap();
    assert_eq!(GameData::parse(&json, game.shape()).unwrap(), game);

    let wrong_shape = GameShape::new(game.num_cards() - 1, 2);
    assert!(matches!(
        GameData::from_fields(&fields, wrong_shape),
        Err(CodecError::FieldCount { .. })
    ));
}

#[test]
fn test_field_decoding_rejects_bad_points() {
    let table = Table::new(GameConfig::default());
    let game = table.last();
    let fields = game.to_fields();

    // first limb of the first card's ephemeral key
    let mut wide_limb = fields.clone();
    wide_limb[2] = -Scalar::one();
    assert!(matches!(
        GameData::from_fields(&wide_limb, game.shape()),
        Err(CodecError::InvalidField { kind: "point limb", .. })
    ));

    // no compression flag
    let mut not_a_point = fields;
    not_a_point[2] = Scalar::from(5u64);
    not_a_point[3] = Scalar::zero();
    assert!(matches!(
        GameData::from_fields(&not_a_point, game.shape()),
        Err(CodecError::InvalidField { kind: "point", .. })
    ));
}

#[test]
fn test_decimal_fields() {
    assert_eq!(
        field_to_decimal(&-Scalar::one()),
        "52435875175126190479447740508185965837690552500527637822603658699938581184512"
    );
    assert_eq!(decimal_to_field("3").unwrap(), Scalar::from(3u64));
    assert_eq!(decimal_to_field("0").unwrap(), Scalar::zero());

    for bad in [
        "",
        "-1",
        "0x10",
        "1.5",
        "52435875175126190479447740508185965837690552500527637822603658699938581184513",
    ] {
        assert!(
            matches!(decimal_to_field(bad), Err(CodecError::InvalidDecimal(_))),
            "accepted {bad:?}"
        );
    }
}

#[test]
fn test_game_message() {
    let table = Table::dealt(GameConfig::default());
    let game = table.last();

    let message = GameMessage::new_game_state("table-1", game).unwrap();
    let json = message.to_json().unwrap();
    assert!(json.contains("\"type\":\"new_game_state\""));
    assert!(json.contains("\"gameId\":\"table-1\""));

    let received = GameMessage::from_json(&json).unwrap();
    assert_eq!(received, message);
    assert_eq!(&received.game_data(game.shape()).unwrap(), game);

    let other = GameMessage {
        kind: "chat".into(),
        ..received
    };
    assert!(matches!(
        other.game_data(game.shape()),
        Err(GameError::Codec(CodecError::UnexpectedMessage(_)))
    ));
    assert!(GameMessage::from_json("{").is_err());
}

#[test]
fn test_deck() {
    let deck = Deck::new();
    assert_eq!(deck.len(), CARDS_IN_DECK);
    assert_eq!(deck.card_faces()[0].as_str(), "Ace of Spades");
    assert_eq!(deck.card_faces()[1].as_str(), "Ace of Hearts");
    assert!(
        deck.cards()
            .iter()
            .map(|card| card.masked_message.to_compressed())
            .all_unique()
    );
    assert_eq!(deck.cards(), Deck::standard_with_jokers().cards());
    assert_eq!(Deck::face_to_card("Ace of Spades"), deck.cards()[0]);

    for (card, face) in deck.cards().iter().zip(deck.card_faces()) {
        assert_eq!(deck.card_to_face(card).as_ref(), Some(face));
    }

    // same label, same card
    let custom = Deck::from_faces(["Red", "Red", "Blue"]);
    assert_eq!(custom.cards()[0], custom.cards()[1]);
    assert_ne!(custom.cards()[0], custom.cards()[2]);
    assert_eq!(custom.card_to_face(&custom.cards()[1]).unwrap().as_str(), "Red");
}

#[test]
fn test_deck_length_must_match_keys() {
    let mut rng = rand::thread_rng();
    let deck = Deck::new();
    let player = Player::new(deck.len(), &mut rng);

    let short = &deck.cards()[..10];
    assert!(matches!(
        player.shuffle_and_mask_deck(short, &mut rng),
        Err(GameError::Argument(_))
    ));
    assert!(matches!(
        player.re_mask_each_card(short, &mut rng),
        Err(GameError::Argument(_))
    ));
    assert!(matches!(
        player.open_card(deck.cards(), deck.len()),
        Err(GameError::Argument(_))
    ));
}

#[test]
fn test_game_config() {
    let num_cards = CARDS_IN_DECK;
    assert!(GameConfig::default().validate(num_cards).is_ok());
    assert!(GameConfig::new(10, 5).validate(num_cards).is_ok());
    assert!(GameConfig::new(1, 5).validate(num_cards).is_err());
    assert!(GameConfig::new(2, 0).validate(num_cards).is_err());
    assert!(GameConfig::new(9, 6).validate(num_cards).is_err());
    assert!(GameConfig::new(usize::MAX, 2).validate(num_cards).is_err());

    assert!(create_game(&Deck::from_faces(["a", "b", "c"]), &GameConfig::default()).is_err());

    let config: GameConfig = serde_json::from_str(r#"{"numPlayers":3}"#).unwrap();
    assert_eq!(config, GameConfig::new(3, 5));
}
