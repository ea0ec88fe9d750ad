use std::fmt;

use once_cell::sync::Lazy;
use zhf_mask::{Card, hash_to_scalar::hash_to_point};

pub const CARDS_IN_DECK: usize = 54;
pub const UNKNOWN_CARD: &str = "unknown";

const RANKS: [&str; 13] = [
    "Ace", "2", "3", "4", "5", "6", "7", "8", "9", "10", "Jack", "Queen", "King",
];
const SUITS: [&str; 4] = ["Spades", "Hearts", "Diamonds", "Clubs"];
const JOKERS: [&str; 2] = ["Black Joker", "Red Joker"];

static STANDARD_DECK_WITH_JOKERS: Lazy<Deck> = Lazy::new(Deck::new);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CardFace(String);

impl CardFace {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardFace {
    fn from(face: &str) -> Self {
        Self(face.to_string())
    }
}

impl From<String> for CardFace {
    fn from(face: String) -> Self {
        Self(face)
    }
}

/// Rank-major: "Ace of Spades", "Ace of Hearts", ... then the two jokers.
pub fn build_card_faces() -> Vec<CardFace> {
    RANKS
        .iter()
        .flat_map(|rank| SUITS.iter().map(move |suit| format!("{rank} of {suit}")))
        .chain(JOKERS.iter().map(|joker| joker.to_string()))
        .map(CardFace)
        .collect()
}

/// Immutable mapping between card faces and card points.
#[derive(Clone, Debug)]
pub struct Deck {
    card_faces: Vec<CardFace>,
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// Standard deck with jokers.
    pub fn new() -> Self {
        Self::from_faces(build_card_faces())
    }

    pub fn from_faces<F: Into<CardFace>>(faces: impl IntoIterator<Item = F>) -> Self {
        let card_faces: Vec<CardFace> = faces.into_iter().map(Into::into).collect();
        let cards = card_faces
            .iter()
            .map(|face| Self::face_to_card(face.as_str()))
            .collect();

        Self { card_faces, cards }
    }

    /// Shared standard deck, so peers don't redo the 54 hash-to-point calls.
    pub fn standard_with_jokers() -> &'static Deck {
        &STANDARD_DECK_WITH_JOKERS
    }

    /// Same label, same card, on every peer.
    pub fn face_to_card(face: &str) -> Card {
        Card::unjoined(hash_to_point(face.as_bytes()))
    }

    /// Reverse lookup of a fully opened card. Linear in the deck size.
    pub fn card_to_face(&self, card: &Card) -> Option<CardFace> {
        let card_index = self
            .cards
            .iter()
            .position(|known| known.masked_message.eq(&card.masked_message))?;

        self.card_faces.get(card_index).cloned()
    }

    pub fn faces_of(&self, cards: &[Card]) -> Vec<Option<CardFace>> {
        cards.iter().map(|card| self.card_to_face(card)).collect()
    }

    pub fn card_faces(&self) -> &[CardFace] {
        &self.card_faces
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
