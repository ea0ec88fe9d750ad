use std::fmt;

use bls12_381::G1Affine;
use ff::Field;
use rand::{CryptoRng, Rng, seq::SliceRandom};
use subtle::{Choice, ConstantTimeEq};
use zhf_mask::{
    Card, add_player_to_card_mask, mask_random, partial_unmask,
    select::choice,
    types::{Point, SecretScalar},
    util::make_public_point_from_secret,
};

use crate::error::GameError;

/// Public keys a player masks cards with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerKeys {
    pub shuffle_point: Point,
    pub card_points: Vec<Point>,
}

impl PlayerKeys {
    /// Marks a seat nobody took yet.
    pub fn blank(num_cards: usize) -> Self {
        Self {
            shuffle_point: G1Affine::identity(),
            card_points: vec![G1Affine::identity(); num_cards],
        }
    }

    pub fn from_secrets(secrets: &PlayerSecrets) -> Self {
        Self {
            shuffle_point: make_public_point_from_secret(&secrets.shuffle_scalar),
            card_points: secrets
                .card_scalars
                .iter()
                .map(make_public_point_from_secret)
                .collect(),
        }
    }

    pub fn is_blank(&self) -> Choice {
        self.card_points
            .iter()
            .fold(self.shuffle_point.is_identity(), |acc, point| {
                acc & point.is_identity()
            })
    }

    pub fn num_cards(&self) -> usize {
        self.card_points.len()
    }
}

impl ConstantTimeEq for PlayerKeys {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.shuffle_point.ct_eq(&other.shuffle_point)
            & self.card_points.as_slice().ct_eq(other.card_points.as_slice())
    }
}

/// Private keys a player uses to mask and open cards. Never leaves the
/// player, except for single card scalars revealed while dealing.
#[derive(Clone)]
pub struct PlayerSecrets {
    shuffle_scalar: SecretScalar,
    card_scalars: Vec<SecretScalar>,
}

impl fmt::Debug for PlayerSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSecrets")
            .field("num_cards", &self.card_scalars.len())
            .finish_non_exhaustive()
    }
}

impl PlayerSecrets {
    pub fn generate<R: Rng + CryptoRng>(num_cards: usize, rng: &mut R) -> Self {
        Self {
            shuffle_scalar: SecretScalar::random(&mut *rng),
            card_scalars: (0..num_cards)
                .map(|_| SecretScalar::random(&mut *rng))
                .collect(),
        }
    }

    pub fn new(shuffle_scalar: SecretScalar, card_scalars: Vec<SecretScalar>) -> Self {
        Self {
            shuffle_scalar,
            card_scalars,
        }
    }

    pub fn shuffle_scalar(&self) -> &SecretScalar {
        &self.shuffle_scalar
    }

    pub fn card_scalar(&self, index: usize) -> Option<&SecretScalar> {
        self.card_scalars.get(index)
    }

    pub fn num_cards(&self) -> usize {
        self.card_scalars.len()
    }
}

/// Secrets a player disclosed in the public record. Slots stay `None` until
/// revealed, so a revealed zero scalar is not mistaken for a missing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealedSecrets {
    pub shuffle_scalar: Option<SecretScalar>,
    pub card_scalars: Vec<Option<SecretScalar>>,
}

impl RevealedSecrets {
    pub fn blank(num_cards: usize) -> Self {
        Self {
            shuffle_scalar: None,
            card_scalars: vec![None; num_cards],
        }
    }

    pub fn card_scalar(&self, index: usize) -> Option<SecretScalar> {
        self.card_scalars.get(index).copied().flatten()
    }

    pub fn reveal_card(&mut self, index: usize, scalar: SecretScalar) -> Result<(), GameError> {
        let num_cards = self.card_scalars.len();
        let slot = self.card_scalars.get_mut(index).ok_or_else(|| {
            GameError::Argument(format!(
                "card index {index} out of range for {num_cards} secrets"
            ))
        })?;
        *slot = Some(scalar);
        Ok(())
    }

    pub fn num_cards(&self) -> usize {
        self.card_scalars.len()
    }
}

fn slot_ct_eq(a: &Option<SecretScalar>, b: &Option<SecretScalar>) -> Choice {
    let both_absent = choice(a.is_none() && b.is_none());
    let both_present = choice(a.is_some() && b.is_some());
    let values_eq = a.unwrap_or_default().ct_eq(&b.unwrap_or_default());
    both_absent | (both_present & values_eq)
}

impl ConstantTimeEq for RevealedSecrets {
    fn ct_eq(&self, other: &Self) -> Choice {
        let same_len = choice(self.card_scalars.len() == other.card_scalars.len());
        self.card_scalars
            .iter()
            .zip(other.card_scalars.iter())
            .fold(
                same_len & slot_ct_eq(&self.shuffle_scalar, &other.shuffle_scalar),
                |acc, (a, b)| acc & slot_ct_eq(a, b),
            )
    }
}

/// Uniformly random permutation of `0..num_cards`: position `i` of the
/// shuffled deck takes the card at `shuffle[i]`.
pub fn generate_shuffle<R: Rng + CryptoRng>(num_cards: usize, rng: &mut R) -> Vec<usize> {
    let mut shuffle: Vec<usize> = (0..num_cards).collect();
    shuffle.shuffle(rng);
    shuffle
}

pub fn shuffle_array<T: Clone>(items: &[T], shuffle: &[usize]) -> Vec<T> {
    shuffle
        .iter()
        .filter_map(|&index| items.get(index).cloned())
        .collect()
}

pub struct Player {
    secrets: PlayerSecrets,
    public_keys: PlayerKeys,
}

impl Player {
    pub fn new<R: Rng + CryptoRng>(num_cards: usize, rng: &mut R) -> Self {
        Self::from_secrets(PlayerSecrets::generate(num_cards, rng))
    }

    pub fn from_secrets(secrets: PlayerSecrets) -> Self {
        let public_keys = PlayerKeys::from_secrets(&secrets);
        Self {
            secrets,
            public_keys,
        }
    }

    /// The only part of a player other peers get to see.
    pub const fn public_keys(&self) -> &PlayerKeys {
        &self.public_keys
    }

    pub const fn secrets(&self) -> &PlayerSecrets {
        &self.secrets
    }

    fn check_deck(&self, cards: &[Card], action: &str) -> Result<(), GameError> {
        if cards.len() != self.secrets.num_cards() {
            return Err(GameError::Argument(format!(
                "number of cards ({}) and number of keys ({}) must match to {action}",
                cards.len(),
                self.secrets.num_cards()
            )));
        }
        Ok(())
    }

    /// Shuffles the deck, then joins and masks every card with the single
    /// shuffle scalar.
    pub fn shuffle_and_mask_deck<R: Rng + CryptoRng>(
        &self,
        cards: &[Card],
        rng: &mut R,
    ) -> Result<Vec<Card>, GameError> {
        self.check_deck(cards, "shuffle the deck")?;

        let shuffle = generate_shuffle(cards.len(), rng);
        let cards = shuffle_array(cards, &shuffle)
            .iter()
            .map(|card| {
                let joined = add_player_to_card_mask(card, &self.secrets.shuffle_scalar);
                mask_random(&joined, &mut *rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    /// Swaps the shuffle share of every card for a share specific to the
    /// card index, so each card can later be opened on its own.
    pub fn re_mask_each_card<R: Rng + CryptoRng>(
        &self,
        cards: &[Card],
        rng: &mut R,
    ) -> Result<Vec<Card>, GameError> {
        self.check_deck(cards, "re-mask the deck")?;

        let cards = cards
            .iter()
            .zip(self.secrets.card_scalars.iter())
            .map(|(card, card_scalar)| {
                let unmasked = partial_unmask(card, &self.secrets.shuffle_scalar);
                let remaskable = add_player_to_card_mask(&unmasked, card_scalar);
                mask_random(&remaskable, &mut *rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    /// Removes this player's share from the card at `index`, leaving every
    /// other card untouched.
    pub fn open_card(&self, cards: &[Card], index: usize) -> Result<Vec<Card>, GameError> {
        self.check_deck(cards, "open a particular card")?;

        let (Some(card), Some(card_scalar)) = (cards.get(index), self.secrets.card_scalar(index))
        else {
            return Err(GameError::Argument(format!(
                "card index {index} out of range for a deck of {} cards",
                cards.len()
            )));
        };

        let mut cards = cards.to_vec();
        cards[index] = partial_unmask(card, card_scalar);
        Ok(cards)
    }
}
