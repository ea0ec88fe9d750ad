use bls12_381::G1Affine;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::types::Point;

/// A playing card, masked or not.
///
/// Mapping between card points and actual card faces happens at the
/// application level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    /// Accumulated ephemeral keys of all masking operations.
    pub joint_ephemeral: Point,
    /// The card point, or its masked value.
    pub masked_message: Point,
    /// Sum of the public keys of every player currently masking the card.
    pub aggregate_public_key: Point,
}

impl Card {
    pub const fn new(
        joint_ephemeral: Point,
        masked_message: Point,
        aggregate_public_key: Point,
    ) -> Self {
        Self {
            joint_ephemeral,
            masked_message,
            aggregate_public_key,
        }
    }

    /// Fresh card nobody has joined yet.
    pub fn unjoined(card_point: Point) -> Self {
        Self::new(G1Affine::identity(), card_point, G1Affine::identity())
    }

    pub fn is_unjoined(&self) -> Choice {
        self.aggregate_public_key.is_identity()
    }
}

impl Default for Card {
    fn default() -> Self {
        Self::unjoined(G1Affine::identity())
    }
}

impl ConstantTimeEq for Card {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.joint_ephemeral.ct_eq(&other.joint_ephemeral)
            & self.masked_message.ct_eq(&other.masked_message)
            & self.aggregate_public_key.ct_eq(&other.aggregate_public_key)
    }
}

impl ConditionallySelectable for Card {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            joint_ephemeral: G1Affine::conditional_select(
                &a.joint_ephemeral,
                &b.joint_ephemeral,
                choice,
            ),
            masked_message: G1Affine::conditional_select(
                &a.masked_message,
                &b.masked_message,
                choice,
            ),
            aggregate_public_key: G1Affine::conditional_select(
                &a.aggregate_public_key,
                &b.aggregate_public_key,
                choice,
            ),
        }
    }
}
