/// Commutative (Un)Masking
///
/// Cards are masked ElGamal style under the aggregate public key of every
/// player that joined the card. A card joined by players holding `x = Σ sᵢ`
/// always satisfies `masked_message = card_point + x * joint_ephemeral`,
/// which is why the shares can be removed in any order.
use bls12_381::{G1Affine, G1Projective};
use ff::Field;
use pairing::group::Curve;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

use crate::{
    card::Card,
    select::select,
    types::{Point, SecretScalar},
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MaskError {
    #[error("illegal_operation: unable to mask as there are no players available to unmask")]
    NoJoinedPlayers,
}

/// Shared secret between a local private scalar and a remote public point.
pub fn shared_secret(local: &SecretScalar, remote: &Point) -> G1Projective {
    remote * local
}

/// Adds a player to the masking of a card.
///
/// The card is not hidden by this alone, it must be followed by [`mask`].
pub fn add_player_to_card_mask(card: &Card, secret: &SecretScalar) -> Card {
    let is_unjoined = card.is_unjoined();
    let aggregate_public_key =
        (G1Projective::from(card.aggregate_public_key) + G1Affine::generator() * secret).to_affine();
    // an unjoined card has no ephemeral key yet
    let ephemeral = select(is_unjoined, &G1Affine::generator(), &card.joint_ephemeral);
    let joined_message =
        (G1Projective::from(card.masked_message) + shared_secret(secret, &ephemeral)).to_affine();
    let masked_message = select(is_unjoined, &card.masked_message, &joined_message);
    Card::new(card.joint_ephemeral, masked_message, aggregate_public_key)
}

/// Re-randomizes a joined card with `nonce`. The nonce must never be reused.
///
/// Masking the same card several times is harmless.
pub fn mask(card: &Card, nonce: &SecretScalar) -> Result<Card, MaskError> {
    if bool::from(card.is_unjoined()) {
        return Err(MaskError::NoJoinedPlayers);
    }
    let joint_ephemeral =
        (G1Projective::from(card.joint_ephemeral) + G1Affine::generator() * nonce).to_affine();
    let masked_message = (G1Projective::from(card.masked_message)
        + shared_secret(nonce, &card.aggregate_public_key))
    .to_affine();
    Ok(Card::new(
        joint_ephemeral,
        masked_message,
        card.aggregate_public_key,
    ))
}

/// [`mask`] with a fresh nonce.
pub fn mask_random<R: RngCore + CryptoRng>(card: &Card, rng: &mut R) -> Result<Card, MaskError> {
    mask(card, &SecretScalar::random(rng))
}

/// Removes exactly one player share from a card.
///
/// Nothing checks that `secret` belongs to a player who joined the card; a
/// wrong secret leaves a card that can never be opened.
pub fn partial_unmask(card: &Card, secret: &SecretScalar) -> Card {
    let masked_message = (G1Projective::from(card.masked_message)
        - shared_secret(secret, &card.joint_ephemeral))
    .to_affine();
    let aggregate_public_key =
        (G1Projective::from(card.aggregate_public_key) - G1Affine::generator() * secret).to_affine();
    // last share removed: the card is open and needs re-joining before masking
    let joint_ephemeral = select(
        aggregate_public_key.is_identity(),
        &G1Affine::identity(),
        &card.joint_ephemeral,
    );
    Card::new(joint_ephemeral, masked_message, aggregate_public_key)
}
