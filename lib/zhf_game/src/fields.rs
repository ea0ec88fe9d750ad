//! Canonical field-element encoding of [`GameData`].
//!
//! The layout is flat, fixed-length for a given [`GameShape`] and order
//! preserving, so an arithmetic-circuit backend can take it as its public
//! input and peers can ship it as a JSON array of decimal strings:
//!
//! nonce, current player, deck (3 points per card), card owners,
//! player keys (shuffle point + one point per card), revealed secrets
//! (tag + value per slot), game state, challenge.
//!
//! Points take two field elements (24 byte limbs of the compressed
//! encoding), negative integers are field negations.

use std::str::FromStr;

use alloy_primitives::U256;
use bls12_381::Scalar;
use zhf_mask::{
    Card,
    types::{Point, SecretScalar},
    util::{POINT_COMPRESSED_LEN, make_point_from_compressed_slice},
};

use crate::{
    error::CodecError,
    game_data::{GameData, GameShape},
    game_state::{CardOwner, GameState},
    player::{PlayerKeys, RevealedSecrets},
};

pub type FieldElement = Scalar;

const LIMB_LEN: usize = POINT_COMPRESSED_LEN / 2;
const FIELDS_PER_POINT: usize = 2;
const FIELDS_PER_SLOT: usize = 2;

/// Number of field elements a game of this shape encodes to.
pub const fn field_count(shape: GameShape) -> usize {
    let keys_per_player = 1 + shape.num_cards;
    2 + shape.num_cards * 3 * FIELDS_PER_POINT
        + shape.num_cards
        + shape.num_players * keys_per_player * FIELDS_PER_POINT
        + shape.num_players * keys_per_player * FIELDS_PER_SLOT
        + 2
}

fn small_value(field: &FieldElement) -> Option<u64> {
    let bytes = field.to_bytes();
    if bytes[8..].iter().any(|b| *b != 0) {
        return None;
    }
    let mut value = [0u8; 8];
    value.copy_from_slice(&bytes[..8]);
    Some(u64::from_le_bytes(value))
}

fn int_to_field(value: i64) -> FieldElement {
    if value < 0 {
        -FieldElement::from(value.unsigned_abs())
    } else {
        FieldElement::from(value.unsigned_abs())
    }
}

fn limb_to_field(limb: &[u8]) -> FieldElement {
    let mut words = [0u64; 4];
    for (word, chunk) in words.iter_mut().zip(limb.chunks(8)) {
        let mut bytes = [0u8; 8];
        bytes[..chunk.len()].copy_from_slice(chunk);
        *word = u64::from_le_bytes(bytes);
    }
    FieldElement::from_raw(words)
}

struct FieldWriter {
    fields: Vec<FieldElement>,
}

impl FieldWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    fn int(&mut self, value: i64) {
        self.fields.push(int_to_field(value));
    }

    fn uint(&mut self, value: u64) {
        self.fields.push(FieldElement::from(value));
    }

    fn point(&mut self, point: &Point) {
        let bytes = point.to_compressed();
        self.fields.push(limb_to_field(&bytes[..LIMB_LEN]));
        self.fields.push(limb_to_field(&bytes[LIMB_LEN..]));
    }

    fn card(&mut self, card: &Card) {
        self.point(&card.joint_ephemeral);
        self.point(&card.masked_message);
        self.point(&card.aggregate_public_key);
    }

    fn slot(&mut self, slot: &Option<SecretScalar>) {
        match slot {
            Some(value) => {
                self.fields.push(FieldElement::one());
                self.fields.push(*value);
            }
            None => {
                self.fields.push(FieldElement::zero());
                self.fields.push(FieldElement::zero());
            }
        }
    }
}

struct FieldReader<'a> {
    fields: &'a [FieldElement],
    position: usize,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a [FieldElement]) -> Self {
        Self {
            fields,
            position: 0,
        }
    }

    fn invalid(&self, kind: &'static str) -> CodecError {
        CodecError::InvalidField {
            position: self.position,
            kind,
        }
    }

    fn next(&mut self) -> Result<FieldElement, CodecError> {
        let field = self
            .fields
            .get(self.position)
            .copied()
            .ok_or_else(|| self.invalid("field element"))?;
        self.position += 1;
        Ok(field)
    }

    fn uint(&mut self, kind: &'static str) -> Result<u64, CodecError> {
        let field = self.next()?;
        small_value(&field).ok_or_else(|| self.invalid(kind))
    }

    fn int(&mut self, kind: &'static str) -> Result<i64, CodecError> {
        let field = self.next()?;
        if let Some(value) = small_value(&field) {
            return i64::try_from(value).map_err(|_| self.invalid(kind));
        }
        small_value(&-field)
            .and_then(|magnitude| i64::try_from(magnitude).ok())
            .map(|magnitude| -magnitude)
            .ok_or_else(|| self.invalid(kind))
    }

    fn limb(&mut self) -> Result<[u8; LIMB_LEN], CodecError> {
        let bytes = self.next()?.to_bytes();
        if bytes[LIMB_LEN..].iter().any(|b| *b != 0) {
            return Err(self.invalid("point limb"));
        }
        let mut limb = [0u8; LIMB_LEN];
        limb.copy_from_slice(&bytes[..LIMB_LEN]);
        Ok(limb)
    }

    fn point(&mut self) -> Result<Point, CodecError> {
        let mut bytes = [0u8; POINT_COMPRESSED_LEN];
        bytes[..LIMB_LEN].copy_from_slice(&self.limb()?);
        bytes[LIMB_LEN..].copy_from_slice(&self.limb()?);
        make_point_from_compressed_slice(&bytes).map_err(|_| self.invalid("point"))
    }

    fn card(&mut self) -> Result<Card, CodecError> {
        Ok(Card::new(self.point()?, self.point()?, self.point()?))
    }

    fn slot(&mut self) -> Result<Option<SecretScalar>, CodecError> {
        let tag = self.uint("slot tag")?;
        let value = self.next()?;
        match tag {
            1 => Ok(Some(value)),
            0 if value == FieldElement::zero() => Ok(None),
            _ => Err(self.invalid("secret slot")),
        }
    }

    fn current_player(&mut self, num_players: usize) -> Result<Option<usize>, CodecError> {
        match self.int("current player")? {
            -1 => Ok(None),
            player if player >= 0 && (player as u64) < num_players as u64 => {
                Ok(Some(player as usize))
            }
            _ => Err(self.invalid("current player")),
        }
    }

    fn card_owner(&mut self) -> Result<CardOwner, CodecError> {
        let value = self.int("card owner")?;
        CardOwner::from_i64(value).ok_or_else(|| self.invalid("card owner"))
    }

    fn game_state(&mut self) -> Result<GameState, CodecError> {
        let value = self.uint("game state")?;
        u8::try_from(value)
            .ok()
            .and_then(GameState::from_u8)
            .ok_or_else(|| self.invalid("game state"))
    }
}

impl GameData {
    pub fn to_fields(&self) -> Vec<FieldElement> {
        let mut writer = FieldWriter::with_capacity(field_count(self.shape()));

        writer.uint(self.nonce);
        writer.int(self.current_player.map_or(-1, |player| player as i64));
        self.deck.iter().for_each(|card| writer.card(card));
        self.card_owner
            .iter()
            .for_each(|owner| writer.int(owner.to_i64()));
        for keys in &self.players {
            writer.point(&keys.shuffle_point);
            keys.card_points.iter().for_each(|point| writer.point(point));
        }
        for secrets in &self.player_secrets {
            writer.slot(&secrets.shuffle_scalar);
            secrets.card_scalars.iter().for_each(|slot| writer.slot(slot));
        }
        writer.uint(self.game_state.to_u8() as u64);
        writer.uint(self.challenge);

        writer.fields
    }

    pub fn from_fields(fields: &[FieldElement], shape: GameShape) -> Result<Self, CodecError> {
        let expected = field_count(shape);
        if fields.len() != expected {
            return Err(CodecError::FieldCount {
                expected,
                actual: fields.len(),
            });
        }

        let mut reader = FieldReader::new(fields);

        let nonce = reader.uint("nonce")?;
        let current_player = reader.current_player(shape.num_players)?;
        let deck = (0..shape.num_cards)
            .map(|_| reader.card())
            .collect::<Result<Vec<_>, _>>()?;
        let card_owner = (0..shape.num_cards)
            .map(|_| reader.card_owner())
            .collect::<Result<Vec<_>, _>>()?;
        let mut players = Vec::with_capacity(shape.num_players);
        for _ in 0..shape.num_players {
            let shuffle_point = reader.point()?;
            let card_points = (0..shape.num_cards)
                .map(|_| reader.point())
                .collect::<Result<Vec<_>, _>>()?;
            players.push(PlayerKeys {
                shuffle_point,
                card_points,
            });
        }
        let mut player_secrets = Vec::with_capacity(shape.num_players);
        for _ in 0..shape.num_players {
            let shuffle_scalar = reader.slot()?;
            let card_scalars = (0..shape.num_cards)
                .map(|_| reader.slot())
                .collect::<Result<Vec<_>, _>>()?;
            player_secrets.push(RevealedSecrets {
                shuffle_scalar,
                card_scalars,
            });
        }
        let game_state = reader.game_state()?;
        let challenge = reader.uint("challenge")?;

        Ok(Self {
            nonce,
            current_player,
            deck,
            card_owner,
            players,
            player_secrets,
            game_state,
            challenge,
        })
    }

    /// JSON array of decimal strings.
    pub fn serialize(&self) -> Result<String, CodecError> {
        let decimals: Vec<String> = self.to_fields().iter().map(field_to_decimal).collect();
        Ok(serde_json::to_string(&decimals)?)
    }

    pub fn parse(input: &str, shape: GameShape) -> Result<Self, CodecError> {
        let decimals: Vec<String> = serde_json::from_str(input)?;
        let fields = decimals
            .iter()
            .map(|decimal| decimal_to_field(decimal))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_fields(&fields, shape)
    }
}

pub fn field_to_decimal(field: &FieldElement) -> String {
    U256::from_le_bytes(field.to_bytes()).to_string()
}

pub fn decimal_to_field(decimal: &str) -> Result<FieldElement, CodecError> {
    if decimal.is_empty() || !decimal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidDecimal(decimal.to_string()));
    }
    let value =
        U256::from_str(decimal).map_err(|_| CodecError::InvalidDecimal(decimal.to_string()))?;
    FieldElement::from_bytes(&value.to_le_bytes::<32>())
        .into_option()
        .ok_or_else(|| CodecError::InvalidDecimal(decimal.to_string()))
}
