/// Game State Transition Validation
///
/// Every peer checks each broadcast state against its own last accepted
/// state, looking at public data only. All checks are plain conjunctions of
/// [`Choice`] values computed without early exits, and every data dependent
/// branch is a [`select`]; the same predicates can be laid out as an
/// arithmetic circuit.
///
/// Hidden information cannot be checked here: a player who used the wrong
/// secret while shuffling is only caught once secrets are revealed.
use bls12_381::{G1Affine, G1Projective, Scalar};
use pairing::group::Curve;
use subtle::{Choice, ConstantTimeEq, CtOption};
use zhf_mask::{
    Card, partial_unmask,
    select::{all, choice, select, switch},
    util::make_public_point_from_secret,
};

use crate::{
    config::GameConfig,
    deck::Deck,
    error::ProtocolViolation,
    game_data::{GameData, GameShape, bump_current_player},
    game_state::{CardOwner, GameState},
    player::{PlayerKeys, RevealedSecrets},
};

/// `check` only constrains the transition when `cond` holds.
fn when(cond: Choice, check: Choice) -> Choice {
    !cond | check
}

fn is_state(data: &GameData, state: GameState) -> Choice {
    data.game_state.to_u8().ct_eq(&state.to_u8())
}

fn is_player(current_player: Option<usize>, player: usize) -> Choice {
    choice(current_player == Some(player))
}

fn card_at(deck: &[Card], card_index: usize) -> Card {
    switch(deck, card_index)
}

fn owners(data: &GameData) -> Vec<i64> {
    data.card_owner.iter().map(|owner| owner.to_i64()).collect()
}

fn owner_at(owners: &[i64], card_index: usize) -> i64 {
    switch(owners, card_index)
}

/// Keys of the player who produced `data`, blank if the seat is missing.
fn current_player_keys(data: &GameData) -> PlayerKeys {
    data.current_player_keys()
        .cloned()
        .unwrap_or_else(|| PlayerKeys::blank(data.num_cards()))
}

fn current_player_secrets(data: &GameData) -> RevealedSecrets {
    data.current_player_secrets()
        .cloned()
        .unwrap_or_else(|| RevealedSecrets::blank(data.num_cards()))
}

fn secret_slot(secrets: &RevealedSecrets, card_index: usize) -> CtOption<Scalar> {
    let slot = secrets.card_scalar(card_index);
    CtOption::new(slot.unwrap_or_default(), choice(slot.is_some()))
}

fn point_at(points: &[G1Affine], index: usize) -> G1Affine {
    switch(points, index)
}

fn turn_passed_to_first_player(old: &GameData, new: &GameData, config: &GameConfig) -> Choice {
    is_player(new.current_player, 0)
        & is_player(old.current_player, config.num_players.saturating_sub(1))
}

/// No player keys were modified between the two states.
pub fn check_player_keys_intact(old: &GameData, new: &GameData) -> Choice {
    choice(old.players.len() == new.players.len())
        & all(
            old.players
                .iter()
                .zip(new.players.iter())
                .map(|(old_keys, new_keys)| new_keys.ct_eq(old_keys)),
        )
}

/// The mover took a free seat with real keys and every other seat, taken or
/// not, is untouched. Once every seat is filled nobody may take one again.
/// Nobody reveals secrets while joining.
///
/// Applies while the old and new states are both introductions.
pub fn check_new_player_added_correctly(old: &GameData, new: &GameData) -> Choice {
    let mut result = choice(old.players.len() == new.players.len())
        & choice(old.player_secrets.len() == new.player_secrets.len());

    for (i, (old_keys, new_keys)) in old.players.iter().zip(new.players.iter()).enumerate() {
        let is_mover = is_player(new.current_player, i);
        let already_filled = choice(old.current_player.is_some_and(|player| player > i));
        result &= when(already_filled | !is_mover, new_keys.ct_eq(old_keys));
    }
    result &= all(
        old.player_secrets
            .iter()
            .zip(new.player_secrets.iter())
            .map(|(old_secrets, new_secrets)| new_secrets.ct_eq(old_secrets)),
    );

    result & !current_player_keys(new).is_blank()
}

/// Every seat is taken and nobody touched the deck yet.
///
/// Applies when introductions turn into shuffling.
pub fn check_introductions_finished_correctly(
    old: &GameData,
    new: &GameData,
    config: &GameConfig,
    deck: &Deck,
) -> Choice {
    let mut result = turn_passed_to_first_player(old, new, config);

    result &= all(old.players.iter().map(|keys| !keys.is_blank()));
    result &= choice(old.deck.len() == deck.len());
    result &= all(
        old.deck
            .iter()
            .zip(deck.cards().iter())
            .map(|(card, standard)| card.ct_eq(standard)),
    );

    result & check_player_keys_intact(old, new)
}

/// Every card was re-masked and joined by the mover's shuffle key, the same
/// increment on all cards.
pub fn check_shuffling(old: &GameData, new: &GameData) -> Choice {
    let shuffle_point = current_player_keys(new).shuffle_point;
    let expected_key =
        (G1Projective::from(card_at(&old.deck, 0).aggregate_public_key) + shuffle_point).to_affine();

    let mut result = choice(old.deck.len() == new.deck.len());
    for (old_card, new_card) in old.deck.iter().zip(new.deck.iter()) {
        result &= !new_card.masked_message.ct_eq(&old_card.masked_message);
        result &= new_card.aggregate_public_key.ct_eq(&expected_key);
        result &= !new_card.joint_ephemeral.ct_eq(&old_card.joint_ephemeral);
    }

    result & check_player_keys_intact(old, new)
}

/// Applies when shuffling turns into masking.
pub fn check_shuffling_finished_correctly(
    old: &GameData,
    new: &GameData,
    config: &GameConfig,
) -> Choice {
    turn_passed_to_first_player(old, new, config) & check_player_keys_intact(old, new)
}

/// On every card the mover's shuffle key was swapped for its card key.
pub fn check_masking(old: &GameData, new: &GameData) -> Choice {
    let keys = current_player_keys(new);
    let shuffle_point = G1Projective::from(keys.shuffle_point);

    let mut result = choice(old.deck.len() == new.deck.len());
    for (card_index, (old_card, new_card)) in old.deck.iter().zip(new.deck.iter()).enumerate() {
        let card_point = point_at(&keys.card_points, card_index);
        let expected_key = (G1Projective::from(old_card.aggregate_public_key) - shuffle_point
            + card_point)
            .to_affine();
        result &= !new_card.masked_message.ct_eq(&old_card.masked_message);
        result &= new_card.aggregate_public_key.ct_eq(&expected_key);
        result &= !new_card.joint_ephemeral.ct_eq(&old_card.joint_ephemeral);
    }

    result & check_player_keys_intact(old, new)
}

/// Applies when masking turns into dealing: nothing was dealt yet.
pub fn check_masking_finished_correctly(
    old: &GameData,
    new: &GameData,
    config: &GameConfig,
) -> Choice {
    turn_passed_to_first_player(old, new, config)
        & all(
            old.card_owner
                .iter()
                .map(|owner| owner.to_i64().ct_eq(&CardOwner::FreshStack.to_i64())),
        )
}

/// Opening `old_card` with `secret` gives `new_card`. A missing secret never
/// opens anything.
pub fn check_card_was_unmasked_by_secret(
    new_card: &Card,
    old_card: &Card,
    secret: &CtOption<Scalar>,
) -> Choice {
    let safe_secret = secret.unwrap_or(Scalar::one());
    secret.is_some() & partial_unmask(old_card, &safe_secret).ct_eq(new_card)
}

/// The mover published the secret committed to for this card and it opens
/// the card as claimed.
pub fn check_card_was_opened_correctly(
    secrets: &RevealedSecrets,
    card_index: usize,
    keys: &PlayerKeys,
    new: &GameData,
    old: &GameData,
) -> Choice {
    let secret = secret_slot(secrets, card_index);
    let card_key = point_at(&keys.card_points, card_index);
    let key_matches_commitment = make_public_point_from_secret(&secret.unwrap_or(Scalar::one()))
        .ct_eq(&card_key);

    let new_card = card_at(&new.deck, card_index);
    let old_card = card_at(&old.deck, card_index);
    key_matches_commitment & check_card_was_unmasked_by_secret(&new_card, &old_card, &secret)
}

/// The mover dealt `hand_size` cards to every player from the top of the
/// deck, opening those of the others, then opened one top card. Everything
/// else is left as it was.
pub fn check_dealing(old: &GameData, new: &GameData, config: &GameConfig) -> Choice {
    let total_cards_to_deal = config.cards_to_deal();
    let Some(undealt) = new
        .num_cards()
        .checked_sub(total_cards_to_deal)
        .and_then(|rest| rest.checked_sub(1))
    else {
        return choice(false);
    };

    let keys = current_player_keys(new);
    let secrets = current_player_secrets(new);
    let mover = new
        .current_player
        .map_or(i64::MIN, |player| CardOwner::Player(player).to_i64());
    let new_owners = owners(new);
    let old_owners = owners(old);

    let mut result = choice(old.deck.len() == new.deck.len())
        & choice(old.card_owner.len() == new.card_owner.len());

    let mut card_index = new.num_cards();
    for i in 0..total_cards_to_deal {
        card_index -= 1;
        let expected_owner = CardOwner::Player(i / config.hand_size).to_i64();
        let owner = owner_at(&new_owners, card_index);
        result &= owner.ct_eq(&expected_owner);

        let owner_is_mover = owner.ct_eq(&mover);
        let opened = check_card_was_opened_correctly(&secrets, card_index, &keys, new, old);
        let untouched = card_at(&new.deck, card_index).ct_eq(&card_at(&old.deck, card_index));
        // only cards opened to other players matter
        result &= when(!owner_is_mover, opened) & when(owner_is_mover, untouched);
    }

    card_index -= 1;
    result &= owner_at(&new_owners, card_index).ct_eq(&CardOwner::TopCard.to_i64());
    // every dealer opens the top card, so a revealed one means this seat dealt already
    let old_secrets = new
        .current_player
        .and_then(|player| old.player_secrets.get(player))
        .cloned()
        .unwrap_or_else(|| RevealedSecrets::blank(old.num_cards()));
    result &= !secret_slot(&old_secrets, card_index).is_some();
    result &= check_card_was_opened_correctly(&secrets, card_index, &keys, new, old);

    // rest of the deck stays intact
    for card_index in 0..undealt {
        result &= card_at(&new.deck, card_index).ct_eq(&card_at(&old.deck, card_index));
        result &= owner_at(&new_owners, card_index).ct_eq(&owner_at(&old_owners, card_index));
    }

    // secrets of the other players stay as published
    result &= choice(old.player_secrets.len() == new.player_secrets.len());
    for (player, (old_secrets, new_secrets)) in old
        .player_secrets
        .iter()
        .zip(new.player_secrets.iter())
        .enumerate()
    {
        let is_mover = is_player(new.current_player, player);
        result &= when(!is_mover, new_secrets.ct_eq(old_secrets));
    }

    result & check_player_keys_intact(old, new)
}

/// Every predicate of a transition, each paired with the diagnostic for its
/// failure, in reporting order. All of them are always evaluated.
pub fn transition_checks(
    config: &GameConfig,
    deck: &Deck,
    old: &GameData,
    new: &GameData,
) -> Vec<(Choice, ProtocolViolation)> {
    use GameState::{Deal, Introductions, Mask, Shuffle};
    use ProtocolViolation::{
        Malformed, NotCompletedCorrectly, NotPerformedCorrectly, OutOfOrder, WrongNonce,
        WrongPlayer,
    };

    let shape = GameShape::from_config(config, deck.len());
    let well_formed = choice(
        config.validate(deck.len()).is_ok() && old.has_shape(shape) && new.has_shape(shape),
    );

    let nonce = choice(old.nonce.checked_add(1) == Some(new.nonce));
    let expected_player = bump_current_player(old.current_player, config.num_players);
    let player = is_player(new.current_player, expected_player);

    let is_introductions = is_state(new, Introductions);
    let was_introductions = is_state(old, Introductions);
    let is_shuffle = is_state(new, Shuffle);
    let was_shuffle = is_state(old, Shuffle);
    let is_mask = is_state(new, Mask);
    let was_mask = is_state(old, Mask);
    let is_deal = is_state(new, Deal);
    let was_deal = is_state(old, Deal);

    vec![
        (well_formed, Malformed),
        (nonce, WrongNonce),
        (player, WrongPlayer),
        (
            when(
                is_introductions,
                was_introductions & check_new_player_added_correctly(old, new),
            ),
            NotPerformedCorrectly(Introductions),
        ),
        (
            when(is_shuffle, was_shuffle | was_introductions),
            OutOfOrder {
                phase: Shuffle,
                previous: Introductions,
            },
        ),
        (
            when(
                is_shuffle & was_introductions,
                check_introductions_finished_correctly(old, new, config, deck),
            ),
            NotCompletedCorrectly(Introductions),
        ),
        (
            when(is_shuffle, check_shuffling(old, new)),
            NotPerformedCorrectly(Shuffle),
        ),
        (
            when(is_mask, was_mask | was_shuffle),
            OutOfOrder {
                phase: Mask,
                previous: Shuffle,
            },
        ),
        (
            when(
                is_mask & was_shuffle,
                check_shuffling_finished_correctly(old, new, config),
            ),
            NotCompletedCorrectly(Shuffle),
        ),
        (
            when(is_mask, check_masking(old, new)),
            NotPerformedCorrectly(Mask),
        ),
        (
            when(is_deal, was_mask | was_deal),
            OutOfOrder {
                phase: Deal,
                previous: Mask,
            },
        ),
        (
            when(
                is_deal & was_mask,
                check_masking_finished_correctly(old, new, config),
            ),
            NotCompletedCorrectly(Mask),
        ),
        (
            when(is_deal, check_dealing(old, new, config)),
            NotPerformedCorrectly(Deal),
        ),
    ]
}

/// Conjunction of all transition checks, as a circuit would output it.
pub fn transition_holds(
    config: &GameConfig,
    deck: &Deck,
    old: &GameData,
    new: &GameData,
) -> Choice {
    all(transition_checks(config, deck, old, new)
        .into_iter()
        .map(|(holds, _)| holds))
}

/// Checks that `new` may follow `old`, naming the first rule that was broken.
///
/// Read-only on both states; a rejected state is simply dropped by the
/// caller.
pub fn is_valid_transition(
    config: &GameConfig,
    deck: &Deck,
    old: &GameData,
    new: &GameData,
) -> Result<(), ProtocolViolation> {
    let failed = transition_checks(config, deck, old, new)
        .into_iter()
        .find(|(holds, _)| !bool::from(*holds));

    match failed {
        Some((_, violation)) => {
            tracing::warn!(
                %violation,
                old_nonce = old.nonce,
                new_nonce = new.nonce,
                player = ?new.current_player,
                "rejected transition"
            );
            Err(violation)
        }
        None => {
            tracing::debug!(nonce = new.nonce, state = %new.game_state, "accepted transition");
            Ok(())
        }
    }
}
