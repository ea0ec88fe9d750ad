use thiserror::Error;
use zhf_mask::MaskError;

use crate::game_state::GameState;

#[derive(Debug, Error)]
pub enum GameError {
    /// Caller bug: wrong deck length, card index out of range, bad config.
    #[error("illegal_argument: {0}")]
    Argument(String),
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A proposed transition broke the rules. Expected when a peer is buggy or
/// malicious; the proposed state is discarded and the game goes on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("game data does not match the game configuration")]
    Malformed,
    #[error("wrong nonce. must increase by 1")]
    WrongNonce,
    #[error("wrong player is trying to make a move")]
    WrongPlayer,
    #[error("failed to check {0} was performed correctly")]
    NotPerformedCorrectly(GameState),
    #[error("failed to check {0} was completed correctly")]
    NotCompletedCorrectly(GameState),
    #[error("{} can only be done after {}", .phase.activity(), .previous.activity())]
    OutOfOrder {
        phase: GameState,
        previous: GameState,
    },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("expected {expected} field elements, got {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("field element {position} is not a valid {kind}")]
    InvalidField {
        position: usize,
        kind: &'static str,
    },
    #[error("invalid decimal field element: {0}")]
    InvalidDecimal(String),
    #[error("unexpected message type: {0}")]
    UnexpectedMessage(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
