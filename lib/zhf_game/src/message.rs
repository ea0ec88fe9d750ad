use serde::{Deserialize, Serialize};

use crate::{
    error::{CodecError, GameError},
    game_data::{GameData, GameShape},
};

pub const NEW_GAME_STATE: &str = "new_game_state";

/// Envelope broadcast to every peer after a move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub game_id: String,
    /// Serialized field elements of the proposed [`GameData`].
    pub game_data: String,
}

impl GameMessage {
    pub fn new_game_state(game_id: impl Into<String>, game: &GameData) -> Result<Self, GameError> {
        Ok(Self {
            kind: NEW_GAME_STATE.to_string(),
            game_id: game_id.into(),
            game_data: game.serialize()?,
        })
    }

    /// Decodes the carried state, laid out for `shape`.
    pub fn game_data(&self, shape: GameShape) -> Result<GameData, GameError> {
        if self.kind != NEW_GAME_STATE {
            return Err(CodecError::UnexpectedMessage(self.kind.clone()).into());
        }
        Ok(GameData::parse(&self.game_data, shape)?)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        serde_json::to_string(self).map_err(|err| CodecError::from(err).into())
    }

    pub fn from_json(input: &str) -> Result<Self, GameError> {
        serde_json::from_str(input).map_err(|err| CodecError::from(err).into())
    }
}
