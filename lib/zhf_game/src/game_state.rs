use std::fmt;

pub const GAME_STATE_INTRODUCTIONS: u8 = 0;
pub const GAME_STATE_SHUFFLE: u8 = 1;
pub const GAME_STATE_MASK: u8 = 2;
pub const GAME_STATE_DEAL: u8 = 3;
pub const GAME_STATE_PLAY_CARD: u8 = 4;
pub const GAME_STATE_REQUEST_CARD: u8 = 5;
pub const GAME_STATE_PLAY_CHALLENGE: u8 = 6;
pub const GAME_STATE_FAIL_CHALLENGE: u8 = 7;
pub const GAME_STATE_WIN: u8 = 8;
pub const GAME_STATE_DEMO: u8 = 9;

/// Shuffled cards laying face-down, in deck order.
pub const FRESH_STACK: i64 = -1;
/// Played cards stacked face-up.
pub const DISCARD_STACK: i64 = -2;
/// Top card of the discard stack. There can be only one of these.
pub const TOP_CARD: i64 = -3;

/// Phases of a game. Every phase is visited by each player in turn before
/// the next one may start. Phases after `Deal` carry no rules yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameState {
    Introductions = GAME_STATE_INTRODUCTIONS,
    Shuffle = GAME_STATE_SHUFFLE,
    Mask = GAME_STATE_MASK,
    Deal = GAME_STATE_DEAL,
    PlayCard = GAME_STATE_PLAY_CARD,
    RequestCard = GAME_STATE_REQUEST_CARD,
    PlayChallenge = GAME_STATE_PLAY_CHALLENGE,
    FailChallenge = GAME_STATE_FAIL_CHALLENGE,
    Win = GAME_STATE_WIN,
    Demo = GAME_STATE_DEMO,
}

impl GameState {
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            GAME_STATE_INTRODUCTIONS => Some(Self::Introductions),
            GAME_STATE_SHUFFLE => Some(Self::Shuffle),
            GAME_STATE_MASK => Some(Self::Mask),
            GAME_STATE_DEAL => Some(Self::Deal),
            GAME_STATE_PLAY_CARD => Some(Self::PlayCard),
            GAME_STATE_REQUEST_CARD => Some(Self::RequestCard),
            GAME_STATE_PLAY_CHALLENGE => Some(Self::PlayChallenge),
            GAME_STATE_FAIL_CHALLENGE => Some(Self::FailChallenge),
            GAME_STATE_WIN => Some(Self::Win),
            GAME_STATE_DEMO => Some(Self::Demo),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Introductions => "introductions",
            Self::Shuffle => "shuffle",
            Self::Mask => "mask",
            Self::Deal => "deal",
            Self::PlayCard => "playCard",
            Self::RequestCard => "requestCard",
            Self::PlayChallenge => "playChallenge",
            Self::FailChallenge => "failChallenge",
            Self::Win => "win",
            Self::Demo => "demo",
        }
    }

    /// What a player does during this phase, as used in diagnostics.
    pub const fn activity(self) -> &'static str {
        match self {
            Self::Introductions => "introductions",
            Self::Shuffle => "shuffling",
            Self::Mask => "masking",
            Self::Deal => "dealing",
            other => other.name(),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameState.{}", self.name())
    }
}

/// Where a card in the deck belongs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardOwner {
    Player(usize),
    FreshStack,
    DiscardStack,
    TopCard,
}

impl CardOwner {
    pub fn to_i64(self) -> i64 {
        match self {
            // no table is that large; saturating keeps it clear of the sentinels
            Self::Player(player) => i64::try_from(player).unwrap_or(i64::MAX),
            Self::FreshStack => FRESH_STACK,
            Self::DiscardStack => DISCARD_STACK,
            Self::TopCard => TOP_CARD,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            FRESH_STACK => Some(Self::FreshStack),
            DISCARD_STACK => Some(Self::DiscardStack),
            TOP_CARD => Some(Self::TopCard),
            player if player >= 0 => usize::try_from(player).ok().map(Self::Player),
            _ => None,
        }
    }
}
