//! Crumble (CRyptographic gaMBLE)
//!
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//!
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use std::{collections::VecDeque, fmt};

use clap::Parser;
use itertools::Itertools;
use rand::{rngs::ThreadRng, thread_rng};
use zhf_game::{
    CardFace, Deck, GameConfig, GameData, GameError, GameMessage, GameShape, GameState, Player,
    config::{INITIAL_NUM_CARDS, NUM_PLAYERS},
    deck::UNKNOWN_CARD,
    game_actions::{
        apply_mask, apply_shuffle, broadcast_demo_state, create_game, deal_first_hand, join_game,
        known_cards,
    },
    is_valid_transition,
};

/// Every seat gets a turn per phase; anything beyond that means peers stopped agreeing.
const MAX_ROUNDS: usize = 64;

#[derive(Debug, Parser)]
#[command(
    name = "zhf_bot",
    about = "Plays shuffle and deal between bots sharing one broadcast queue"
)]
struct Args {
    /// Number of seats at the table.
    #[arg(long, env = "ZHF_PLAYERS", default_value_t = NUM_PLAYERS)]
    players: usize,
    /// Cards dealt to each player.
    #[arg(long, env = "ZHF_HAND_SIZE", default_value_t = INITIAL_NUM_CARDS)]
    hand_size: usize,
    /// Seat that tries to cheat once while shuffling.
    #[arg(long)]
    cheater: Option<usize>,
    #[arg(long, default_value = "zhf-table")]
    game_id: String,
}

pub struct CardFaces(Vec<Option<CardFace>>);

#[cfg(not(feature = "fancy_cards"))]
impl fmt::Display for CardFaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces = self
            .0
            .iter()
            .map(|face| face.as_ref().map_or(UNKNOWN_CARD, CardFace::as_str))
            .join(", ");
        f.write_str(&faces)
    }
}

#[cfg(feature = "fancy_cards")]
fn card_glyph(face: &str) -> Option<char> {
    let base = match face {
        "Black Joker" => return char::from_u32(0x1F0CF),
        "Red Joker" => return char::from_u32(0x1F0BF),
        _ => {
            let (_, suit) = face.split_once(" of ")?;
            match suit {
                "Spades" => 0x1F0A0,
                "Hearts" => 0x1F0B0,
                "Diamonds" => 0x1F0C0,
                "Clubs" => 0x1F0D0,
                _ => return None,
            }
        }
    };
    let (rank, _) = face.split_once(" of ")?;
    // the block has a Knight between Jack and Queen
    let offset = match rank {
        "Ace" => 1,
        "Jack" => 11,
        "Queen" => 13,
        "King" => 14,
        number => number.parse::<u32>().ok().filter(|n| (2..=10).contains(n))?,
    };
    char::from_u32(base + offset)
}

#[cfg(feature = "fancy_cards")]
impl fmt::Display for CardFaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces = self
            .0
            .iter()
            .map(|face| match face {
                Some(face) => card_glyph(face.as_str())
                    .map_or_else(|| face.to_string(), |glyph| glyph.to_string()),
                None => UNKNOWN_CARD.to_string(),
            })
            .join(", ");
        f.write_str(&faces)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Move {
    Join,
    Shuffle,
    Mask,
    Deal,
    Demo,
}

/// One peer: its secrets and the last state it accepted.
pub struct GameBot {
    seat: usize,
    player: Player,
    accepted: GameData,
    cheat_pending: bool,
    rng: ThreadRng,
}

impl GameBot {
    pub fn new(seat: usize, genesis: GameData, cheater: bool) -> Self {
        let mut rng = thread_rng();
        let player = Player::new(genesis.num_cards(), &mut rng);
        Self {
            seat,
            player,
            accepted: genesis,
            cheat_pending: cheater,
            rng,
        }
    }

    /// What this bot does next, judged from the last accepted state alone.
    fn next_move(&self) -> Option<Move> {
        if self.accepted.next_player() != self.seat {
            return None;
        }
        let seat_taken = self
            .accepted
            .players
            .get(self.seat)
            .is_some_and(|keys| !bool::from(keys.is_blank()));
        // the last seat finished the phase, the turn is back at the first
        let everyone_moved = self.accepted.next_player() == 0;

        match (self.accepted.game_state, everyone_moved) {
            (GameState::Introductions, _) if !seat_taken => Some(Move::Join),
            (GameState::Introductions, _) | (GameState::Shuffle, false) => Some(Move::Shuffle),
            (GameState::Shuffle, true) | (GameState::Mask, false) => Some(Move::Mask),
            (GameState::Mask, true) | (GameState::Deal, false) => Some(Move::Deal),
            (GameState::Deal, true) => Some(Move::Demo),
            _ => None,
        }
    }

    /// Proposes the next state if it is this bot's turn.
    pub fn act(&mut self, config: &GameConfig) -> Result<Option<GameData>, GameError> {
        let Some(next_move) = self.next_move() else {
            return Ok(None);
        };
        let old = &self.accepted;
        let player = self.seat + 1;

        let new = match next_move {
            Move::Join => {
                tracing::info!("Player {} joins", player);
                join_game(old, self.player.public_keys())?
            }
            Move::Shuffle if self.cheat_pending => {
                self.cheat_pending = false;
                tracing::info!("Shuffle on Player {} with keys nobody knows", player);
                let impostor = Player::new(old.num_cards(), &mut self.rng);
                apply_shuffle(old, &impostor, &mut self.rng)?
            }
            Move::Shuffle => {
                tracing::info!("Shuffle on Player {}", player);
                apply_shuffle(old, &self.player, &mut self.rng)?
            }
            Move::Mask => {
                tracing::info!("Mask on Player {}", player);
                apply_mask(old, &self.player, &mut self.rng)?
            }
            Move::Deal => {
                tracing::info!("Deal on Player {}", player);
                deal_first_hand(old, &self.player, config)?
            }
            Move::Demo => {
                tracing::info!("Player {} shows the table", player);
                broadcast_demo_state(old)
            }
        };
        Ok(Some(new))
    }

    /// Validates a broadcast state against the last accepted one. Rejected
    /// states are dropped.
    pub fn receive(&mut self, message: &str, config: &GameConfig, deck: &Deck) {
        let shape = GameShape::from_config(config, deck.len());
        let proposed = match GameMessage::from_json(message).and_then(|m| m.game_data(shape)) {
            Ok(proposed) => proposed,
            Err(err) => {
                tracing::warn!("Player {} ignores message: {}", self.seat + 1, err);
                return;
            }
        };
        match is_valid_transition(config, deck, &self.accepted, &proposed) {
            Ok(()) => self.accepted = proposed,
            Err(violation) => {
                tracing::warn!(
                    "Player {} rejects state {}: {}",
                    self.seat + 1,
                    proposed.nonce,
                    violation
                )
            }
        }
    }

    pub fn show_cards(&self, deck: &Deck) -> Result<(), GameError> {
        let known = known_cards(&self.accepted, &self.player, self.seat, deck)?;
        tracing::info!(
            "Player {} cards: {} | top card: {}",
            self.seat + 1,
            CardFaces(known.hand),
            CardFaces(vec![known.top_card])
        );
        Ok(())
    }
}

fn run(args: &Args) -> Result<(), GameError> {
    let config = GameConfig::new(args.players, args.hand_size);
    let deck = Deck::standard_with_jokers();
    let genesis = create_game(deck, &config)?;

    let mut bots: Vec<_> = (0..config.num_players)
        .map(|seat| GameBot::new(seat, genesis.clone(), args.cheater == Some(seat)))
        .collect();
    let mut queue = VecDeque::new();

    for _ in 0..MAX_ROUNDS {
        for bot in bots.iter_mut() {
            if let Some(new) = bot.act(&config)? {
                queue.push_back(GameMessage::new_game_state(&args.game_id, &new)?.to_json()?);
            }
        }
        if queue.is_empty() {
            break;
        }
        while let Some(message) = queue.pop_front() {
            for bot in bots.iter_mut() {
                bot.receive(&message, &config, deck);
            }
        }
    }

    let finished = bots
        .iter()
        .all(|bot| bot.accepted.game_state == GameState::Demo);
    if !finished {
        return Err(GameError::Argument("peers stopped agreeing on the game".into()));
    }

    tracing::info!("Hand dealt");
    bots.iter().try_for_each(|bot| bot.show_cards(deck))
}

fn init_logging() {
    if cfg!(feature = "pure_output") {
        tracing_subscriber::fmt()
            .with_target(false) // Removes "zhf_bot:"
            .with_level(false) // Removes "INFO"
            .without_time() // Removes the timestamp
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}

pub fn main() {
    init_logging();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        tracing::error!("Error: {}", err);
        std::process::exit(1);
    }
}
