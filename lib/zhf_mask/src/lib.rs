//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

pub mod card;
pub mod hash_to_scalar;
pub mod mask;
pub mod select;
pub mod types;
pub mod util;

pub use card::Card;
pub use mask::{MaskError, add_player_to_card_mask, mask, mask_random, partial_unmask};
