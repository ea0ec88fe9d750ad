//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use bls12_381::{G1Affine, Scalar};

/// Private key material: shuffle scalars, per-card scalars and masking nonces.
pub type SecretScalar = Scalar;
/// Public key material and card points.
pub type Point = G1Affine;
