//! Crumble (CRyptographic gaMBLE)
//! 
//! Mental Poker (1979) implemented using Boneh–Lynn–Shacham (BLS) cryptography.
//! Designed by the Sonia Code & Gemini AI (2026)
//! 
//! Copyright (c) 2026 Sonia Code; See LICENSE file for license details.

use bls12_381::G1Projective;
use pairing::group::Curve;

use crate::types::{Point, SecretScalar};

pub const POINT_COMPRESSED_LEN: usize = 48;

pub fn make_point_from_compressed_slice(data: &[u8]) -> Result<Point, &'static str> {
    if data.len() != POINT_COMPRESSED_LEN {
        return Err("Len Error");
    }
    let mut bytes = [0u8; POINT_COMPRESSED_LEN];
    bytes.copy_from_slice(data);
    Point::from_compressed(&bytes)
        .into_option()
        .ok_or("Decode Error")
}

/// `secret * G`
pub fn make_public_point_from_secret(secret: &SecretScalar) -> Point {
    (G1Projective::generator() * secret).to_affine()
}
