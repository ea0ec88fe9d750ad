/// Hash-to-point for card faces
use alloy_primitives::Keccak256;
use bls12_381::Scalar;

use crate::{types::Point, util::make_public_point_from_secret};

const DOMAIN_LO: &[u8] = b"ZHF_CARD_FACE_KECCAK-256_LO_";
const DOMAIN_HI: &[u8] = b"ZHF_CARD_FACE_KECCAK-256_HI_";

fn keccak(domain: &[u8], message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(domain);
    hasher.update(message);
    hasher.finalize().into()
}

/// Reduces 64 bytes of domain separated Keccak-256 output into a scalar, so
/// the result is uniform in the scalar field.
pub fn hash_to_scalar(message: &[u8]) -> Scalar {
    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(&keccak(DOMAIN_LO, message));
    wide[32..].copy_from_slice(&keccak(DOMAIN_HI, message));
    Scalar::from_bytes_wide(&wide)
}

pub fn hash_to_point(message: &[u8]) -> Point {
    make_public_point_from_secret(&hash_to_scalar(message))
}
