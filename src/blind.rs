//! Blinding and unblinding of messages.
//!
//! A requester blinds a message before handing it to the signers, so no signer
//! (nor any subset of them) learns what it is signing. Blinding multiplies the
//! hashed message by a secret non-zero scalar `r`: to anyone without `r`, the
//! blinded point is indistinguishable from a uniformly random G1 element.
//! Because signing is scalar multiplication, the blinding commutes with it,
//! and the requester recovers the signature over the original message by
//! multiplying the signed result with `r^-1`.
//!
//! The blinding factor never leaves the requester. It is zeroized on drop and
//! its debug output is redacted.

use crate::{
    codec::{Error as CodecError, FixedSize, Read, ReadExt, Write},
    group::{Element, Scalar, Signature, SCALAR_LENGTH, SIGNATURE_LENGTH},
    ops, Error,
};
use bytes::{Buf, BufMut};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A message hidden from its signers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedMessage {
    /// The blinded image of the hashed message.
    pub point: Signature,
}

impl Write for BlindedMessage {
    fn write(&self, buf: &mut impl BufMut) {
        self.point.write(buf);
    }
}

impl Read for BlindedMessage {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let point = Signature::read(buf)?;
        Ok(Self { point })
    }
}

impl FixedSize for BlindedMessage {
    const SIZE: usize = SIGNATURE_LENGTH;
}

/// The requester's secret counterpart to a [BlindedMessage].
///
/// Required to unblind the signature over the blinded message; must never be
/// transmitted. The codec implementation exists for requester-local
/// persistence only.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BlindingFactor(Scalar);

impl Write for BlindingFactor {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for BlindingFactor {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let scalar = Scalar::read(buf)?;
        Ok(Self(scalar))
    }
}

impl FixedSize for BlindingFactor {
    const SIZE: usize = SCALAR_LENGTH;
}

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindingFactor([REDACTED])")
    }
}

/// Blinds a message, returning the blinded message to circulate among the
/// signers and the factor the requester must retain to unblind their output.
///
/// The blinded point is `r * H(message)` for a non-zero scalar `r` drawn from
/// `rng`. The same message blinded under two independently drawn factors
/// yields unlinkable points.
pub fn blind<R: RngCore + CryptoRng>(message: &[u8], rng: &mut R) -> (BlindingFactor, BlindedMessage) {
    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/b0ef82ff79769d085a5a7d3f4fe690b1c8fe6dc9/crates/threshold-bls/src/sig/blind.rs#L62-L72
    let r = loop {
        let r = Scalar::rand(rng);
        if r != Scalar::zero() {
            break r;
        }
    };
    let mut point = ops::hash_message(message);
    point.mul(&r);
    (BlindingFactor(r), BlindedMessage { point })
}

/// Removes the blinding from a signature over the blinded message.
///
/// If `signature` is `secret * blinded.point`, the result is
/// `secret * H(message)`: a plain signature over the original message,
/// verifiable against the signer's public key.
pub fn unblind(factor: &BlindingFactor, signature: &Signature) -> Result<Signature, Error> {
    let inverse = factor.0.inverse().ok_or(Error::NoInverse)?;
    let mut signature = *signature;
    signature.mul(&inverse);
    Ok(signature)
}

/// Derives a deterministic RNG from a caller-supplied seed.
///
/// Useful to make blinding reproducible in tests and fixtures. Production
/// callers should seed from fresh entropy (or pass `OsRng` to [blind]
/// directly).
pub fn seeded_rng(seed: &[u8]) -> ChaCha20Rng {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    ChaCha20Rng::from_seed(hasher.finalize().into())
}
