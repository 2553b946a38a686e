//! Blind and threshold BLS12-381 signatures.
//!
//! A quorum of `t`-of-`n` key-holders jointly signs a message it never sees:
//! the requester blinds the message, each key-holder signs the blinded point
//! with its share, anyone can verify each partial against the published
//! polynomial commitment, and any `t` valid partials combine into the
//! signature the (never materialized) master secret would have produced.
//! Unblinding then yields an ordinary BLS signature over the original message,
//! verifiable against the master public key.
//!
//! Public keys and commitments live in G2 (96-byte compressed encodings);
//! signatures and blinded messages live in G1 (48 bytes).
//!
//! # Acknowledgements
//!
//! _The following crates were used as a reference when implementing this
//! crate. If code is very similar to the reference, it is accompanied by a
//! comment and link._
//!
//! * <https://github.com/celo-org/celo-threshold-bls-rs>: Blind signatures and
//!   operations over secret-shared polynomials.
//! * <https://github.com/filecoin-project/blstrs> + <https://github.com/MystenLabs/fastcrypto>:
//!   Implementing operations over the BLS12-381 scalar field with
//!   <https://github.com/supranational/blst>.
//!
//! # Example
//!
//! ```rust
//! use blind_threshold_bls::{blind, dealer, ops, poly};
//! use rand::rngs::OsRng;
//!
//! // Configure the quorum
//! let (n, t) = (4, 3);
//!
//! // Generate a commitment and shares (performed by a trusted dealer)
//! let (commitment, shares) = dealer::generate_shares(&mut OsRng, n, t);
//!
//! // Blind the message with a requester-held factor
//! let message = b"hello world";
//! let (factor, blinded) = blind::blind(message, &mut OsRng);
//!
//! // Each party signs the blinded message with its share
//! let partials: Vec<_> = shares
//!     .iter()
//!     .map(|s| ops::partial_sign(s, &blinded).expect("share should be valid"))
//!     .collect();
//!
//! // Anyone can screen partials against the public commitment
//! for partial in &partials {
//!     assert!(ops::partial_verify(&commitment, &blinded, partial));
//! }
//!
//! // Any `t` valid partials recover the blinded threshold signature
//! let blinded_sig = ops::threshold_signature_recover(t, partials.iter().take(t as usize))
//!     .expect("quorum should recover");
//!
//! // The requester unblinds and verifies against the master public key
//! let signature = blind::unblind(&factor, &blinded_sig).expect("factor should invert");
//! assert!(ops::verify_message(poly::public(&commitment), message, &signature));
//! ```

use thiserror::Error;

pub mod blind;
pub mod codec;
pub mod dealer;
pub mod group;
pub mod ops;
pub mod poly;
pub mod utils;

/// Errors that can occur when signing or combining.
///
/// Decoding failures are reported separately as [codec::Error]; a failed
/// verification is a `false` return, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("not enough partial signatures: {1}/{0}")]
    NotEnoughPartialSignatures(u32, u32),
    #[error("duplicate partial signature index: {0}")]
    DuplicateIndex(u32),
    #[error("invalid share: secret is zero")]
    InvalidShare,
    #[error("no inverse")]
    NoInverse,
}
