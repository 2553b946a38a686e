//! Stateless operations for a trusted dealer.
//!
//! The dealer ceremony itself (distribution, complaints, resharing) is outside
//! this crate; these helpers produce and validate its outputs: `n` key shares
//! on a random degree-`t - 1` polynomial and the public commitment every
//! verifier holds.

use crate::{group::Share, poly};
use rand::{CryptoRng, RngCore};

/// Generates shares and a commitment for an `n`-party dealing with
/// reconstruction threshold `t`.
///
/// The constant term of the committed polynomial is the master public key;
/// the matching master secret is never returned.
///
/// # Panics
///
/// Panics if `t` is zero or exceeds `n`.
pub fn generate_shares<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: u32,
    t: u32,
) -> (poly::Public, Vec<Share>) {
    assert!(t >= 1 && t <= n, "threshold must be in 1..=n");

    // Generate a secret polynomial and commit to it
    let secret = poly::new_from(t - 1, rng);
    let commitment = poly::Public::commit(secret.clone());

    // Generate shares
    let shares = (0..n)
        .map(|i| {
            let eval = secret.evaluate(i);
            Share {
                index: eval.index,
                private: eval.value,
            }
        })
        .collect::<Vec<_>>();
    (commitment, shares)
}

/// Verifies that a share is consistent with the public commitment.
///
/// Checks that the share's public key equals the commitment evaluated at the
/// share's index, without revealing anything about the share beyond validity.
pub fn verify_share(commitment: &poly::Public, share: &Share) -> bool {
    commitment.evaluate(share.index).value == share.public()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Scalar;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_generate_shares() {
        let mut rng = StdRng::seed_from_u64(0);
        let (n, t) = (5, 3);
        let (commitment, shares) = generate_shares(&mut rng, n, t);

        assert_eq!(commitment.required(), t);
        assert_eq!(shares.len(), n as usize);
        for (i, share) in shares.iter().enumerate() {
            assert_eq!(share.index, i as u32);
            assert!(verify_share(&commitment, share));
        }
    }

    #[test]
    fn test_verify_share_rejects_tampered() {
        let mut rng = StdRng::seed_from_u64(1);
        let (commitment, mut shares) = generate_shares(&mut rng, 5, 3);

        // Wrong secret
        shares[0].private = Scalar::rand(&mut rng);
        assert!(!verify_share(&commitment, &shares[0]));

        // Wrong index
        shares[1].index = 4;
        assert!(!verify_share(&commitment, &shares[1]));
    }

    #[test]
    #[should_panic(expected = "threshold must be in 1..=n")]
    fn test_generate_shares_bad_threshold() {
        let mut rng = StdRng::seed_from_u64(2);
        generate_shares(&mut rng, 3, 4);
    }
}
