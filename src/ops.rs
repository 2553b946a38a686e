//! Signing operations over blinded messages.
//!
//! Each key-holder produces a partial signature over a blinded message with
//! [partial_sign]; anyone holding the public commitment can screen partials
//! with [partial_verify] before handing at least `threshold` of them to
//! [threshold_signature_recover], which reconstructs the signature the master
//! secret would have produced without that secret ever existing in one place.
//!
//! All functions are pure: they share no state, never block, and may be called
//! concurrently from any number of threads.

use crate::{
    blind::BlindedMessage,
    group::{self, Element, Point, Private, Public, Scalar, Share, Signature},
    poly::{self, PartialSignature},
    Error,
};
use rand::{CryptoRng, RngCore};

/// Hashes the provided message to G1.
pub fn hash_message(message: &[u8]) -> Signature {
    let mut hm = Signature::zero();
    hm.map(message);
    hm
}

/// Computes the public key from the private key.
pub fn compute_public(private: &Private) -> Public {
    let mut public = Public::one();
    public.mul(private);
    public
}

/// Returns a new keypair derived from the provided randomness.
pub fn keypair<R: RngCore + CryptoRng>(rng: &mut R) -> (Private, Public) {
    let private = Private::rand(rng);
    let public = compute_public(&private);
    (private, public)
}

/// Signs the provided message with the private key.
///
/// This is the signature a requester ends up with after unblinding a
/// threshold signature over a blinded message.
pub fn sign(private: &Private, message: &[u8]) -> Signature {
    let mut hm = hash_message(message);
    hm.mul(private);
    hm
}

/// Verifies a signature over a message against the provided public key.
///
/// Returns `false` for a cryptographically invalid signature; malformed
/// encodings never reach this function (they fail at decode).
pub fn verify_message(public: &Public, message: &[u8], signature: &Signature) -> bool {
    let hm = hash_message(message);
    group::check(public, &hm, signature)
}

/// Verifies a signature over a still-blinded message against the provided
/// public key.
///
/// Lets an aggregator confirm a recovered threshold signature before
/// returning it to the requester, without learning the message.
pub fn verify_blinded(public: &Public, blinded: &BlindedMessage, signature: &Signature) -> bool {
    group::check(public, &blinded.point, signature)
}

/// Signs the blinded message with the key share.
///
/// The result is tagged with the share's index so verifiers and the combiner
/// can evaluate the public commitment at the right point. Fails only on a
/// degenerate share whose secret is zero.
pub fn partial_sign(share: &Share, blinded: &BlindedMessage) -> Result<PartialSignature, Error> {
    if share.private == Scalar::zero() {
        return Err(Error::InvalidShare);
    }
    let mut sig = blinded.point;
    sig.mul(&share.private);
    Ok(PartialSignature {
        index: share.index,
        value: sig,
    })
}

/// Verifies the partial signature against the public commitment.
///
/// Evaluates the commitment at the partial's index (the share's public key)
/// and checks the pairing equation
/// `e(blinded.point, pk_index) == e(partial.value, G2::one())`.
///
/// A `false` result is a normal outcome used to discard forged or corrupted
/// partials before combination, not an error.
pub fn partial_verify(
    commitment: &poly::Public,
    blinded: &BlindedMessage,
    partial: &PartialSignature,
) -> bool {
    let public = commitment.evaluate(partial.index).value;
    group::check(&public, &blinded.point, &partial.value)
}

/// Recovers a signature from at least `threshold` partial signatures with
/// pairwise distinct indices.
///
/// Computes the Lagrange coefficients at `x = 0` for the selected indices and
/// sums the partial signatures scaled by them, reconstructing
/// `master_secret * blinded.point` without materializing the master secret.
/// The result is independent of supply order and of which valid
/// size-`threshold` subset was provided.
///
/// Duplicate indices are rejected rather than resolved: the underlying
/// evaluations would be ambiguous and the interpolation denominator would
/// vanish.
pub fn threshold_signature_recover<'a, I>(threshold: u32, partials: I) -> Result<Signature, Error>
where
    I: IntoIterator<Item = &'a PartialSignature>,
{
    poly::recover(threshold, partials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blind,
        codec::{DecodeExt, Encode},
        poly::Poly,
    };
    use rand::{rngs::StdRng, SeedableRng};

    const MESSAGE: &[u8] = b"hello world";

    /// Deals `n` shares with threshold `t`, also returning the master secret
    /// so tests can cross-check against direct signing.
    fn deal(rng: &mut StdRng, n: u32, t: u32) -> (Scalar, poly::Public, Vec<Share>) {
        let secret = poly::new_from(t - 1, rng);
        let master = *secret.constant();
        let commitment = Poly::commit(secret.clone());
        let shares = (0..n)
            .map(|i| {
                let eval = secret.evaluate(i);
                Share {
                    index: eval.index,
                    private: eval.value,
                }
            })
            .collect();
        (master, commitment, shares)
    }

    #[test]
    fn test_partial_sign_verify_recover() {
        let mut rng = StdRng::seed_from_u64(0);
        let (n, t) = (4, 3);
        let (master, commitment, shares) = deal(&mut rng, n, t);

        // Blind the message
        let (factor, blinded) = blind::blind(MESSAGE, &mut rng);

        // Generate the partial signatures
        let partials = shares
            .iter()
            .map(|s| partial_sign(s, &blinded).unwrap())
            .collect::<Vec<_>>();

        // Each partial sig can be verified against the public commitment
        for partial in &partials {
            assert!(partial_verify(&commitment, &blinded, partial));
        }

        // Recover and check the threshold sig while still blinded
        let threshold_sig = threshold_signature_recover(t, &partials).unwrap();
        let threshold_pub = poly::public(&commitment);
        assert!(verify_blinded(threshold_pub, &blinded, &threshold_sig));

        // Unblinding yields the signature the master secret would produce
        let signature = blind::unblind(&factor, &threshold_sig).unwrap();
        assert_eq!(signature, sign(&master, MESSAGE));
        assert!(verify_message(threshold_pub, MESSAGE, &signature));
    }

    #[test]
    fn test_recover_subset_independent() {
        let mut rng = StdRng::seed_from_u64(1);
        let (n, t) = (4, 3);
        let (_, _, shares) = deal(&mut rng, n, t);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        let partials = shares
            .iter()
            .map(|s| partial_sign(s, &blinded).unwrap())
            .collect::<Vec<_>>();

        // Every 3-of-4 subset recovers a bit-identical signature
        let reference = threshold_signature_recover(t, partials.iter().take(3))
            .unwrap()
            .encode();
        for skip in 0..partials.len() {
            let subset = partials
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, p)| p);
            let recovered = threshold_signature_recover(t, subset).unwrap().encode();
            assert_eq!(reference, recovered, "skip={}", skip);
        }

        // Supply order does not matter either
        let mut shuffled = partials.clone();
        shuffled.reverse();
        let recovered = threshold_signature_recover(t, &shuffled).unwrap().encode();
        assert_eq!(reference, recovered);
    }

    #[test]
    fn test_partial_verify_wrong_index() {
        let mut rng = StdRng::seed_from_u64(2);
        let (_, commitment, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        // A partial claiming another share's index does not verify
        let mut partial = partial_sign(&shares[0], &blinded).unwrap();
        partial.index = shares[1].index;
        assert!(!partial_verify(&commitment, &blinded, &partial));
    }

    #[test]
    fn test_partial_verify_forged_value() {
        let mut rng = StdRng::seed_from_u64(3);
        let (_, commitment, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        // A partial produced by a key outside the dealing does not verify
        let rogue = Scalar::rand(&mut rng);
        let mut value = blinded.point;
        value.mul(&rogue);
        let partial = PartialSignature {
            index: shares[2].index,
            value,
        };
        assert!(!partial_verify(&commitment, &blinded, &partial));
    }

    #[test]
    fn test_partial_verify_wrong_message() {
        let mut rng = StdRng::seed_from_u64(4);
        let (_, commitment, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);
        let (_, other) = blind::blind(b"another message", &mut rng);

        let partial = partial_sign(&shares[0], &blinded).unwrap();
        assert!(!partial_verify(&commitment, &other, &partial));
    }

    #[test]
    fn test_recover_insufficient() {
        let mut rng = StdRng::seed_from_u64(5);
        let (_, _, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        let partials = shares
            .iter()
            .take(2)
            .map(|s| partial_sign(s, &blinded).unwrap())
            .collect::<Vec<_>>();
        assert!(matches!(
            threshold_signature_recover(3, &partials).unwrap_err(),
            Error::NotEnoughPartialSignatures(3, 2)
        ));
    }

    #[test]
    fn test_recover_duplicate_index() {
        let mut rng = StdRng::seed_from_u64(6);
        let (_, _, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        let mut partials = shares
            .iter()
            .take(2)
            .map(|s| partial_sign(s, &blinded).unwrap())
            .collect::<Vec<_>>();
        partials.push(partials[1].clone());
        assert!(matches!(
            threshold_signature_recover(3, &partials).unwrap_err(),
            Error::DuplicateIndex(1)
        ));
    }

    #[test]
    fn test_partial_sign_zero_share() {
        let mut rng = StdRng::seed_from_u64(7);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);
        let share = Share {
            index: 0,
            private: Scalar::zero(),
        };
        assert!(matches!(
            partial_sign(&share, &blinded).unwrap_err(),
            Error::InvalidShare
        ));
    }

    #[test]
    fn test_recover_with_corrupted_partial() {
        let mut rng = StdRng::seed_from_u64(8);
        let (_, commitment, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        let mut partials = shares
            .iter()
            .take(3)
            .map(|s| partial_sign(s, &blinded).unwrap())
            .collect::<Vec<_>>();

        // Corrupt one partial: recovery still "succeeds" (it is pure
        // interpolation) but the result no longer verifies, which is why
        // partials are screened first.
        let rogue = Scalar::rand(&mut rng);
        partials[0].value.mul(&rogue);
        assert!(!partial_verify(&commitment, &blinded, &partials[0]));

        let threshold_sig = threshold_signature_recover(3, &partials).unwrap();
        assert!(!verify_blinded(
            poly::public(&commitment),
            &blinded,
            &threshold_sig
        ));
    }

    #[test]
    fn test_partial_signature_roundtrip() {
        let mut rng = StdRng::seed_from_u64(9);
        let (_, commitment, shares) = deal(&mut rng, 4, 3);
        let (_, blinded) = blind::blind(MESSAGE, &mut rng);

        // A partial survives the wire and still verifies
        let partial = partial_sign(&shares[3], &blinded).unwrap();
        let decoded = PartialSignature::decode(partial.encode()).unwrap();
        assert_eq!(partial, decoded);
        assert!(partial_verify(&commitment, &blinded, &decoded));
    }
}
