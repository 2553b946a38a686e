//! Polynomial operations over the BLS12-381 scalar field.
//!
//! A dealer polynomial of degree `t - 1` carries the master secret in its
//! constant term; committing it to G2 yields the public commitment every
//! verifier holds, and evaluating it yields the key shares. Reconstruction at
//! `x = 0` (Lagrange interpolation in the exponent) is what turns `t` partial
//! signatures into a threshold signature.
//!
//! # Warning
//!
//! The security of the polynomial operations is critical for the overall
//! security of the threshold scheme. Ensure that the scalar field operations
//! are performed over the correct field and that all elements are valid.

use crate::{
    codec::{Error as CodecError, FixedSize, Read, ReadExt, Write},
    group::{self, Element, Scalar},
    Error,
};
use bytes::{Buf, BufMut};
use rand::RngCore;

/// Private polynomials are used to generate secret shares.
pub type Private = Poly<group::Private>;

/// Public polynomials represent commitments to secrets on a private polynomial.
pub type Public = Poly<group::Public>;

/// A partial signature as produced by a single share.
pub type PartialSignature = Eval<group::Signature>;

/// Length of a canonically serialized partial signature.
pub const PARTIAL_SIGNATURE_LENGTH: usize = u32::SIZE + group::SIGNATURE_LENGTH;

/// Length of the commitment header (threshold plus reserved padding).
pub const COMMITMENT_HEADER_LENGTH: usize = u32::SIZE + 4;

/// A polynomial evaluation at a specific index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eval<C: Element> {
    pub index: u32,
    pub value: C,
}

impl<C: Element> Write for Eval<C> {
    fn write(&self, buf: &mut impl BufMut) {
        self.index.write(buf);
        self.value.write(buf);
    }
}

impl<C: Element> Read for Eval<C> {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let index = u32::read(buf)?;
        let value = C::read(buf)?;
        Ok(Self { index, value })
    }
}

impl<C: Element> FixedSize for Eval<C> {
    const SIZE: usize = u32::SIZE + C::SIZE;
}

/// A polynomial that is using a scalar for the variable x and a generic
/// element for the coefficients, ordered constant-term first.
///
/// The coefficients must be able to multiply the type of the variable,
/// which is always a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
// Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L24-L28
pub struct Poly<C>(Vec<C>);

/// Returns a new scalar polynomial of the given degree where each coefficient is
/// sampled at random from the provided RNG.
///
/// In the context of secret sharing, the threshold is the degree + 1.
pub fn new_from<R: RngCore>(degree: u32, rng: &mut R) -> Poly<Scalar> {
    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L46-L52
    let coeffs = (0..=degree).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
    Poly::<Scalar>(coeffs)
}

impl<C> Poly<C> {
    /// Creates a new polynomial from the given coefficients.
    pub fn from(c: Vec<C>) -> Self {
        Self(c)
    }

    /// Returns the constant term of the polynomial.
    pub fn constant(&self) -> &C {
        &self.0[0]
    }

    /// Returns the degree of the polynomial.
    pub fn degree(&self) -> u32 {
        (self.0.len() - 1) as u32 // length is validated on decode, safe to cast
    }

    /// Returns the number of evaluations required to reconstruct the polynomial.
    ///
    /// This will be the threshold.
    pub fn required(&self) -> u32 {
        self.0.len() as u32 // length is validated on decode, safe to cast
    }
}

impl<C: Element> Poly<C> {
    /// Commits the scalar polynomial to the group and returns a polynomial over
    /// the group.
    ///
    /// This is done by multiplying each coefficient of the polynomial with the
    /// group's generator.
    pub fn commit(commits: Poly<Scalar>) -> Self {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L322-L340
        let commits = commits
            .0
            .iter()
            .map(|c| {
                let mut commitment = C::one();
                commitment.mul(c);
                commitment
            })
            .collect::<Vec<C>>();

        Poly::<C>::from(commits)
    }

    /// Evaluates the polynomial at the specified index.
    pub fn evaluate(&self, i: u32) -> Eval<C> {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L111-L129

        // We add +1 because we must never evaluate the polynomial at its first
        // point, otherwise it would reveal the constant term (the secret).
        let mut xi = Scalar::zero();
        xi.set_int(i + 1);

        // Use Horner's method to evaluate the polynomial
        let res = self.0.iter().rev().fold(C::zero(), |mut sum, coeff| {
            sum.mul(&xi);
            sum.add(coeff);
            sum
        });
        Eval {
            value: res,
            index: i,
        }
    }
}

/// Selects the evaluations used for interpolation: sorts by index, rejects
/// duplicate indices, and takes the `threshold` lowest-indexed entries.
///
/// Sorting ensures that two invocations over the same set of evaluations
/// select the same entries regardless of supply order.
pub fn prepare_evaluations<'a, C, I>(
    threshold: u32,
    evals: I,
) -> Result<Vec<&'a Eval<C>>, Error>
where
    C: Element + 'a,
    I: IntoIterator<Item = &'a Eval<C>>,
{
    let mut evals = evals.into_iter().collect::<Vec<_>>();
    evals.sort_by_key(|e| e.index);

    // A duplicate index would make the interpolation denominator vanish; the
    // caller must deduplicate explicitly rather than have us pick a winner.
    for pair in evals.windows(2) {
        if pair[0].index == pair[1].index {
            return Err(Error::DuplicateIndex(pair[0].index));
        }
    }
    if evals.len() < threshold as usize {
        return Err(Error::NotEnoughPartialSignatures(
            threshold,
            evals.len() as u32,
        ));
    }
    evals.truncate(threshold as usize);
    Ok(evals)
}

/// Recovers the constant term of a polynomial of degree less than `threshold`
/// using at least `threshold` evaluations of the polynomial.
///
/// Each evaluation index is mapped to the x-value `index + 1`, matching
/// [Poly::evaluate]. Any size-`threshold` subset of valid evaluations of the
/// same polynomial recovers the same constant term.
pub fn recover<'a, C, I>(threshold: u32, evals: I) -> Result<C, Error>
where
    C: Element + 'a,
    I: IntoIterator<Item = &'a Eval<C>>,
{
    let evals = prepare_evaluations(threshold, evals)?;
    interpolate(&evals)
}

/// Lagrange interpolation at `x = 0` over evaluations with pairwise distinct
/// indices.
fn interpolate<C: Element>(evals: &[&Eval<C>]) -> Result<C, Error> {
    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L131-L165
    let xs = evals
        .iter()
        .map(|e| {
            let mut xi = Scalar::zero();
            xi.set_int(e.index + 1);
            (e.index, xi, e.value.clone())
        })
        .collect::<Vec<_>>();

    // The constant term is `sum_{i} yi * l_i(0)`, where
    // `l_i(0) = product_{j != i} (xj / (xj - xi))`.
    xs.iter().try_fold(C::zero(), |mut acc, (i, xi, yi)| {
        let (mut num, den) = xs.iter().fold(
            (Scalar::one(), Scalar::one()),
            |(mut num, mut den), (j, xj, _)| {
                if i != j {
                    // Include `xj` in the numerator product for `l_i(0)`
                    num.mul(xj);

                    // Compute `xj - xi` and include it in the denominator product
                    let mut tmp = *xj;
                    tmp.sub(xi);
                    den.mul(&tmp);
                }
                (num, den)
            },
        );

        // The denominator product cannot be zero once duplicate indices are
        // rejected, but a degenerate input must not panic.
        let inv = den.inverse().ok_or(Error::NoInverse)?;

        // Compute `l_i(0) = num * inv`, the Lagrange basis coefficient at `x=0`
        num.mul(&inv);

        // Scale `yi` by `l_i(0)` to contribute to the constant term
        let mut yi_scaled = yi.clone();
        yi_scaled.mul(&num);

        // Add `yi * l_i(0)` to the running sum
        acc.add(&yi_scaled);
        Ok(acc)
    })
}

/// Returns the public key of the polynomial (constant term).
pub fn public(public: &Public) -> &group::Public {
    public.constant()
}

impl<C: Element> Write for Poly<C> {
    fn write(&self, buf: &mut impl BufMut) {
        self.required().write(buf);
        buf.put_bytes(0, 4); // reserved
        for c in &self.0 {
            c.write(buf);
        }
    }
}

impl<C: Element> Read for Poly<C> {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let threshold = u32::read(buf)?;
        if threshold == 0 {
            return Err(CodecError::Invalid("Poly", "zero threshold"));
        }
        if buf.remaining() < 4 {
            return Err(CodecError::EndOfBuffer);
        }
        let mut reserved = [0u8; 4];
        buf.copy_to_slice(&mut reserved);
        if reserved != [0u8; 4] {
            return Err(CodecError::Invalid("Poly", "nonzero padding"));
        }

        // Bound the allocation by the buffer length before reserving capacity
        let expected = (threshold as usize)
            .checked_mul(C::SIZE)
            .ok_or(CodecError::EndOfBuffer)?;
        if buf.remaining() < expected {
            return Err(CodecError::EndOfBuffer);
        }
        let mut coeffs = Vec::with_capacity(threshold as usize);
        for _ in 0..threshold {
            coeffs.push(C::read(buf)?);
        }
        Ok(Self(coeffs))
    }
}

impl<C: Element> crate::codec::EncodeSize for Poly<C> {
    fn encode_size(&self) -> usize {
        COMMITMENT_HEADER_LENGTH + C::SIZE * self.0.len()
    }
}
