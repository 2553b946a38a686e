//! Group operations over the BLS12-381 curve.
//!
//! This module implements the field and group arithmetic the signing scheme is
//! built on: scalar operations, point addition and scalar multiplication in G1
//! and G2, hashing messages to G1, and the bilinear pairing.
//!
//! # Warning
//!
//! Ensure that points are checked to belong to the correct subgroup (G1 or G2)
//! to prevent small subgroup attacks. This is particularly important when
//! handling points received from untrusted sources and is already taken care
//! of for you if you use the provided codec implementations (decoding rejects
//! the identity and any point outside the prime-order subgroup).

use crate::codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use blst::{
    blst_bendian_from_scalar, blst_final_exp, blst_fp12, blst_fr, blst_fr_add, blst_fr_from_scalar,
    blst_fr_from_uint64, blst_fr_inverse, blst_fr_mul, blst_fr_sub, blst_hash_to_g1,
    blst_keygen_v3, blst_miller_loop, blst_p1, blst_p1_add_or_double, blst_p1_affine,
    blst_p1_compress, blst_p1_from_affine, blst_p1_in_g1, blst_p1_is_inf, blst_p1_mult,
    blst_p1_to_affine, blst_p1_uncompress, blst_p2, blst_p2_add_or_double, blst_p2_affine,
    blst_p2_compress, blst_p2_from_affine, blst_p2_in_g2, blst_p2_is_inf, blst_p2_mult,
    blst_p2_to_affine, blst_p2_uncompress, blst_scalar, blst_scalar_fr_check,
    blst_scalar_from_bendian, blst_scalar_from_fr, Pairing as blst_pairing, BLS12_381_G1,
    BLS12_381_G2, BLS12_381_NEG_G2, BLST_ERROR,
};
use bytes::{Buf, BufMut};
use rand::RngCore;
use std::{fmt, ptr};
use zeroize::Zeroize;

/// An element of a group.
pub trait Element: Clone + Eq + PartialEq + Send + Sync + Write + Read + FixedSize {
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Returns the multiplicative identity.
    fn one() -> Self;

    /// Adds to self in-place.
    fn add(&mut self, rhs: &Self);

    /// Multiplies self in-place.
    fn mul(&mut self, rhs: &Scalar);
}

/// An element of a group that supports message hashing.
pub trait Point: Element {
    /// Maps the provided data to a group element.
    fn map(&mut self, message: &[u8]);
}

/// An element of the BLS12-381 scalar field.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct Scalar(blst_fr);

/// Length of a canonically serialized scalar.
pub const SCALAR_LENGTH: usize = 32;

/// `R = 2^256 mod q` in little-endian Montgomery form which is equivalent to 1 in little-endian
/// non-Montgomery form.
///
/// mod(2^256, 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001) = 0x1824b159acc5056f998c4fefecbc4ff55884b7fa0003480200000001fffffffe
// Reference: https://github.com/filecoin-project/blstrs/blob/ffbb41d1495d84e40a712583346439924603b49a/src/scalar.rs#L77-L89
const BLST_FR_ONE: Scalar = Scalar(blst_fr {
    l: [
        0x0000_0001_ffff_fffe,
        0x5884_b7fa_0003_4802,
        0x998c_4fef_ecbc_4ff5,
        0x1824_b159_acc5_056f,
    ],
});

/// An element of the first pairing group (compressed encodings are 48 bytes).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct G1(blst_p1);

/// Length of a compressed G1 element.
pub const G1_ELEMENT_BYTE_LENGTH: usize = 48;

/// Domain separation tag for hashing a message to G1.
pub const DST_G1: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// An element of the second pairing group (compressed encodings are 96 bytes).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct G2(blst_p2);

/// Length of a compressed G2 element.
pub const G2_ELEMENT_BYTE_LENGTH: usize = 96;

/// The target group of the pairing.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GT(blst_fp12);

/// A secret scalar.
pub type Private = Scalar;

/// Length of a canonically serialized private key.
pub const PRIVATE_KEY_LENGTH: usize = SCALAR_LENGTH;

/// Public keys and polynomial commitments live in G2.
pub type Public = G2;

/// Signatures and blinded messages live in G1.
pub type Signature = G1;

/// Length of a compressed signature.
pub const SIGNATURE_LENGTH: usize = G1_ELEMENT_BYTE_LENGTH;

/// Returns the size in bits of a given blst_scalar (represented in little-endian).
fn bits(scalar: &blst_scalar) -> usize {
    let mut bits: usize = SCALAR_LENGTH * 8;
    for i in scalar.b.iter().rev() {
        let leading = i.leading_zeros();
        bits -= leading as usize;
        if leading < 8 {
            break;
        }
    }
    bits
}

/// A share of a threshold signing key.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct Share {
    /// The share's index in the polynomial.
    pub index: u32,
    /// The scalar corresponding to the share's secret.
    pub private: Private,
}

/// Length of a canonically serialized share.
pub const SHARE_LENGTH: usize = u32::SIZE + SCALAR_LENGTH;

impl Share {
    /// Returns the public key corresponding to the share.
    ///
    /// This can be verified against the public polynomial.
    pub fn public(&self) -> Public {
        let mut public = Public::one();
        public.mul(&self.private);
        public
    }
}

impl Write for Share {
    fn write(&self, buf: &mut impl BufMut) {
        self.index.write(buf);
        self.private.write(buf);
    }
}

impl Read for Share {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let index = u32::read(buf)?;
        let private = Private::read(buf)?;
        Ok(Self { index, private })
    }
}

impl FixedSize for Share {
    const SIZE: usize = SHARE_LENGTH;
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("index", &self.index)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

impl Scalar {
    /// Generates a random scalar using the provided RNG.
    pub fn rand<R: RngCore>(rng: &mut R) -> Self {
        // Generate a random 64 byte buffer
        let mut ikm = [0u8; 64];
        rng.fill_bytes(&mut ikm);

        // Generate a scalar from the randomly populated buffer
        let mut ret = blst_fr::default();
        unsafe {
            let mut sc = blst_scalar::default();
            blst_keygen_v3(&mut sc, ikm.as_ptr(), ikm.len(), ptr::null(), 0);
            blst_fr_from_scalar(&mut ret, &sc);
        }
        ikm.zeroize();
        Self(ret)
    }

    /// Sets the scalar to be the provided integer.
    pub fn set_int(&mut self, i: u32) {
        // blst requires a buffer of 4 uint64 values. Failure to provide one will
        // result in unexpected behavior (will read past the provided buffer).
        //
        // Reference: https://github.com/supranational/blst/blob/415d4f0e2347a794091836a3065206edfd9c72f3/bindings/blst.h#L102
        let buffer = [i as u64, 0, 0, 0];
        unsafe { blst_fr_from_uint64(&mut self.0, buffer.as_ptr()) };
    }

    /// Computes the inverse of the scalar, or `None` if the scalar is zero.
    pub fn inverse(&self) -> Option<Self> {
        if *self == Self::zero() {
            return None;
        }
        let mut ret = blst_fr::default();
        unsafe { blst_fr_inverse(&mut ret, &self.0) };
        Some(Self(ret))
    }

    /// Subtracts the provided scalar from self in-place.
    pub fn sub(&mut self, rhs: &Self) {
        unsafe { blst_fr_sub(&mut self.0, &self.0, &rhs.0) }
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.l.zeroize();
    }
}

impl Element for Scalar {
    fn zero() -> Self {
        Self(blst_fr::default())
    }

    fn one() -> Self {
        BLST_FR_ONE
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_add(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_mul(&mut self.0, &self.0, &rhs.0);
        }
    }
}

impl Write for Scalar {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; SCALAR_LENGTH];
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_fr(&mut scalar, &self.0);
            blst_bendian_from_scalar(bytes.as_mut_ptr(), &scalar);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for Scalar {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        if buf.remaining() < SCALAR_LENGTH {
            return Err(CodecError::EndOfBuffer);
        }
        let mut bytes = [0u8; SCALAR_LENGTH];
        buf.copy_to_slice(&mut bytes);
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_bendian(&mut scalar, bytes.as_ptr());
            // Reject values at or above the group order
            if !blst_scalar_fr_check(&scalar) {
                return Err(CodecError::Invalid("Scalar", "not canonical"));
            }
            blst_fr_from_scalar(&mut ret, &scalar);
        }
        Ok(Self(ret))
    }
}

impl FixedSize for Scalar {
    const SIZE: usize = SCALAR_LENGTH;
}

impl G1 {
    fn as_affine(&self) -> blst_p1_affine {
        let mut affine = blst_p1_affine::default();
        unsafe { blst_p1_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl Element for G1 {
    fn zero() -> Self {
        Self(blst_p1::default())
    }

    fn one() -> Self {
        let mut ret = blst_p1::default();
        unsafe {
            blst_p1_from_affine(&mut ret, &BLS12_381_G1);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p1_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar: blst_scalar = blst_scalar::default();
        unsafe {
            blst_scalar_from_fr(&mut scalar, &rhs.0);
            blst_p1_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }
}

impl Write for G1 {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p1_compress(bytes.as_mut_ptr(), &self.0);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for G1 {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        if buf.remaining() < G1_ELEMENT_BYTE_LENGTH {
            return Err(CodecError::EndOfBuffer);
        }
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        buf.copy_to_slice(&mut bytes);
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            if blst_p1_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return Err(CodecError::Invalid("G1", "invalid encoding"));
            }
            blst_p1_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p1_is_inf(&ret) {
                return Err(CodecError::Invalid("G1", "point at infinity"));
            }

            // Verify that the deserialized element is in G1
            if !blst_p1_in_g1(&ret) {
                return Err(CodecError::Invalid("G1", "not in subgroup"));
            }
        }
        Ok(Self(ret))
    }
}

impl FixedSize for G1 {
    const SIZE: usize = G1_ELEMENT_BYTE_LENGTH;
}

impl Point for G1 {
    fn map(&mut self, data: &[u8]) {
        unsafe {
            blst_hash_to_g1(
                &mut self.0,
                data.as_ptr(),
                data.len(),
                DST_G1.as_ptr(),
                DST_G1.len(),
                ptr::null(),
                0,
            );
        }
    }
}

impl G2 {
    fn as_affine(&self) -> blst_p2_affine {
        let mut affine = blst_p2_affine::default();
        unsafe { blst_p2_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl Element for G2 {
    fn zero() -> Self {
        Self(blst_p2::default())
    }

    fn one() -> Self {
        let mut ret = blst_p2::default();
        unsafe {
            blst_p2_from_affine(&mut ret, &BLS12_381_G2);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p2_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar = blst_scalar::default();
        unsafe {
            blst_scalar_from_fr(&mut scalar, &rhs.0);
            blst_p2_mult(&mut self.0, &self.0, scalar.b.as_ptr(), bits(&scalar));
        }
    }
}

impl Write for G2 {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; G2_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p2_compress(bytes.as_mut_ptr(), &self.0);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for G2 {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        if buf.remaining() < G2_ELEMENT_BYTE_LENGTH {
            return Err(CodecError::EndOfBuffer);
        }
        let mut bytes = [0u8; G2_ELEMENT_BYTE_LENGTH];
        buf.copy_to_slice(&mut bytes);
        let mut ret = blst_p2::default();
        unsafe {
            let mut affine = blst_p2_affine::default();
            if blst_p2_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return Err(CodecError::Invalid("G2", "invalid encoding"));
            }
            blst_p2_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p2_is_inf(&ret) {
                return Err(CodecError::Invalid("G2", "point at infinity"));
            }

            // Verify that the deserialized element is in G2
            if !blst_p2_in_g2(&ret) {
                return Err(CodecError::Invalid("G2", "not in subgroup"));
            }
        }
        Ok(Self(ret))
    }
}

impl FixedSize for G2 {
    const SIZE: usize = G2_ELEMENT_BYTE_LENGTH;
}

/// Computes the bilinear pairing `e(p, q)`.
pub fn pairing(p: &G1, q: &G2) -> GT {
    // Reference: https://github.com/MystenLabs/fastcrypto/blob/bd4999bd3e901eab34ae3dd96dbe38b86ac646a7/fastcrypto/src/groups/bls12381.rs#L223-L234
    let mut res = blst_fp12::default();
    let pa = p.as_affine();
    let qa = q.as_affine();
    unsafe {
        blst_miller_loop(&mut res, &qa, &pa);
        blst_final_exp(&mut res, &res);
    }
    GT(res)
}

/// Checks that `e(hm, public)` is equal to `e(signature, G2::one())` using a single
/// product check with a negated G2 generator (`e(hm, public) * e(signature, -G2::one()) == 1`).
pub(crate) fn check(public: &Public, hm: &Signature, signature: &Signature) -> bool {
    // Create a pairing context
    //
    // We only handle pre-hashed messages, so we leave the domain separator tag (`DST`) empty.
    let mut pairing = blst_pairing::new(false, &[]);

    // Convert `signature` into affine and aggregate `e(signature, -G2::one())`
    let q = signature.as_affine();
    unsafe {
        pairing.raw_aggregate(&BLS12_381_NEG_G2, &q);
    }

    // Convert `public` and `hm` into affine and aggregate `e(hm, public)`
    let p = public.as_affine();
    let q = hm.as_affine();
    pairing.raw_aggregate(&p, &q);

    // Finalize the pairing accumulation and verify the result
    //
    // If `finalverify()` returns `true`, it means `e(hm, public) * e(signature, -G2::one()) == 1`.
    // This is equivalent to `e(hm, public) == e(signature, G2::one())`.
    pairing.commit();
    pairing.finalverify(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DecodeExt, Encode};
    use rand::{prelude::*, rngs::StdRng};

    #[test]
    fn basic_group() {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/b0ef82ff79769d085a5a7d3f4fe690b1c8fe6dc9/crates/threshold-bls/src/curve/bls12381.rs#L200-L220
        let s = Scalar::rand(&mut thread_rng());
        let mut e1 = s;
        let e2 = s;
        let mut s2 = s;
        s2.add(&s);
        s2.mul(&s);
        e1.add(&e2);
        e1.mul(&e2);
        assert_eq!(e1, s2);

        // p1 = s2 * G = (s + s) * s * G
        let mut p1 = G1::one();
        p1.mul(&s2);

        // p2 = (s * G) * s + (s * G) * s
        let mut p2 = G1::one();
        p2.mul(&s);
        p2.mul(&s);
        let tmp = p2;
        p2.add(&tmp);
        assert_eq!(p1, p2);
    }

    #[test]
    fn scalar_inverse() {
        let mut rng = StdRng::seed_from_u64(0);
        let s = Scalar::rand(&mut rng);
        let inv = s.inverse().unwrap();
        let mut prod = s;
        prod.mul(&inv);
        assert_eq!(prod, Scalar::one());

        assert!(Scalar::zero().inverse().is_none());
    }

    #[test]
    fn scalar_codec() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = Scalar::rand(&mut rng);
        let encoded = s.encode();
        assert_eq!(encoded.len(), SCALAR_LENGTH);
        assert_eq!(Scalar::decode(encoded).unwrap(), s);

        // The group order itself is not canonical
        let order = crate::utils::from_hex_formatted(
            "73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001",
        )
        .unwrap();
        assert!(matches!(
            Scalar::decode(&order[..]),
            Err(CodecError::Invalid("Scalar", _))
        ));
    }

    #[test]
    fn point_codec() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = Scalar::rand(&mut rng);

        let mut p = G1::one();
        p.mul(&s);
        let encoded = p.encode();
        assert_eq!(encoded.len(), G1_ELEMENT_BYTE_LENGTH);
        assert_eq!(G1::decode(encoded).unwrap(), p);

        let mut q = G2::one();
        q.mul(&s);
        let encoded = q.encode();
        assert_eq!(encoded.len(), G2_ELEMENT_BYTE_LENGTH);
        assert_eq!(G2::decode(encoded).unwrap(), q);
    }

    #[test]
    fn point_decode_rejects_malformed() {
        // Truncated
        assert!(matches!(
            G1::decode(&[0u8; G1_ELEMENT_BYTE_LENGTH - 1][..]),
            Err(CodecError::EndOfBuffer)
        ));

        // Garbage (all zeros is not a valid compressed encoding)
        assert!(matches!(
            G1::decode(&[0u8; G1_ELEMENT_BYTE_LENGTH][..]),
            Err(CodecError::Invalid("G1", _))
        ));

        // Compressed identity (0xc0 prefix) decodes but is rejected
        let mut identity = [0u8; G1_ELEMENT_BYTE_LENGTH];
        identity[0] = 0xc0;
        assert!(matches!(
            G1::decode(&identity[..]),
            Err(CodecError::Invalid("G1", "point at infinity"))
        ));

        let mut identity = [0u8; G2_ELEMENT_BYTE_LENGTH];
        identity[0] = 0xc0;
        assert!(matches!(
            G2::decode(&identity[..]),
            Err(CodecError::Invalid("G2", "point at infinity"))
        ));
    }

    #[test]
    fn check_matches_pairing() {
        let mut rng = StdRng::seed_from_u64(3);
        let private = Scalar::rand(&mut rng);
        let mut public = G2::one();
        public.mul(&private);

        let mut hm = G1::zero();
        hm.map(b"hello world");
        let mut sig = hm;
        sig.mul(&private);

        // e(hm, public) == e(sig, G2::one())
        assert_eq!(pairing(&hm, &public), pairing(&sig, &G2::one()));
        assert!(check(&public, &hm, &sig));

        // A signature under a different key fails both
        let other = Scalar::rand(&mut rng);
        let mut bad = hm;
        bad.mul(&other);
        assert_ne!(pairing(&hm, &public), pairing(&bad, &G2::one()));
        assert!(!check(&public, &hm, &bad));
    }

    #[test]
    fn hash_to_curve_deterministic() {
        let mut a = G1::zero();
        a.map(b"message");
        let mut b = G1::zero();
        b.map(b"message");
        assert_eq!(a, b);

        let mut c = G1::zero();
        c.map(b"another message");
        assert_ne!(a, c);
    }

    #[test]
    fn share_codec() {
        let mut rng = StdRng::seed_from_u64(4);
        let share = Share {
            index: 7,
            private: Scalar::rand(&mut rng),
        };
        let encoded = share.encode();
        assert_eq!(encoded.len(), SHARE_LENGTH);

        // Index is little-endian on the wire
        assert_eq!(&encoded[..4], &[0x07, 0x00, 0x00, 0x00]);
        assert_eq!(Share::decode(encoded).unwrap(), share);
    }

    #[test]
    fn share_debug_redacted() {
        let share = Share {
            index: 1,
            private: Scalar::one(),
        };
        let out = format!("{:?}", share);
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("fffe"));
    }
}
