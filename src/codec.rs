//! Byte-level encoding of the types this crate puts on the wire.
//!
//! Every wire entity has a fixed little-endian layout, so the traits here are
//! deliberately small: a type knows how to write itself to a buffer, how to
//! read itself back (possibly with a length hint for container types), and how
//! many bytes it occupies. Decoding untrusted input is strict: short buffers,
//! trailing bytes, and structurally invalid payloads all fail with [Error].

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// Error type for decode operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("invalid data in {0}: {1}")]
    Invalid(&'static str, &'static str), // context, reason
}

/// Trait for types that can be written (encoded) to a buffer.
pub trait Write {
    /// Encodes this value by writing to a buffer.
    ///
    /// Implementations may panic if the buffer doesn't have enough capacity.
    fn write(&self, buf: &mut impl BufMut);
}

/// Trait for types that can be read (decoded) from a buffer.
///
/// The `Cfg` type parameter allows for configuration during the read process
/// (e.g. the expected coefficient count of a polynomial). Use `()` for types
/// that do not require configuration.
pub trait Read<Cfg = ()>: Sized {
    /// Reads a value from the buffer, consuming the necessary bytes.
    fn read_cfg(buf: &mut impl Buf, cfg: &Cfg) -> Result<Self, Error>;
}

/// Trait for types whose encoded length depends on the value.
pub trait EncodeSize {
    /// The exact number of bytes that `write()` will produce.
    fn encode_size(&self) -> usize;
}

/// Trait for types with a known, fixed encoded length.
pub trait FixedSize {
    /// The length of the encoded value.
    const SIZE: usize;
}

impl<T: FixedSize> EncodeSize for T {
    fn encode_size(&self) -> usize {
        Self::SIZE
    }
}

/// Trait for types that can be encoded to a fresh buffer.
pub trait Encode: Write + EncodeSize {
    /// Encodes a value to a `BytesMut` buffer.
    ///
    /// Panics if the `write` implementation does not write the expected
    /// number of bytes.
    fn encode(&self) -> BytesMut {
        let len = self.encode_size();
        let mut buffer = BytesMut::with_capacity(len);
        self.write(&mut buffer);
        assert_eq!(buffer.len(), len, "write() did not write expected bytes");
        buffer
    }
}

impl<T: Write + EncodeSize> Encode for T {}

/// Trait for types that can be decoded from a buffer, ensuring the entire
/// buffer is consumed.
pub trait Decode<Cfg = ()>: Read<Cfg> {
    /// Decodes a value from a buffer, rejecting trailing bytes.
    fn decode_cfg(mut buf: impl Buf, cfg: &Cfg) -> Result<Self, Error> {
        let result = Self::read_cfg(&mut buf, cfg)?;
        let remaining = buf.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(result)
    }
}

impl<Cfg, T: Read<Cfg>> Decode<Cfg> for T {}

/// Extension trait providing an ergonomic read method for types requiring no
/// configuration.
pub trait ReadExt: Read<()> {
    /// Reads a value using the default `()` config.
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Self::read_cfg(buf, &())
    }
}

impl<T: Read<()>> ReadExt for T {}

/// Extension trait providing an ergonomic decode method for types requiring no
/// configuration.
pub trait DecodeExt: Decode<()> {
    /// Decodes a value using the default `()` config.
    fn decode(buf: impl Buf) -> Result<Self, Error> {
        Self::decode_cfg(buf, &())
    }
}

impl<T: Decode<()>> DecodeExt for T {}

impl Write for u32 {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(*self);
    }
}

impl Read for u32 {
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        if buf.remaining() < Self::SIZE {
            return Err(Error::EndOfBuffer);
        }
        Ok(buf.get_u32_le())
    }
}

impl FixedSize for u32 {
    const SIZE: usize = std::mem::size_of::<u32>();
}
