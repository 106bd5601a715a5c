//! Deserialization according to a deployment.
//!
//! Provides the [`Reader`], which reconstructs values from a message body, and the
//! [`Deserialize`] trait, which describes how a type is decoded for a given [`Deployment`].

use crate::{
    cursor::BitCursor, resolve, ByteOrder, Deployment, DeserializeError, LengthWidth,
    TypeDeployment,
};
use bytes::{Buf, Bytes};

/// Deserialize a value from a [`Reader`] according to a [`Deployment`].
pub trait Deserialize: TypeDeployment + Sized {
    /// Deserializes a value of this type from the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is too short, or if the decoded data violates the
    /// constraints of the deployment.
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError>;

    /// Returns the value substituted for an undecodable one, if the deployment defines any.
    ///
    /// Only enumerations define a fallback.
    fn fallback(deployment: &Deployment) -> Option<Self> {
        _ = deployment;
        None
    }
}

/// Reads values from a message body.
///
/// The reader carries a sticky error flag: once a value fails to decode, the flag is set and any
/// further reads are ignored.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{Deployment, IntegerDeployment, Reader};
///
/// let nibble = Deployment::from(IntegerDeployment::new(4));
/// let mut reader = Reader::new(vec![0xc4, 0x12, 0x34]);
/// let (mut a, mut b, mut c) = (0u8, 0u8, 0u16);
/// reader.read(&mut a, &nibble);
/// reader.read(&mut b, &nibble);
/// reader.read(&mut c, &Deployment::Empty);
///
/// assert!(!reader.has_error());
/// assert_eq!((a, b, c), (0x4, 0xc, 0x1234));
/// ```
#[derive(Debug)]
pub struct Reader {
    body: Bytes,
    position: usize,
    limit: usize,
    bits: BitCursor,
    byte_order: ByteOrder,
    error: bool,
}

impl Reader {
    /// Creates a new [`Reader`] over the given body.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            limit: body.len(),
            body,
            position: 0,
            bits: BitCursor::default(),
            byte_order: ByteOrder::default(),
            error: false,
        }
    }

    /// Returns `self` with the given byte order for numeric values.
    #[inline]
    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Returns the byte order of numeric values.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Reads a value into `value` according to `deployment`.
    ///
    /// An empty `deployment` falls back to the deployment of the type of the value. If the value
    /// cannot be decoded the error flag is set, and `value` is replaced by the fallback of the
    /// deployment if there is one, or left untouched otherwise.
    pub fn read<T>(&mut self, value: &mut T, deployment: &Deployment)
    where
        T: Deserialize,
    {
        if self.error {
            tracing::trace!("ignoring read on a failed stream");
            return;
        }
        let deployment = resolve(Some(deployment), T::type_deployment());
        match T::deserialize(self, deployment) {
            Ok(decoded) => *value = decoded,
            Err(error) => {
                tracing::debug!(%error, deployment = deployment.kind(), "value rejected by the reader");
                self.error = true;
                if let Some(fallback) = T::fallback(deployment) {
                    *value = fallback;
                }
            }
        }
    }

    /// Deserializes a value according to `deployment`, propagating any error.
    ///
    /// Unlike [`Reader::read`], this does not touch the error flag.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Deserialize::deserialize`].
    #[inline]
    pub fn deserialize<T>(&mut self, deployment: &Deployment) -> Result<T, DeserializeError>
    where
        T: Deserialize,
    {
        T::deserialize(self, deployment)
    }

    /// Deserializes a value with the deployment resolved from `site` and the type of the value.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Deserialize::deserialize`].
    #[inline]
    pub fn deserialize_site<T>(&mut self, site: Option<&Deployment>) -> Result<T, DeserializeError>
    where
        T: Deserialize,
    {
        T::deserialize(self, resolve(site, T::type_deployment()))
    }

    /// Whether a value failed to decode.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Returns the number of unread bytes.
    ///
    /// Inside a length-delimited value this only counts the bytes of that value.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Whether every byte has been read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether unread bits remain, either in the current byte or after it.
    pub(crate) fn has_pending(&self) -> bool {
        self.position < self.limit || !self.bits.is_aligned()
    }

    /// Returns the current byte position.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Discards the unread bits of a partially consumed byte.
    pub(crate) fn align(&mut self) {
        self.bits.align();
    }

    /// Extracts the next `width` bits of the bit stream.
    pub(crate) fn get_bits(&mut self, width: u8) -> Result<u64, DeserializeError> {
        let (body, position, limit) = (&self.body, &mut self.position, self.limit);
        self.bits.unpack(width, || {
            if *position < limit {
                let byte = body[*position];
                *position += 1;
                Ok(byte)
            } else {
                Err(DeserializeError::EndOfBuffer {
                    needed: 1,
                    remaining: 0,
                })
            }
        })
    }

    /// Returns the next `len` bytes, starting at the next byte boundary.
    pub(crate) fn get_slice(&mut self, len: usize) -> Result<Bytes, DeserializeError> {
        self.align();
        if len > self.remaining() {
            return Err(DeserializeError::EndOfBuffer {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = self.body.slice(self.position..self.position + len);
        self.position += len;
        Ok(slice)
    }

    /// Returns the next `size` bytes as an integer in the byte order of the reader.
    pub(crate) fn get_uint(&mut self, size: usize) -> Result<u64, DeserializeError> {
        let mut bytes = self.get_slice(size)?;
        Ok(match self.byte_order {
            ByteOrder::BigEndian => bytes.get_uint(size),
            ByteOrder::LittleEndian => bytes.get_uint_le(size),
        })
    }

    /// Returns the next `size` bytes as an integer in network byte order.
    pub(crate) fn get_field(&mut self, size: usize) -> Result<u64, DeserializeError> {
        Ok(self.get_slice(size)?.get_uint(size))
    }

    /// Returns the value of a length field.
    pub(crate) fn get_length(&mut self, width: LengthWidth) -> Result<usize, DeserializeError> {
        let length = self.get_field(width.size())?;
        usize::try_from(length).map_err(|_| DeserializeError::EndOfBuffer {
            needed: usize::MAX,
            remaining: self.remaining(),
        })
    }

    /// Skips the next `len` bytes.
    pub(crate) fn skip(&mut self, len: usize) -> Result<(), DeserializeError> {
        self.get_slice(len).map(|_| ())
    }

    /// Runs `f` with the reader restricted to the next `len` bytes.
    ///
    /// Unread bytes of the restricted region are skipped once `f` succeeds.
    pub(crate) fn limited<T>(
        &mut self,
        len: usize,
        f: impl FnOnce(&mut Self) -> Result<T, DeserializeError>,
    ) -> Result<T, DeserializeError> {
        self.align();
        if len > self.remaining() {
            return Err(DeserializeError::EndOfBuffer {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let outer = std::mem::replace(&mut self.limit, self.position + len);
        let result = f(self);
        self.align();
        if result.is_ok() {
            self.position = self.limit;
        }
        self.limit = outer;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::Nibble, IntegerDeployment, RangedIntegerDeployment};

    #[test]
    fn empty_site_falls_back_to_type_deployment() {
        let mut reader = Reader::new(vec![0xc4, 0x12]);
        let (mut low, mut high, mut byte) = (Nibble::default(), Nibble::default(), Nibble::default());
        reader.read(&mut low, &Deployment::Empty);
        reader.read(&mut high, &Deployment::Empty);
        reader.read(&mut byte, &IntegerDeployment::new(8).into());
        assert!(!reader.has_error());
        assert_eq!((low, high, byte), (Nibble(0x4), Nibble(0xc), Nibble(0x12)));
        assert!(reader.is_empty());
    }

    #[test]
    fn short_body_sets_error() {
        let mut reader = Reader::new(vec![0x01]);
        let mut value = 7u16;
        reader.read(&mut value, &Deployment::Empty);
        assert!(reader.has_error());
        assert_eq!(value, 7);
    }

    #[test]
    fn errored_stream_ignores_reads() {
        let mut reader = Reader::new(vec![0x09, 0x01]);
        let mut value = 0u8;
        reader.read(&mut value, &RangedIntegerDeployment::new(0, 5).into());
        reader.read(&mut value, &Deployment::Empty);
        assert!(reader.has_error());
        assert_eq!(value, 0);
    }

    #[test]
    fn byte_aligned_read_discards_pending_bits() {
        let mut reader = Reader::new(vec![0b1111_0101, 0xab]);
        let (mut bits, mut byte) = (0u8, 0u8);
        reader.read(&mut bits, &IntegerDeployment::new(3).into());
        reader.read(&mut byte, &Deployment::Empty);
        assert!(!reader.has_error());
        assert_eq!((bits, byte), (0b101, 0xab));
        assert!(reader.is_empty());
    }

    #[test]
    fn limited_region_is_skipped() {
        let mut reader = Reader::new(vec![1, 2, 3, 4]);
        let first = reader
            .limited(3, |reader| reader.get_uint(1))
            .expect("should read within the limit");
        assert_eq!(first, 1);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.get_uint(1), Ok(4));
    }

    #[test]
    fn limited_region_bounds_reads() {
        let mut reader = Reader::new(vec![1, 2, 3, 4]);
        assert_eq!(
            reader.limited(1, |reader| reader.get_uint(2)),
            Err(DeserializeError::EndOfBuffer {
                needed: 2,
                remaining: 1
            })
        );
        assert_eq!(
            reader.limited(5, |reader| reader.get_uint(1)),
            Err(DeserializeError::EndOfBuffer {
                needed: 5,
                remaining: 4
            })
        );
    }

    #[test]
    fn little_endian_values_keep_big_endian_fields() {
        let mut reader = Reader::new(vec![0x02, 0x01, 0x01, 0x02]).with_byte_order(ByteOrder::LittleEndian);
        assert_eq!(reader.get_uint(2), Ok(0x0102));
        assert_eq!(reader.get_field(2), Ok(0x0102));
    }
}
