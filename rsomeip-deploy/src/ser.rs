//! Serialization according to a deployment.
//!
//! Provides the [`Writer`], which appends encoded values to a message body, and the
//! [`Serialize`] trait, which describes how a type is encoded for a given [`Deployment`].

use crate::{
    cursor::BitCursor, resolve, ByteOrder, Deployment, LengthWidth, SerializeError,
    TypeDeployment,
};
use bytes::{BufMut, Bytes, BytesMut};

/// Serialize a value into a [`Writer`] according to a [`Deployment`].
///
/// Implementations either encode the value directly, or delegate to one of the aggregate helpers
/// of the writer like [`Writer::serialize_struct`] or [`Writer::serialize_union`].
pub trait Serialize: TypeDeployment {
    /// Serializes `self` into the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the value violates the constraints of the deployment, or if the
    /// deployment does not apply to the type. The writer discards anything written for the
    /// value in that case.
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError>;
}

impl<T> TypeDeployment for &T
where
    T: TypeDeployment + ?Sized,
{
    fn type_deployment() -> Option<&'static Deployment> {
        T::type_deployment()
    }
}

impl<T> Serialize for &T
where
    T: Serialize + ?Sized,
{
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        (*self).serialize(writer, deployment)
    }
}

/// Writes values into a message body.
///
/// The writer carries a sticky error flag: once a value is rejected, everything written for that
/// value is discarded, the flag is set, and any further writes are ignored.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{Deployment, IntegerDeployment, Writer};
///
/// let nibble = Deployment::from(IntegerDeployment::new(4));
/// let mut writer = Writer::new();
/// writer.write(&0x4u8, &nibble);
/// writer.write(&0xcu8, &nibble);
/// writer.write(&0x1234u16, &Deployment::Empty);
/// writer.flush();
///
/// assert!(!writer.has_error());
/// assert_eq!(writer.body(), [0xc4, 0x12, 0x34]);
/// ```
#[derive(Debug, Default)]
pub struct Writer {
    body: BytesMut,
    bits: BitCursor,
    byte_order: ByteOrder,
    error: bool,
}

impl Writer {
    /// Creates a new [`Writer`] with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Writer`] with at least `capacity` bytes reserved for the body.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(capacity),
            ..Self::default()
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

    /// Appends `value` to the body according to `deployment`.
    ///
    /// An empty `deployment` falls back to the deployment of the type of the value. If the value
    /// is rejected, nothing is written for it and the error flag is set.
    pub fn write<T>(&mut self, value: &T, deployment: &Deployment)
    where
        T: Serialize + ?Sized,
    {
        if self.error {
            tracing::trace!("ignoring write on a failed stream");
            return;
        }
        let deployment = resolve(Some(deployment), T::type_deployment());
        let (len, bits) = (self.body.len(), self.bits);
        if let Err(error) = value.serialize(self, deployment) {
            tracing::debug!(%error, deployment = deployment.kind(), "value rejected by the writer");
            self.body.truncate(len);
            self.bits = bits;
            self.error = true;
        }
    }

    /// Serializes `value` according to `deployment`, propagating any error.
    ///
    /// Unlike [`Writer::write`], this does not touch the error flag. It is meant to be used from
    /// [`Serialize`] implementations of aggregate types.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Serialize::serialize`].
    #[inline]
    pub fn serialize<T>(&mut self, value: &T, deployment: &Deployment) -> Result<(), SerializeError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self, deployment)
    }

    /// Serializes `value` with the deployment resolved from `site` and the type of the value.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Serialize::serialize`].
    #[inline]
    pub fn serialize_site<T>(
        &mut self,
        value: &T,
        site: Option<&Deployment>,
    ) -> Result<(), SerializeError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self, resolve(site, T::type_deployment()))
    }

    /// Commits any partially filled byte, zero-padding its unused bits.
    pub fn flush(&mut self) {
        let body = &mut self.body;
        self.bits.flush(|byte| body.put_u8(byte));
    }

    /// Whether a value was rejected by this writer.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Returns the number of committed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether no bytes have been committed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns the committed bytes.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Flushes the writer and returns the finished body.
    #[must_use]
    pub fn into_body(mut self) -> Bytes {
        self.flush();
        self.body.freeze()
    }

    /// Whether bits of a partially filled byte are waiting to be committed.
    pub(crate) fn has_pending_bits(&self) -> bool {
        !self.bits.is_aligned()
    }

    /// Appends the low `width` bits of `value` to the bit stream.
    pub(crate) fn put_bits(&mut self, value: u64, width: u8) {
        let body = &mut self.body;
        self.bits.pack(value, width, |byte| body.put_u8(byte));
    }

    /// Appends `src` at the next byte boundary.
    pub(crate) fn put_slice(&mut self, src: &[u8]) {
        self.flush();
        self.body.put_slice(src);
    }

    /// Appends `count` zero bytes at the next byte boundary.
    pub(crate) fn put_zeros(&mut self, count: usize) {
        self.flush();
        self.body.put_bytes(0, count);
    }

    /// Appends the low `size` bytes of `value` in the byte order of the writer.
    pub(crate) fn put_uint(&mut self, value: u64, size: usize) {
        self.flush();
        match self.byte_order {
            ByteOrder::BigEndian => self.body.put_uint(value, size),
            ByteOrder::LittleEndian => self.body.put_uint_le(value, size),
        }
    }

    /// Appends the low `size` bytes of `value` in network byte order.
    ///
    /// Used for length and type fields, which ignore the byte order of the writer.
    pub(crate) fn put_field(&mut self, value: u64, size: usize) {
        self.flush();
        self.body.put_uint(value, size);
    }

    /// Appends a length field of known value.
    pub(crate) fn put_length(
        &mut self,
        length: usize,
        width: LengthWidth,
    ) -> Result<(), SerializeError> {
        if length > width.max_length() {
            return Err(SerializeError::LengthOverflow {
                length,
                width: width.size(),
            });
        }
        self.put_field(length as u64, width.size());
        Ok(())
    }

    /// Reserves space for a length field whose value is not known yet.
    pub(crate) fn reserve_length(&mut self, width: LengthWidth) -> Placeholder {
        self.flush();
        let offset = self.body.len();
        self.body.put_bytes(0, width.size());
        Placeholder { offset, width }
    }

    /// Fills the `placeholder` with the number of bytes written since `start`.
    pub(crate) fn patch_length(
        &mut self,
        placeholder: Placeholder,
        start: usize,
    ) -> Result<(), SerializeError> {
        self.flush();
        let length = self.body.len() - start;
        let size = placeholder.width.size();
        if length > placeholder.width.max_length() {
            return Err(SerializeError::LengthOverflow {
                length,
                width: size,
            });
        }
        let bytes = (length as u64).to_be_bytes();
        self.body[placeholder.offset..placeholder.offset + size]
            .copy_from_slice(&bytes[bytes.len() - size..]);
        Ok(())
    }
}

/// Length field reserved before its value is known.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Placeholder {
    offset: usize,
    width: LengthWidth,
}

impl Placeholder {
    /// Returns the position right after the length field.
    pub fn end(&self) -> usize {
        self.offset + self.width.size()
    }
}
