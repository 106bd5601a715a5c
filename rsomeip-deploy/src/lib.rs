#![doc = include_str!("../README.md")]
#![warn(
    clippy::nursery,
    clippy::pedantic,
    clippy::expect_used,
    clippy::unwrap_used
)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

// Re-export for convenience.
pub use bytes::{Bytes, BytesMut};

mod cursor;

mod deployment;
pub use deployment::{
    resolve, ArrayDeployment, ByteBufferDeployment, Deployment, EnumerationDeployment,
    IntegerDeployment, MapDeployment, RangedIntegerDeployment, StringDeployment, StringEncoding,
    StructDeployment, TypeDeployment, UnionDeployment,
};

mod error;
pub use error::{DeploymentError, DeserializeError, SerializeError};

mod ser;
pub use ser::{Serialize, Writer};

mod de;
pub use de::{Deserialize, Reader};

mod codec;
pub use codec::{Alternative, Enumeration, FieldReader, FieldWriter, Ranged};

mod macros;

#[cfg(test)]
mod testing;

/// Size of a length field.
///
/// Dynamically sized values can be preceded by a length field which is 1, 2, or 4 bytes long.
/// [`LengthWidth::None`] omits the field, in which case the size of the value is fixed by its
/// deployment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub enum LengthWidth {
    #[default]
    None,
    U8,
    U16,
    U32,
}

impl LengthWidth {
    /// Returns the size of the length field in bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_deploy::LengthWidth;
    ///
    /// assert_eq!(LengthWidth::None.size(), 0);
    /// assert_eq!(LengthWidth::U16.size(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::None => 0,
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Returns the largest length representable by the field.
    ///
    /// A missing length field cannot represent any length, so this returns `0` for
    /// [`LengthWidth::None`].
    #[inline]
    #[must_use]
    pub const fn max_length(self) -> usize {
        match self {
            Self::None => 0,
            Self::U8 => u8::MAX as usize,
            Self::U16 => u16::MAX as usize,
            Self::U32 => u32::MAX as usize,
        }
    }

    /// Whether the length field is omitted.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl TryFrom<u8> for LengthWidth {
    type Error = DeploymentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::U8),
            2 => Ok(Self::U16),
            4 => Ok(Self::U32),
            other => Err(DeploymentError::LengthWidth(other)),
        }
    }
}

impl From<LengthWidth> for u8 {
    fn from(value: LengthWidth) -> Self {
        match value {
            LengthWidth::None => 0,
            LengthWidth::U8 => 1,
            LengthWidth::U16 => 2,
            LengthWidth::U32 => 4,
        }
    }
}

/// Size of the type field of a union.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub enum TypeWidth {
    U8,
    U16,
    #[default]
    U32,
}

impl TypeWidth {
    /// Returns the size of the type field in bytes.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Returns the largest type index representable by the field.
    #[inline]
    #[must_use]
    pub const fn max_index(self) -> u32 {
        match self {
            Self::U8 => u8::MAX as u32,
            Self::U16 => u16::MAX as u32,
            Self::U32 => u32::MAX,
        }
    }
}

impl TryFrom<u8> for TypeWidth {
    type Error = DeploymentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::U8),
            2 => Ok(Self::U16),
            4 => Ok(Self::U32),
            other => Err(DeploymentError::TypeWidth(other)),
        }
    }
}

impl From<TypeWidth> for u8 {
    fn from(value: TypeWidth) -> Self {
        match value {
            TypeWidth::U8 => 1,
            TypeWidth::U16 => 2,
            TypeWidth::U32 => 4,
        }
    }
}

/// Byte order of multi-byte numeric values.
///
/// Length and type fields are always big endian. The byte order only affects the values
/// themselves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}
