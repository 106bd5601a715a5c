//! Enumerations.
//!
//! An enumeration is encoded as the integer ordinal of its value. Decoding an ordinal that does
//! not name an enumerator substitutes the invalid value of the deployment instead of failing.

use super::integer::{self, Repr};
use crate::{Deployment, DeserializeError, Reader, SerializeError, Writer};

/// Enumeration backed by an integer type.
///
/// Implement this trait and use [`impl_enumeration`](crate::impl_enumeration) to derive
/// [`Serialize`](crate::Serialize) and [`Deserialize`](crate::Deserialize).
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{Enumeration, impl_enumeration};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Gear {
///     Park = 1,
///     Drive = 2,
/// }
///
/// impl Enumeration for Gear {
///     const BIT_WIDTH: u8 = 8;
///
///     fn ordinal(&self) -> i64 {
///         *self as i64
///     }
///
///     fn from_ordinal(ordinal: i64) -> Option<Self> {
///         match ordinal {
///             1 => Some(Self::Park),
///             2 => Some(Self::Drive),
///             _ => None,
///         }
///     }
/// }
///
/// impl_enumeration!(Gear);
/// ```
pub trait Enumeration: Sized {
    /// Width of the backing integer type in bits. Must be 8, 16, 32 or 64.
    const BIT_WIDTH: u8;

    /// Whether the backing integer type is signed.
    const SIGNED: bool = false;

    /// Returns the ordinal of the value.
    fn ordinal(&self) -> i64;

    /// Returns the enumerator with the given ordinal, if any.
    fn from_ordinal(ordinal: i64) -> Option<Self>;

    /// Returns the value representing the invalid value `ordinal` of a deployment.
    ///
    /// Enumerations able to hold any ordinal, such as newtypes over their backing integer,
    /// override this to return the raw ordinal even when no enumerator declares it. The default
    /// only represents ordinals that name an enumerator.
    fn from_invalid(ordinal: i64) -> Option<Self> {
        Self::from_ordinal(ordinal)
    }

    /// Returns the value substituted for undecodable ordinals under `deployment`.
    ///
    /// This is the invalid value of an enumeration deployment, built with
    /// [`Enumeration::from_invalid`].
    fn fallback(deployment: &Deployment) -> Option<Self> {
        match deployment {
            Deployment::Enumeration(deployment) => Self::from_invalid(deployment.invalid_value),
            _ => None,
        }
    }
}

fn repr<E: Enumeration>() -> Result<Repr, &'static str> {
    if matches!(E::BIT_WIDTH, 8 | 16 | 32 | 64) {
        Ok(Repr {
            bits: E::BIT_WIDTH,
            signed: E::SIGNED,
        })
    } else {
        Err("enumerations must be backed by an 8, 16, 32 or 64 bit integer")
    }
}

impl Writer {
    /// Serializes the ordinal of `value` according to `deployment`.
    ///
    /// Ordinals wider than the deployed bit width lose their upper bits.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment is neither empty nor an enumeration deployment, or if
    /// its bit width is not valid for the backing type.
    pub fn serialize_enum<E>(&mut self, value: &E, deployment: &Deployment) -> Result<(), SerializeError>
    where
        E: Enumeration,
    {
        let repr = repr::<E>().map_err(SerializeError::InvalidDeployment)?;
        let ordinal = i128::from(value.ordinal());
        match deployment {
            Deployment::Empty => {
                integer::put_native(self, ordinal, repr.bits);
                Ok(())
            }
            Deployment::Enumeration(deployment) => {
                let width = repr
                    .width(deployment.bit_width)
                    .map_err(SerializeError::InvalidDeployment)?;
                integer::put_integer(self, ordinal, width);
                Ok(())
            }
            other => Err(SerializeError::UnexpectedDeployment {
                expected: "enumeration",
                found: other.kind(),
            }),
        }
    }
}

impl Reader {
    /// Deserializes an enumeration according to `deployment`.
    ///
    /// With an enumeration deployment, an ordinal without a matching enumerator decodes to the
    /// invalid value of the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is too short, if the deployment does not apply, or if the
    /// ordinal names no enumerator and the type cannot represent the invalid value.
    pub fn deserialize_enum<E>(&mut self, deployment: &Deployment) -> Result<E, DeserializeError>
    where
        E: Enumeration,
    {
        let repr = repr::<E>().map_err(DeserializeError::InvalidDeployment)?;
        match deployment {
            Deployment::Empty => {
                let ordinal = integer::get_native(self, repr.bits, repr.signed)?;
                i64::try_from(ordinal)
                    .ok()
                    .and_then(E::from_ordinal)
                    .ok_or(DeserializeError::InvalidEnumerator(truncate(ordinal)))
            }
            Deployment::Enumeration(enumeration) => {
                let width = repr
                    .width(enumeration.bit_width)
                    .map_err(DeserializeError::InvalidDeployment)?;
                let ordinal = integer::get_integer(self, width, repr.signed)?;
                if let Some(value) = i64::try_from(ordinal).ok().and_then(E::from_ordinal) {
                    return Ok(value);
                }
                tracing::trace!(
                    ordinal = %ordinal,
                    invalid_value = enumeration.invalid_value,
                    "substituting unknown enumerator"
                );
                E::fallback(deployment).ok_or(DeserializeError::InvalidEnumerator(truncate(ordinal)))
            }
            other => Err(DeserializeError::UnexpectedDeployment {
                expected: "enumeration",
                found: other.kind(),
            }),
        }
    }
}

/// Reinterprets a decoded ordinal as the 64-bit value it was read from.
#[allow(clippy::cast_possible_truncation)]
fn truncate(ordinal: i128) -> i64 {
    ordinal as i64
}
