//! Integers restricted to a range.

use super::integer::{self, Repr};
use crate::{
    Deployment, DeserializeError, RangedIntegerDeployment, Reader, Serialize, SerializeError,
    TypeDeployment, Writer,
};

/// Returns the narrowest natural representation covering the range of `deployment`.
fn repr(deployment: &RangedIntegerDeployment) -> Result<Repr, &'static str> {
    if deployment.min > deployment.max {
        return Err("range minimum exceeds its maximum");
    }
    let (min, max) = (i128::from(deployment.min), i128::from(deployment.max));
    let signed = min < 0;
    let bits = [8u8, 16, 32, 64]
        .into_iter()
        .find(|&bits| {
            if signed {
                let half = 1i128 << (bits - 1);
                -half <= min && max < half
            } else {
                max < 1i128 << bits
            }
        })
        .unwrap_or(64);
    Ok(Repr { bits, signed })
}

/// Appends `value` if it lies within the range of `deployment`.
pub(crate) fn serialize(
    writer: &mut Writer,
    value: i128,
    deployment: &RangedIntegerDeployment,
) -> Result<(), SerializeError> {
    let repr = repr(deployment).map_err(SerializeError::InvalidDeployment)?;
    if !deployment.contains(value) {
        return Err(SerializeError::OutOfRange {
            value,
            min: i128::from(deployment.min),
            max: i128::from(deployment.max),
        });
    }
    integer::put_native(writer, value, repr.bits);
    Ok(())
}

/// Reads a value and checks that it lies within the range of `deployment`.
pub(crate) fn deserialize(
    reader: &mut Reader,
    deployment: &RangedIntegerDeployment,
) -> Result<i128, DeserializeError> {
    let repr = repr(deployment).map_err(DeserializeError::InvalidDeployment)?;
    let value = integer::get_native(reader, repr.bits, repr.signed)?;
    if deployment.contains(value) {
        Ok(value)
    } else {
        Err(DeserializeError::OutOfRange {
            value,
            min: i128::from(deployment.min),
            max: i128::from(deployment.max),
        })
    }
}

/// Integer restricted to the inclusive range `[MIN, MAX]`.
///
/// Without a deployment of its own, the value is encoded as if deployed with
/// `RangedIntegerDeployment::new(MIN, MAX)`.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::Ranged;
///
/// type Percent = Ranged<0, 100>;
///
/// assert_eq!(Percent::new(42).map(Percent::get), Some(42));
/// assert_eq!(Percent::new(101), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ranged<const MIN: i64, const MAX: i64>(i64);

impl<const MIN: i64, const MAX: i64> Ranged<MIN, MAX> {
    /// Creates a new [`Ranged`] if `value` lies within `[MIN, MAX]`.
    #[inline]
    #[must_use]
    pub const fn new(value: i64) -> Option<Self> {
        if MIN <= value && value <= MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the inner value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    fn deployment(deployment: &Deployment) -> Option<RangedIntegerDeployment> {
        match deployment {
            Deployment::Empty => Some(RangedIntegerDeployment::new(MIN, MAX)),
            Deployment::RangedInteger(deployment) => Some(*deployment),
            _ => None,
        }
    }
}

impl<const MIN: i64, const MAX: i64> Default for Ranged<MIN, MAX> {
    fn default() -> Self {
        Self(MIN)
    }
}

impl<const MIN: i64, const MAX: i64> TypeDeployment for Ranged<MIN, MAX> {}

impl<const MIN: i64, const MAX: i64> Serialize for Ranged<MIN, MAX> {
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        let range = Self::deployment(deployment).ok_or(SerializeError::UnexpectedDeployment {
            expected: "ranged integer",
            found: deployment.kind(),
        })?;
        serialize(writer, i128::from(self.0), &range)
    }
}

impl<const MIN: i64, const MAX: i64> crate::Deserialize for Ranged<MIN, MAX> {
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        let range = Self::deployment(deployment).ok_or(DeserializeError::UnexpectedDeployment {
            expected: "ranged integer",
            found: deployment.kind(),
        })?;
        let value = deserialize(reader, &range)?;
        i64::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(DeserializeError::OutOfRange {
                value,
                min: i128::from(MIN),
                max: i128::from(MAX),
            })
    }
}
