//! Integers, booleans and floating point numbers.

use super::ranged;
use crate::{
    cursor::mask, Deployment, DeserializeError, Reader, Serialize, SerializeError,
    TypeDeployment, Writer,
};

/// Native representation of an integer type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Repr {
    pub bits: u8,
    pub signed: bool,
}

impl Repr {
    /// Returns the effective width of a deployment requesting `bit_width` bits.
    pub fn width(self, bit_width: u8) -> Result<u8, &'static str> {
        let width = bit_width.min(self.bits);
        if width == 0 {
            Err("bit width must be positive")
        } else if self.signed && width < 2 {
            Err("signed integers need at least 2 bits")
        } else {
            Ok(width)
        }
    }
}

/// Appends `value` as a two's complement integer of `width` bits.
///
/// Widths up to 8 bits join the bit stream, wider values start at the next byte boundary.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn put_integer(writer: &mut Writer, value: i128, width: u8) {
    let raw = (value as u64) & mask(width);
    if width <= 8 {
        writer.put_bits(raw, width);
    } else {
        writer.put_uint(raw, usize::from(width.div_ceil(8)));
    }
}

/// Reads an integer of `width` bits, sign-extending it if `signed`.
pub(crate) fn get_integer(
    reader: &mut Reader,
    width: u8,
    signed: bool,
) -> Result<i128, DeserializeError> {
    let raw = if width <= 8 {
        reader.get_bits(width)?
    } else {
        reader.get_uint(usize::from(width.div_ceil(8)))?
    };
    Ok(extend(raw, width, signed))
}

/// Appends `value` at the native width of `bits`, starting at the next byte boundary.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn put_native(writer: &mut Writer, value: i128, bits: u8) {
    writer.put_uint((value as u64) & mask(bits), usize::from(bits / 8));
}

/// Reads an integer at the native width of `bits`, sign-extending it if `signed`.
pub(crate) fn get_native(
    reader: &mut Reader,
    bits: u8,
    signed: bool,
) -> Result<i128, DeserializeError> {
    let raw = reader.get_uint(usize::from(bits / 8))?;
    Ok(extend(raw, bits, signed))
}

/// Interprets the low `width` bits of `raw` as an integer.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn extend(raw: u64, width: u8, signed: bool) -> i128 {
    let raw = raw & mask(width);
    if signed {
        let shift = 64 - u32::from(width);
        i128::from(((raw << shift) as i64) >> shift)
    } else {
        i128::from(raw)
    }
}

fn serialize_integer(
    writer: &mut Writer,
    value: i128,
    repr: Repr,
    deployment: &Deployment,
) -> Result<(), SerializeError> {
    match deployment {
        Deployment::Empty => {
            put_native(writer, value, repr.bits);
            Ok(())
        }
        Deployment::Integer(deployment) => {
            let width = repr
                .width(deployment.bit_width)
                .map_err(SerializeError::InvalidDeployment)?;
            put_integer(writer, value, width);
            Ok(())
        }
        Deployment::RangedInteger(deployment) => ranged::serialize(writer, value, deployment),
        other => Err(SerializeError::UnexpectedDeployment {
            expected: "integer",
            found: other.kind(),
        }),
    }
}

fn deserialize_integer(
    reader: &mut Reader,
    repr: Repr,
    deployment: &Deployment,
) -> Result<i128, DeserializeError> {
    match deployment {
        Deployment::Empty => get_native(reader, repr.bits, repr.signed),
        Deployment::Integer(deployment) => {
            let width = repr
                .width(deployment.bit_width)
                .map_err(DeserializeError::InvalidDeployment)?;
            get_integer(reader, width, repr.signed)
        }
        Deployment::RangedInteger(deployment) => ranged::deserialize(reader, deployment),
        other => Err(DeserializeError::UnexpectedDeployment {
            expected: "integer",
            found: other.kind(),
        }),
    }
}

macro_rules! integer {
    ($t:ty, $bits:literal, $signed:literal) => {
        impl TypeDeployment for $t {}

        impl Serialize for $t {
            fn serialize(
                &self,
                writer: &mut Writer,
                deployment: &Deployment,
            ) -> Result<(), SerializeError> {
                let repr = Repr {
                    bits: $bits,
                    signed: $signed,
                };
                serialize_integer(writer, i128::from(*self), repr, deployment)
            }
        }

        impl crate::Deserialize for $t {
            fn deserialize(
                reader: &mut Reader,
                deployment: &Deployment,
            ) -> Result<Self, DeserializeError> {
                let repr = Repr {
                    bits: $bits,
                    signed: $signed,
                };
                let value = deserialize_integer(reader, repr, deployment)?;
                Self::try_from(value).map_err(|_| DeserializeError::OutOfRange {
                    value,
                    min: i128::from(Self::MIN),
                    max: i128::from(Self::MAX),
                })
            }
        }
    };
}

integer!(u8, 8, false);
integer!(u16, 16, false);
integer!(u32, 32, false);
integer!(u64, 64, false);
integer!(i8, 8, true);
integer!(i16, 16, true);
integer!(i32, 32, true);
integer!(i64, 64, true);

impl TypeDeployment for bool {}

impl Serialize for bool {
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        match deployment {
            Deployment::Empty => {
                writer.put_uint(u64::from(*self), 1);
                Ok(())
            }
            Deployment::Integer(deployment) => {
                let repr = Repr {
                    bits: 8,
                    signed: false,
                };
                let width = repr
                    .width(deployment.bit_width)
                    .map_err(SerializeError::InvalidDeployment)?;
                put_integer(writer, i128::from(*self), width);
                Ok(())
            }
            other => Err(SerializeError::UnexpectedDeployment {
                expected: "boolean",
                found: other.kind(),
            }),
        }
    }
}

impl crate::Deserialize for bool {
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        match deployment {
            Deployment::Empty => Ok(reader.get_uint(1)? != 0),
            Deployment::Integer(deployment) => {
                let repr = Repr {
                    bits: 8,
                    signed: false,
                };
                let width = repr
                    .width(deployment.bit_width)
                    .map_err(DeserializeError::InvalidDeployment)?;
                Ok(get_integer(reader, width, false)? != 0)
            }
            other => Err(DeserializeError::UnexpectedDeployment {
                expected: "boolean",
                found: other.kind(),
            }),
        }
    }
}

macro_rules! float {
    ($t:ty, $size:literal) => {
        impl TypeDeployment for $t {}

        impl Serialize for $t {
            fn serialize(
                &self,
                writer: &mut Writer,
                deployment: &Deployment,
            ) -> Result<(), SerializeError> {
                if !deployment.is_empty() {
                    return Err(SerializeError::UnexpectedDeployment {
                        expected: "floating point number",
                        found: deployment.kind(),
                    });
                }
                writer.put_uint(u64::from(self.to_bits()), $size);
                Ok(())
            }
        }

        impl crate::Deserialize for $t {
            #[allow(clippy::cast_possible_truncation)]
            fn deserialize(
                reader: &mut Reader,
                deployment: &Deployment,
            ) -> Result<Self, DeserializeError> {
                if !deployment.is_empty() {
                    return Err(DeserializeError::UnexpectedDeployment {
                        expected: "floating point number",
                        found: deployment.kind(),
                    });
                }
                Ok(Self::from_bits(reader.get_uint($size)? as _))
            }
        }
    };
}

float!(f32, 4);
float!(f64, 8);

#[cfg(test)]
mod tests {
    use crate::{
        testing::{decode, encode, gen_range, round_trip},
        ByteOrder, Deployment, IntegerDeployment, Reader, StringDeployment, Writer,
    };

    fn width(bit_width: u8) -> Deployment {
        IntegerDeployment::new(bit_width).into()
    }

    #[test]
    fn nibbles_share_a_byte() {
        let mut writer = Writer::new();
        writer.write(&0x4u8, &width(4));
        writer.write(&0xcu8, &width(4));
        assert_eq!(writer.into_body()[..], [0xc4]);
    }

    #[test]
    fn widths_beyond_the_type_are_clamped() {
        for bit_width in 9..=32 {
            assert_eq!(encode(&0xffu8, &width(bit_width)), Some(vec![0xff]));
        }
    }

    #[test]
    fn sub_byte_width_keeps_low_bits() {
        for bit_width in 1..=8 {
            let expected = u8::MAX >> (8 - bit_width);
            assert_eq!(encode(&u8::MAX, &width(bit_width)), Some(vec![expected]));
        }
    }

    #[test]
    fn wide_integers_use_whole_bytes() {
        assert_eq!(encode(&0xffffu16, &width(12)), Some(vec![0x0f, 0xff]));
        assert_eq!(
            encode(&0x0102_0304u32, &width(24)),
            Some(vec![0x02, 0x03, 0x04])
        );
        assert_eq!(decode::<u16>(&[0x0f, 0xff], &width(12)), Some(0x0fff));
    }

    #[test]
    fn signed_values_are_sign_extended() {
        assert_eq!(encode(&-1i8, &width(2)), Some(vec![0b11]));
        assert_eq!(decode::<i8>(&[0b11], &width(2)), Some(-1));
        assert_eq!(round_trip(&-10101i16, &width(2)), Some(-1));
        assert_eq!(round_trip(&10101i16, &width(2)), Some(1));
        assert_eq!(round_trip(&10101u16, &width(1)), Some(1));
        assert_eq!(round_trip(&-300i32, &width(12)), Some(-300));
    }

    #[test]
    fn signed_integers_need_two_bits() {
        assert_eq!(encode(&1i8, &width(1)), None);
        assert_eq!(encode(&1u8, &width(0)), None);
        assert_eq!(decode::<i16>(&[0x01], &width(1)), None);
    }

    #[test]
    fn empty_deployment_uses_native_width() {
        assert_eq!(encode(&0x0102u16, &Deployment::Empty), Some(vec![1, 2]));
        assert_eq!(encode(&-2i32, &Deployment::Empty), Some(vec![0xff, 0xff, 0xff, 0xfe]));
        assert_eq!(round_trip(&u64::MAX, &Deployment::Empty), Some(u64::MAX));
        assert_eq!(round_trip(&i64::MIN, &Deployment::Empty), Some(i64::MIN));
    }

    #[test]
    fn little_endian_byte_order() {
        let mut writer = Writer::new().with_byte_order(ByteOrder::LittleEndian);
        writer.write(&0x0102_0304u32, &Deployment::Empty);
        writer.write(&0x0fffu16, &width(12));
        let body = writer.into_body();
        assert_eq!(body[..], [4, 3, 2, 1, 0xff, 0x0f]);

        let mut reader = Reader::new(body).with_byte_order(ByteOrder::LittleEndian);
        let (mut a, mut b) = (0u32, 0u16);
        reader.read(&mut a, &Deployment::Empty);
        reader.read(&mut b, &width(12));
        assert!(!reader.has_error());
        assert_eq!((a, b), (0x0102_0304, 0x0fff));
    }

    #[test]
    fn packed_values_round_trip_in_order() {
        for _ in 0..50 {
            let bit_width = gen_range(2..=8u8);
            let half = 1i16 << (bit_width - 1);
            let values: Vec<i8> = (0..gen_range(1..20))
                .map(|_| i8::try_from(gen_range(-half..half)).expect("should fit in an i8"))
                .collect();

            let mut writer = Writer::new();
            for value in &values {
                writer.write(value, &width(bit_width));
            }
            let body = writer.into_body();
            assert_eq!(body.len(), (values.len() * usize::from(bit_width)).div_ceil(8));

            let mut reader = Reader::new(body);
            for expected in values {
                let mut value = 0i8;
                reader.read(&mut value, &width(bit_width));
                assert_eq!(value, expected);
            }
            assert!(!reader.has_error());
        }
    }

    #[test]
    fn booleans() {
        assert_eq!(encode(&true, &Deployment::Empty), Some(vec![1]));
        assert_eq!(decode::<bool>(&[0], &Deployment::Empty), Some(false));

        let mut writer = Writer::new();
        writer.write(&true, &width(1));
        writer.write(&false, &width(1));
        writer.write(&true, &width(1));
        assert_eq!(writer.into_body()[..], [0b101]);
    }

    #[test]
    fn floats_use_native_encoding() {
        assert_eq!(encode(&1.5f32, &Deployment::Empty), Some(vec![0x3f, 0xc0, 0, 0]));
        assert_eq!(round_trip(&-2.25f64, &Deployment::Empty), Some(-2.25));
        assert_eq!(encode(&1.5f32, &width(8)), None);
    }

    #[test]
    fn mismatched_deployment_is_rejected() {
        let string = Deployment::from(StringDeployment::default());
        assert_eq!(encode(&1u8, &string), None);
        assert_eq!(decode::<u8>(&[1], &string), None);
    }
}
