//! Unions.
//!
//! A union carries the 1-based index of the active alternative in a type field, followed by the
//! alternative itself. With a length field, the field covers the alternative only and is placed
//! before the type field, or after it in the extended format. Without one, the alternative is
//! zero-padded up to the maximum length of the deployment.

use crate::{
    Deployment, Deserialize, DeserializeError, LengthWidth, Reader, Serialize, SerializeError,
    TypeWidth, UnionDeployment, Writer,
};

static DEFAULT: UnionDeployment =
    UnionDeployment::new(LengthWidth::U32, TypeWidth::U32, false, 0);

fn union_deployment(deployment: &Deployment) -> Result<&UnionDeployment, &'static str> {
    match deployment {
        Deployment::Empty => Ok(&DEFAULT),
        Deployment::Union(deployment) => Ok(deployment),
        other => Err(other.kind()),
    }
}

/// Whether `index` is representable by the type field and names a declared alternative.
fn is_valid_index(deployment: &UnionDeployment, index: u32) -> bool {
    let declared = deployment.alternatives.is_empty()
        || usize::try_from(index).is_ok_and(|index| index <= deployment.alternatives.len());
    index >= 1 && index <= deployment.type_width.max_index() && declared
}

/// Active alternative of a union being deserialized.
///
/// Created by [`Reader::deserialize_union`].
#[derive(Debug)]
pub struct Alternative<'a> {
    reader: &'a mut Reader,
    site: Option<&'a Deployment>,
}

impl Alternative<'_> {
    /// Deserializes the alternative as a `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the alternative cannot be deserialized.
    pub fn read<T>(self) -> Result<T, DeserializeError>
    where
        T: Deserialize,
    {
        self.reader.deserialize_site(self.site)
    }
}

impl Writer {
    /// Serializes `value` as the alternative with the 1-based `index` of a union.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment is not a union deployment, if the index is not valid
    /// for it, if the value fails, or if the value does not fit in the length of the union.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_deploy::{LengthWidth, TypeWidth, UnionDeployment, Writer};
    ///
    /// let deployment = UnionDeployment::new(LengthWidth::U8, TypeWidth::U8, false, 0);
    ///
    /// let mut writer = Writer::new();
    /// writer
    ///     .serialize_union(&deployment.into(), 2, &0x1234u16)
    ///     .expect("should serialize the union");
    /// assert_eq!(writer.body(), [2, 2, 0x12, 0x34]);
    /// ```
    pub fn serialize_union<T>(
        &mut self,
        deployment: &Deployment,
        index: u32,
        value: &T,
    ) -> Result<(), SerializeError>
    where
        T: Serialize + ?Sized,
    {
        let deployment =
            union_deployment(deployment).map_err(|found| SerializeError::UnexpectedDeployment {
                expected: "union",
                found,
            })?;
        if !is_valid_index(deployment, index) {
            return Err(SerializeError::InvalidTypeIndex(index));
        }
        let site = deployment.alternative(index);
        let type_size = deployment.type_width.size();

        if deployment.length_width.is_none() {
            self.put_field(u64::from(index), type_size);
            let start = self.len();
            self.serialize_site(value, site)?;
            self.flush();
            let size = self.len() - start;
            if deployment.max_length > 0 {
                if size > deployment.max_length {
                    return Err(SerializeError::TooLong {
                        found: size,
                        max: deployment.max_length,
                    });
                }
                self.put_zeros(deployment.max_length - size);
            }
            return Ok(());
        }

        let placeholder = if deployment.is_extended_format {
            self.put_field(u64::from(index), type_size);
            self.reserve_length(deployment.length_width)
        } else {
            let placeholder = self.reserve_length(deployment.length_width);
            self.put_field(u64::from(index), type_size);
            placeholder
        };
        let start = self.len();
        self.serialize_site(value, site)?;
        self.patch_length(placeholder, start)
    }
}

impl Reader {
    /// Deserializes a union, handing its type index and active alternative to `f`.
    ///
    /// `f` is expected to return [`DeserializeError::InvalidTypeIndex`] for indexes it does not
    /// know about.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment is not a union deployment, if the type index is not
    /// valid for it, if the alternative fails, or if the alternative exceeds the maximum length
    /// of the union.
    pub fn deserialize_union<T>(
        &mut self,
        deployment: &Deployment,
        f: impl FnOnce(u32, Alternative<'_>) -> Result<T, DeserializeError>,
    ) -> Result<T, DeserializeError> {
        let deployment = union_deployment(deployment).map_err(|found| {
            DeserializeError::UnexpectedDeployment {
                expected: "union",
                found,
            }
        })?;
        let type_size = deployment.type_width.size();

        if deployment.length_width.is_none() {
            let index = self.get_index(deployment, type_size)?;
            let start = self.position();
            let value = f(
                index,
                Alternative {
                    reader: self,
                    site: deployment.alternative(index),
                },
            )?;
            self.align();
            let size = self.position() - start;
            if deployment.max_length > 0 {
                if size > deployment.max_length {
                    return Err(DeserializeError::LengthOutOfBounds {
                        found: size,
                        min: 0,
                        max: deployment.max_length,
                    });
                }
                self.skip(deployment.max_length - size)?;
            }
            return Ok(value);
        }

        let (index, length) = if deployment.is_extended_format {
            let index = self.get_index(deployment, type_size)?;
            (index, self.get_length(deployment.length_width)?)
        } else {
            let length = self.get_length(deployment.length_width)?;
            (self.get_index(deployment, type_size)?, length)
        };
        self.limited(length, |reader| {
            f(
                index,
                Alternative {
                    reader,
                    site: deployment.alternative(index),
                },
            )
        })
    }

    fn get_index(
        &mut self,
        deployment: &UnionDeployment,
        type_size: usize,
    ) -> Result<u32, DeserializeError> {
        let raw = self.get_field(type_size)?;
        let index = u32::try_from(raw).map_err(|_| DeserializeError::InvalidTypeIndex(u32::MAX))?;
        if is_valid_index(deployment, index) {
            Ok(index)
        } else {
            Err(DeserializeError::InvalidTypeIndex(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{decode, encode, round_trip},
        IntegerDeployment, StringDeployment, StringEncoding, TypeDeployment,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Value {
        Flag(bool),
        Number(u32),
        Text(String),
    }

    impl Default for Value {
        fn default() -> Self {
            Self::Flag(false)
        }
    }

    impl TypeDeployment for Value {}

    impl Serialize for Value {
        fn serialize(
            &self,
            writer: &mut Writer,
            deployment: &Deployment,
        ) -> Result<(), SerializeError> {
            match self {
                Self::Flag(value) => writer.serialize_union(deployment, 1, value),
                Self::Number(value) => writer.serialize_union(deployment, 2, value),
                Self::Text(value) => writer.serialize_union(deployment, 3, value),
            }
        }
    }

    impl Deserialize for Value {
        fn deserialize(
            reader: &mut Reader,
            deployment: &Deployment,
        ) -> Result<Self, DeserializeError> {
            reader.deserialize_union(deployment, |index, alternative| match index {
                1 => alternative.read().map(Self::Flag),
                2 => alternative.read().map(Self::Number),
                3 => alternative.read().map(Self::Text),
                other => Err(DeserializeError::InvalidTypeIndex(other)),
            })
        }
    }

    fn union(
        length_width: LengthWidth,
        type_width: TypeWidth,
        is_extended_format: bool,
        max_length: usize,
    ) -> Deployment {
        UnionDeployment::new(length_width, type_width, is_extended_format, max_length).into()
    }

    fn text() -> Value {
        Value::Text(String::from("123"))
    }

    const TEXT: [u8; 11] = [0, 0, 0, 7, 0xef, 0xbb, 0xbf, b'1', b'2', b'3', 0];

    #[test]
    fn length_precedes_type_by_default() {
        let deployment = union(LengthWidth::U32, TypeWidth::U8, false, 12);
        let body = encode(&text(), &deployment).expect("should encode the union");
        assert_eq!(body[..5], [0, 0, 0, 11, 3]);
        assert_eq!(body[5..], TEXT);
        assert_eq!(decode::<Value>(&body, &deployment), Some(text()));
    }

    #[test]
    fn extended_format_puts_type_first() {
        let deployment = union(LengthWidth::U8, TypeWidth::U16, true, 10);
        let body = encode(&text(), &deployment).expect("should encode the union");
        assert_eq!(body[..3], [0, 3, 11]);
        assert_eq!(body[3..], TEXT);
        assert_eq!(decode::<Value>(&body, &deployment), Some(text()));
    }

    #[test]
    fn fixed_size_union_without_padding() {
        let deployment = union(LengthWidth::None, TypeWidth::U8, true, 11);
        let body = encode(&text(), &deployment).expect("should encode the union");
        assert_eq!(body[..1], [3]);
        assert_eq!(body[1..], TEXT);
        assert_eq!(decode::<Value>(&body, &deployment), Some(text()));
    }

    #[test]
    fn fixed_size_union_is_padded() {
        let deployment = union(LengthWidth::None, TypeWidth::U8, false, 4);
        assert_eq!(
            encode(&Value::Flag(true), &deployment),
            Some(vec![1, 1, 0, 0, 0])
        );
        assert_eq!(
            decode::<Value>(&[1, 1, 0, 0, 0], &deployment),
            Some(Value::Flag(true))
        );
        assert_eq!(decode::<Value>(&[1, 1, 0, 0], &deployment), None);
    }

    #[test]
    fn fixed_size_union_rejects_larger_alternatives() {
        let deployment = union(LengthWidth::None, TypeWidth::U8, false, 2);
        assert_eq!(encode(&text(), &deployment), None);
        let mut body = vec![3];
        body.extend_from_slice(&TEXT);
        assert_eq!(decode::<Value>(&body, &deployment), None);
    }

    #[test]
    fn empty_deployment_uses_four_byte_fields() {
        assert_eq!(
            encode(&Value::Number(7), &Deployment::Empty),
            Some(vec![0, 0, 0, 4, 0, 0, 0, 2, 0, 0, 0, 7])
        );
        assert_eq!(
            round_trip(&Value::Number(7), &Deployment::Empty),
            Some(Value::Number(7))
        );
    }

    #[test]
    fn alternatives_use_their_deployments() {
        let deployment = UnionDeployment::new(LengthWidth::U8, TypeWidth::U8, false, 0)
            .with_alternative(IntegerDeployment::new(1))
            .with_alternative(IntegerDeployment::new(12))
            .with_alternative(StringDeployment::new(0, LengthWidth::U8, StringEncoding::Utf16Le))
            .into();
        assert_eq!(
            encode(&Value::Flag(true), &deployment),
            Some(vec![1, 1, 1])
        );
        assert_eq!(
            encode(&Value::Number(0xabc), &deployment),
            Some(vec![2, 2, 0x0a, 0xbc])
        );
        assert_eq!(
            encode(&Value::Text(String::from("a")), &deployment),
            Some(vec![7, 3, 6, 0xff, 0xfe, b'a', 0, 0, 0])
        );
        for value in [Value::Flag(true), Value::Number(0xabc), text()] {
            assert_eq!(round_trip(&value, &deployment), Some(value));
        }
    }

    #[test]
    fn invalid_indexes_are_rejected() {
        let deployment = union(LengthWidth::U8, TypeWidth::U8, false, 0);
        let mut writer = Writer::new();
        assert_eq!(
            writer.serialize_union(&deployment, 0, &1u8),
            Err(SerializeError::InvalidTypeIndex(0))
        );
        assert_eq!(
            writer.serialize_union(&deployment, 256, &1u8),
            Err(SerializeError::InvalidTypeIndex(256))
        );

        let declared = UnionDeployment::new(LengthWidth::U8, TypeWidth::U8, false, 0)
            .with_alternative(Deployment::Empty)
            .into();
        assert_eq!(
            writer.serialize_union(&declared, 2, &1u8),
            Err(SerializeError::InvalidTypeIndex(2))
        );
        assert_eq!(decode::<Value>(&[1, 2, 1], &declared), None);
        assert_eq!(decode::<Value>(&[1, 0, 1], &deployment), None);
        assert_eq!(decode::<Value>(&[1, 4, 1], &deployment), None);
    }

    #[test]
    fn trailing_bytes_are_skipped() {
        let deployment = union(LengthWidth::U8, TypeWidth::U8, false, 0);
        let mut reader = Reader::new(vec![3, 1, 1, 0xaa, 0xbb, 9]);
        let (mut value, mut next) = (Value::default(), 0u8);
        reader.read(&mut value, &deployment);
        reader.read(&mut next, &Deployment::Empty);
        assert!(!reader.has_error());
        assert_eq!((value, next), (Value::Flag(true), 9));
    }

    #[test]
    fn alternative_overflowing_the_length_is_rejected() {
        let deployment = union(LengthWidth::U8, TypeWidth::U8, false, 0);
        let text = Value::Text("a".repeat(300));
        assert_eq!(encode(&text, &deployment), None);
        assert_eq!(decode::<Value>(&[2, 2, 0, 0, 0, 7], &deployment), None);
    }
}
