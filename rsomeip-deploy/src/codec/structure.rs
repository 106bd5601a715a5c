//! Structs.
//!
//! A struct is the concatenation of its fields, optionally preceded by a length field covering
//! all of them. Readers skip any bytes inside the length that follow the known fields, so
//! structs can be extended with trailing fields.

use crate::{
    Deployment, Deserialize, DeserializeError, LengthWidth, Reader, Serialize, SerializeError,
    Writer,
};

fn struct_deployment(deployment: &Deployment) -> Result<(LengthWidth, &[Deployment]), &'static str> {
    match deployment {
        Deployment::Empty => Ok((LengthWidth::None, &[])),
        Deployment::Struct(deployment) => Ok((deployment.length_width, &deployment.fields)),
        other => Err(other.kind()),
    }
}

/// Writes the fields of a struct in declaration order.
///
/// Created by [`Writer::serialize_struct`].
#[derive(Debug)]
pub struct FieldWriter<'a> {
    writer: &'a mut Writer,
    fields: &'a [Deployment],
    index: usize,
}

impl FieldWriter<'_> {
    /// Serializes the next field.
    ///
    /// The field uses the deployment given for it in the struct deployment, or the deployment of
    /// its type otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the field cannot be serialized.
    pub fn field<T>(&mut self, value: &T) -> Result<(), SerializeError>
    where
        T: Serialize + ?Sized,
    {
        let site = self.fields.get(self.index);
        self.index += 1;
        self.writer.serialize_site(value, site)
    }
}

/// Reads the fields of a struct in declaration order.
///
/// Created by [`Reader::deserialize_struct`].
#[derive(Debug)]
pub struct FieldReader<'a> {
    reader: &'a mut Reader,
    fields: &'a [Deployment],
    index: usize,
}

impl FieldReader<'_> {
    /// Deserializes the next field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field cannot be deserialized.
    pub fn field<T>(&mut self) -> Result<T, DeserializeError>
    where
        T: Deserialize,
    {
        let site = self.fields.get(self.index);
        self.index += 1;
        self.reader.deserialize_site(site)
    }
}

impl Writer {
    /// Serializes a struct with `arity` fields, which are written by `f`.
    ///
    /// The first field that fails aborts the whole struct.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment is not a struct deployment, if it gives a number of
    /// field deployments other than `arity`, if a field fails, or if the fields do not fit in
    /// the length field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_deploy::{
    ///     Deployment, IntegerDeployment, LengthWidth, Serialize, SerializeError,
    ///     StructDeployment, TypeDeployment, Writer,
    /// };
    ///
    /// struct Point {
    ///     x: u8,
    ///     y: u8,
    /// }
    ///
    /// impl TypeDeployment for Point {}
    ///
    /// impl Serialize for Point {
    ///     fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
    ///         writer.serialize_struct(deployment, 2, |fields| {
    ///             fields.field(&self.x)?;
    ///             fields.field(&self.y)
    ///         })
    ///     }
    /// }
    ///
    /// let deployment = StructDeployment::new(LengthWidth::U8)
    ///     .with_field(IntegerDeployment::new(4))
    ///     .with_field(IntegerDeployment::new(4));
    ///
    /// let mut writer = Writer::new();
    /// writer.write(&Point { x: 1, y: 2 }, &deployment.into());
    /// assert_eq!(writer.body(), [1, 0x21]);
    /// ```
    pub fn serialize_struct(
        &mut self,
        deployment: &Deployment,
        arity: usize,
        f: impl FnOnce(&mut FieldWriter<'_>) -> Result<(), SerializeError>,
    ) -> Result<(), SerializeError> {
        let (length_width, fields) =
            struct_deployment(deployment).map_err(|found| SerializeError::UnexpectedDeployment {
                expected: "struct",
                found,
            })?;
        if !fields.is_empty() && fields.len() != arity {
            return Err(SerializeError::Arity {
                expected: arity,
                found: fields.len(),
            });
        }
        if length_width.is_none() {
            return f(&mut FieldWriter {
                writer: self,
                fields,
                index: 0,
            });
        }
        let placeholder = self.reserve_length(length_width);
        f(&mut FieldWriter {
            writer: self,
            fields,
            index: 0,
        })?;
        self.patch_length(placeholder, placeholder.end())
    }
}

impl Reader {
    /// Deserializes a struct with `arity` fields, which are read by `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment is not a struct deployment, if it gives a number of
    /// field deployments other than `arity`, if the length field exceeds the body, or if a
    /// field fails.
    pub fn deserialize_struct<T>(
        &mut self,
        deployment: &Deployment,
        arity: usize,
        f: impl FnOnce(&mut FieldReader<'_>) -> Result<T, DeserializeError>,
    ) -> Result<T, DeserializeError> {
        let (length_width, fields) = struct_deployment(deployment).map_err(|found| {
            DeserializeError::UnexpectedDeployment {
                expected: "struct",
                found,
            }
        })?;
        if !fields.is_empty() && fields.len() != arity {
            return Err(DeserializeError::Arity {
                expected: arity,
                found: fields.len(),
            });
        }
        if length_width.is_none() {
            return f(&mut FieldReader {
                reader: self,
                fields,
                index: 0,
            });
        }
        let length = self.get_length(length_width)?;
        self.limited(length, |reader| {
            f(&mut FieldReader {
                reader,
                fields,
                index: 0,
            })
        })
    }
}
