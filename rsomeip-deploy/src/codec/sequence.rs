//! Arrays and maps.
//!
//! Without a length field, a sequence holds exactly `max_count` elements. With one, the field
//! records the number of bytes taken by the elements and the number of elements must lie within
//! `[min_count, max_count]`, where a `max_count` of `0` leaves the sequence unbounded.

use crate::{
    resolve, ArrayDeployment, Deployment, Deserialize, DeserializeError, LengthWidth,
    MapDeployment, Reader, Serialize, SerializeError, TypeDeployment, Writer,
};
use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

/// Size constraints shared by arrays and maps.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_count: usize,
    max_count: usize,
    length_width: LengthWidth,
}

impl Bounds {
    const UNBOUNDED: Self = Self {
        min_count: 0,
        max_count: 0,
        length_width: LengthWidth::U32,
    };

    fn admits(self, count: usize) -> bool {
        count >= self.min_count && (self.max_count == 0 || count <= self.max_count)
    }
}

impl From<&ArrayDeployment> for Bounds {
    fn from(value: &ArrayDeployment) -> Self {
        Self {
            min_count: value.min_count,
            max_count: value.max_count,
            length_width: value.length_width,
        }
    }
}

impl From<&MapDeployment> for Bounds {
    fn from(value: &MapDeployment) -> Self {
        Self {
            min_count: value.min_count,
            max_count: value.max_count,
            length_width: value.length_width,
        }
    }
}

/// Checks `count` against `bounds` and frames the elements written by `f`.
///
/// A framed sequence must end on a byte boundary, since its length field counts whole bytes.
fn serialize_elements(
    writer: &mut Writer,
    count: usize,
    bounds: Bounds,
    f: impl FnOnce(&mut Writer) -> Result<(), SerializeError>,
) -> Result<(), SerializeError> {
    if bounds.length_width.is_none() {
        if count != bounds.max_count {
            return Err(SerializeError::CountMismatch {
                expected: bounds.max_count,
                found: count,
            });
        }
        return f(writer);
    }
    if !bounds.admits(count) {
        return Err(SerializeError::CountOutOfBounds {
            found: count,
            min: bounds.min_count,
            max: bounds.max_count,
        });
    }
    let placeholder = writer.reserve_length(bounds.length_width);
    f(writer)?;
    if writer.has_pending_bits() {
        return Err(SerializeError::PartialByte);
    }
    writer.patch_length(placeholder, placeholder.end())
}

/// Reads the elements framed according to `bounds`, calling `f` for each of them.
///
/// Elements narrower than a byte fill the length of a framed sequence exactly, as the writer
/// rejects framed sequences ending inside a byte.
fn deserialize_elements<T>(
    reader: &mut Reader,
    bounds: Bounds,
    mut f: impl FnMut(&mut Reader) -> Result<T, DeserializeError>,
) -> Result<Vec<T>, DeserializeError> {
    if bounds.length_width.is_none() {
        return (0..bounds.max_count).map(|_| f(reader)).collect();
    }
    let length = reader.get_length(bounds.length_width)?;
    let elements = reader.limited(length, |reader| {
        let mut elements = Vec::new();
        while reader.has_pending() {
            elements.push(f(reader)?);
        }
        Ok(elements)
    })?;
    if bounds.admits(elements.len()) {
        Ok(elements)
    } else {
        Err(DeserializeError::CountOutOfBounds {
            found: elements.len(),
            min: bounds.min_count,
            max: bounds.max_count,
        })
    }
}

fn array_deployment<'a>(
    deployment: &'a Deployment,
) -> Result<(Bounds, Option<&'a Deployment>), &'static str> {
    match deployment {
        Deployment::Empty => Ok((Bounds::UNBOUNDED, None)),
        Deployment::Array(array) => Ok((Bounds::from(array), Some(&*array.element))),
        other => Err(other.kind()),
    }
}

fn map_deployment<'a>(
    deployment: &'a Deployment,
) -> Result<(Bounds, Option<&'a Deployment>, Option<&'a Deployment>), &'static str> {
    match deployment {
        Deployment::Empty => Ok((Bounds::UNBOUNDED, None, None)),
        Deployment::Map(map) => Ok((Bounds::from(map), Some(&*map.key), Some(&*map.value))),
        other => Err(other.kind()),
    }
}

impl<T> TypeDeployment for [T] {}

impl<T> Serialize for [T]
where
    T: Serialize,
{
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        let (bounds, element) =
            array_deployment(deployment).map_err(|found| SerializeError::UnexpectedDeployment {
                expected: "array",
                found,
            })?;
        let element = resolve(element, T::type_deployment());
        serialize_elements(writer, self.len(), bounds, |writer| {
            self.iter()
                .try_for_each(|value| writer.serialize(value, element))
        })
    }
}

impl<T> TypeDeployment for Vec<T> {}

impl<T> Serialize for Vec<T>
where
    T: Serialize,
{
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        self.as_slice().serialize(writer, deployment)
    }
}

impl<T> Deserialize for Vec<T>
where
    T: Deserialize,
{
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        let (bounds, element) = array_deployment(deployment).map_err(|found| {
            DeserializeError::UnexpectedDeployment {
                expected: "array",
                found,
            }
        })?;
        let element = resolve(element, T::type_deployment());
        deserialize_elements(reader, bounds, |reader| reader.deserialize(element))
    }
}

fn serialize_entries<'a, K, V>(
    writer: &mut Writer,
    entries: impl ExactSizeIterator<Item = (&'a K, &'a V)>,
    deployment: &Deployment,
) -> Result<(), SerializeError>
where
    K: Serialize + 'a,
    V: Serialize + 'a,
{
    let (bounds, key, value) =
        map_deployment(deployment).map_err(|found| SerializeError::UnexpectedDeployment {
            expected: "map",
            found,
        })?;
    let key = resolve(key, K::type_deployment());
    let value = resolve(value, V::type_deployment());
    let count = entries.len();
    serialize_elements(writer, count, bounds, |writer| {
        entries.into_iter().try_for_each(|(k, v)| {
            writer.serialize(k, key)?;
            writer.serialize(v, value)
        })
    })
}

fn deserialize_entries<K, V>(
    reader: &mut Reader,
    deployment: &Deployment,
) -> Result<Vec<(K, V)>, DeserializeError>
where
    K: Deserialize,
    V: Deserialize,
{
    let (bounds, key, value) = map_deployment(deployment).map_err(|found| {
        DeserializeError::UnexpectedDeployment {
            expected: "map",
            found,
        }
    })?;
    let key = resolve(key, K::type_deployment());
    let value = resolve(value, V::type_deployment());
    deserialize_elements(reader, bounds, |reader| {
        Ok((reader.deserialize(key)?, reader.deserialize(value)?))
    })
}

impl<K, V, S> TypeDeployment for HashMap<K, V, S> {}

impl<K, V, S> Serialize for HashMap<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        serialize_entries(writer, self.iter(), deployment)
    }
}

impl<K, V, S> Deserialize for HashMap<K, V, S>
where
    K: Deserialize + Eq + Hash,
    V: Deserialize,
    S: BuildHasher + Default,
{
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        Ok(deserialize_entries(reader, deployment)?.into_iter().collect())
    }
}

impl<K, V> TypeDeployment for BTreeMap<K, V> {}

impl<K, V> Serialize for BTreeMap<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        serialize_entries(writer, self.iter(), deployment)
    }
}

impl<K, V> Deserialize for BTreeMap<K, V>
where
    K: Deserialize + Ord,
    V: Deserialize,
{
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        Ok(deserialize_entries(reader, deployment)?.into_iter().collect())
    }
}
