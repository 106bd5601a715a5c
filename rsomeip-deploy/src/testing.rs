#![cfg(test)]

use crate::{
    Deployment, Deserialize, DeserializeError, IntegerDeployment, Reader, Serialize,
    SerializeError, TypeDeployment, Writer,
};
use std::sync::LazyLock;

/// Generates a random value in the given range.
pub fn gen_range<T, R>(range: R) -> T
where
    T: rand::distributions::uniform::SampleUniform,
    R: rand::distributions::uniform::SampleRange<T>,
{
    use rand::Rng;
    rand::thread_rng().gen_range(range)
}

/// Generates `len` random bytes.
pub fn gen_bytes(len: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Writes `value` with `deployment` into a new body.
///
/// Returns the flushed body, or `None` if the writer reported an error.
pub fn encode<T: Serialize + ?Sized>(value: &T, deployment: &Deployment) -> Option<Vec<u8>> {
    let mut writer = Writer::new();
    writer.write(value, deployment);
    writer.flush();
    (!writer.has_error()).then(|| writer.body().to_vec())
}

/// Reads a single value with `deployment` from `body`.
///
/// Returns `None` if the reader reported an error.
pub fn decode<T: Deserialize + Default>(body: &[u8], deployment: &Deployment) -> Option<T> {
    let mut reader = Reader::new(body.to_vec());
    let mut value = T::default();
    reader.read(&mut value, deployment);
    (!reader.has_error()).then_some(value)
}

/// Writes and reads back `value` with `deployment`.
pub fn round_trip<T>(value: &T, deployment: &Deployment) -> Option<T>
where
    T: Serialize + Deserialize + Default,
{
    decode(&encode(value, deployment)?, deployment)
}

/// Integer whose type deploys it as four bits wide.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Nibble(pub u8);

impl TypeDeployment for Nibble {
    fn type_deployment() -> Option<&'static Deployment> {
        static DEPLOYMENT: LazyLock<Deployment> =
            LazyLock::new(|| IntegerDeployment::new(4).into());
        Some(&DEPLOYMENT)
    }
}

impl Serialize for Nibble {
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        writer.serialize(&self.0, deployment)
    }
}

impl Deserialize for Nibble {
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        reader.deserialize(deployment).map(Self)
    }
}
