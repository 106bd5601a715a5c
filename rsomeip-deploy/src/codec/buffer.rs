//! Byte buffers.

use crate::{
    ByteBufferDeployment, Deployment, DeserializeError, Reader, Serialize, SerializeError,
    TypeDeployment, Writer,
};
use bytes::Bytes;

fn buffer_deployment(deployment: &Deployment) -> Option<ByteBufferDeployment> {
    match deployment {
        Deployment::Empty => Some(ByteBufferDeployment::default()),
        Deployment::ByteBuffer(deployment) => Some(*deployment),
        _ => None,
    }
}

impl TypeDeployment for Bytes {}

impl Serialize for Bytes {
    fn serialize(&self, writer: &mut Writer, deployment: &Deployment) -> Result<(), SerializeError> {
        let deployment =
            buffer_deployment(deployment).ok_or(SerializeError::UnexpectedDeployment {
                expected: "byte buffer",
                found: deployment.kind(),
            })?;
        if deployment.length_width.is_none() {
            if deployment.max_length > 0 && self.len() > deployment.max_length {
                return Err(SerializeError::TooLong {
                    found: self.len(),
                    max: deployment.max_length,
                });
            }
            writer.put_slice(self);
            return Ok(());
        }
        if self.len() < deployment.min_length {
            return Err(SerializeError::TooShort {
                found: self.len(),
                min: deployment.min_length,
            });
        }
        let mut capacity = deployment.length_width.max_length();
        if deployment.max_length > 0 {
            capacity = capacity.min(deployment.max_length);
        }
        if self.len() > capacity {
            tracing::trace!(len = self.len(), capacity, "truncating byte buffer");
        }
        let len = self.len().min(capacity);
        writer.put_length(len, deployment.length_width)?;
        writer.put_slice(&self[..len]);
        Ok(())
    }
}

impl crate::Deserialize for Bytes {
    fn deserialize(reader: &mut Reader, deployment: &Deployment) -> Result<Self, DeserializeError> {
        let deployment =
            buffer_deployment(deployment).ok_or(DeserializeError::UnexpectedDeployment {
                expected: "byte buffer",
                found: deployment.kind(),
            })?;
        if deployment.length_width.is_none() {
            let mut len = reader.remaining();
            if deployment.max_length > 0 {
                len = len.min(deployment.max_length);
            }
            return reader.get_slice(len);
        }
        let len = reader.get_length(deployment.length_width)?;
        if len < deployment.min_length || (deployment.max_length > 0 && len > deployment.max_length)
        {
            return Err(DeserializeError::LengthOutOfBounds {
                found: len,
                min: deployment.min_length,
                max: deployment.max_length,
            });
        }
        reader.get_slice(len)
    }
}
