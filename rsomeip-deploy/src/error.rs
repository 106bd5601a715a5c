//! Errors produced while building deployments and while serializing or deserializing values.

/// Error returned when a value cannot be serialized according to its deployment.
///
/// Serialization errors are detected locally, before any bytes of the offending value are
/// committed to the message body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("value {value} is outside of the range [{min}, {max}]")]
    OutOfRange { value: i128, min: i128, max: i128 },
    #[error("expected exactly {expected} elements, found {found}")]
    CountMismatch { expected: usize, found: usize },
    #[error("{found} elements are outside of the bounds [{min}, {max}]")]
    CountOutOfBounds { found: usize, min: usize, max: usize },
    #[error("{found} bytes is less than the minimum of {min}")]
    TooShort { found: usize, min: usize },
    #[error("{found} bytes exceeds the maximum of {max}")]
    TooLong { found: usize, max: usize },
    #[error("length {length} cannot be represented in {width} bytes")]
    LengthOverflow { length: usize, width: usize },
    #[error("elements of a framed sequence must end on a byte boundary")]
    PartialByte,
    #[error("expected {expected} nested deployments, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("type index {0} is not valid")]
    InvalidTypeIndex(u32),
    #[error("invalid deployment: {0}")]
    InvalidDeployment(&'static str),
    #[error("cannot serialize {expected} with a {found} deployment")]
    UnexpectedDeployment {
        expected: &'static str,
        found: &'static str,
    },
}

/// Error returned when a value cannot be deserialized according to its deployment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeserializeError {
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    EndOfBuffer { needed: usize, remaining: usize },
    #[error("value {value} is outside of the range [{min}, {max}]")]
    OutOfRange { value: i128, min: i128, max: i128 },
    #[error("{found} elements are outside of the bounds [{min}, {max}]")]
    CountOutOfBounds { found: usize, min: usize, max: usize },
    #[error("length {found} is outside of the bounds [{min}, {max}]")]
    LengthOutOfBounds { found: usize, min: usize, max: usize },
    #[error("invalid encoding: {0}")]
    InvalidEncoding(&'static str),
    #[error("type index {0} is not valid")]
    InvalidTypeIndex(u32),
    #[error("no enumerator with ordinal {0}")]
    InvalidEnumerator(i64),
    #[error("expected {expected} nested deployments, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("invalid deployment: {0}")]
    InvalidDeployment(&'static str),
    #[error("cannot deserialize {expected} with a {found} deployment")]
    UnexpectedDeployment {
        expected: &'static str,
        found: &'static str,
    },
}

/// Error returned when a deployment is built from invalid raw parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeploymentError {
    #[error("length width must be 0, 1, 2 or 4 bytes, found {0}")]
    LengthWidth(u8),
    #[error("type width must be 1, 2 or 4 bytes, found {0}")]
    TypeWidth(u8),
}
