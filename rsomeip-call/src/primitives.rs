//! Identifiers and return codes of service interfaces.

/// Implements basic functionality for new-types that wrap a single primitive.
///
/// Includes const (`new` and `as_`) and non-const (`from` and `into`) methods for converting
/// between the new-type and its internal representation, and implements [`std::fmt::Display`].
macro_rules! impl_basic_type {
    ($name:ident, $repr:ty, $getter:ident, $fmt:literal) => {
        impl $name {
            #[doc=concat!("Creates a new [`", stringify!($name), "`] with the given `value`.")]
            ///
            /// # Examples
            ///
            /// ```rust
            #[doc=concat!("use rsomeip_call::", stringify!($name), ";")]
            ///
            #[doc=concat!("let value = ", stringify!($name), "::new(1 as ", stringify!($repr), ");")]
            #[doc=concat!("assert_eq!(value.", stringify!($getter), "(), 1 as ", stringify!($repr), ");")]
            /// ```
            #[inline]
            #[must_use]
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            #[doc=concat!("Returns the [`", stringify!($repr), "`] representation of this [`", stringify!($name), "`].")]
            #[inline]
            #[must_use]
            pub const fn $getter(self) -> $repr {
                self.0
            }
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }
    };
}

/// Unique identifier of a method or attribute on a service interface.
///
/// Attributes answer get and set requests under their identifier, methods answer calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(u16);

impl_basic_type!(MethodId, u16, as_u16, "{:04x?}");

/// Unique identifier of a broadcast on a service interface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u16);

impl_basic_type!(EventId, u16, as_u16, "{:04x?}");

/// Reason carried by an error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// An unspecified error occurred, like a reply that could not be serialized.
    NotOk,
    /// The requested [`MethodId`] is unknown.
    UnknownMethod,
    /// The request could not be deserialized.
    MalformedMessage,
    /// The requested operation does not apply to the method, like setting a method.
    WrongMessageType,
}

impl From<ReturnCode> for u8 {
    fn from(value: ReturnCode) -> Self {
        match value {
            ReturnCode::NotOk => 0x01,
            ReturnCode::UnknownMethod => 0x03,
            ReturnCode::MalformedMessage => 0x09,
            ReturnCode::WrongMessageType => 0x0a,
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::NotOk => "not ok",
            Self::UnknownMethod => "unknown method",
            Self::MalformedMessage => "malformed message",
            Self::WrongMessageType => "wrong message type",
        };
        write!(f, "{reason} ({:#04x})", u8::from(*self))
    }
}
