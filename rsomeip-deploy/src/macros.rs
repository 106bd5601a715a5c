/// Implements [`TypeDeployment`] for a type, optionally with a deployment of its own.
///
/// [`TypeDeployment`]: crate::TypeDeployment
#[doc(hidden)]
#[macro_export]
macro_rules! __impl_type_deployment {
    ($t:ident) => {
        impl $crate::TypeDeployment for $t {}
    };
    ($t:ident, $deployment:expr) => {
        impl $crate::TypeDeployment for $t {
            fn type_deployment() -> ::core::option::Option<&'static $crate::Deployment> {
                static DEPLOYMENT: ::std::sync::LazyLock<$crate::Deployment> =
                    ::std::sync::LazyLock::new(|| ::core::convert::Into::into($deployment));
                ::core::option::Option::Some(&DEPLOYMENT)
            }
        }
    };
}

/// Implements [`Serialize`] and [`Deserialize`] for a struct, field by field.
///
/// Fields are encoded in the given order. An optional `deployment` parameter declares the
/// deployment of the struct type, which applies wherever the struct is used without a deployment
/// of its own.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{
///     impl_struct, Deployment, IntegerDeployment, LengthWidth, Reader, StructDeployment, Writer,
/// };
///
/// #[derive(Debug, Default, PartialEq, Eq)]
/// struct Point {
///     x: u8,
///     y: u8,
/// }
///
/// impl_struct!(
///     Point { x, y },
///     deployment = StructDeployment::new(LengthWidth::U8)
///         .with_field(IntegerDeployment::new(4))
///         .with_field(IntegerDeployment::new(4))
/// );
///
/// let mut writer = Writer::new();
/// writer.write(&Point { x: 1, y: 2 }, &Deployment::Empty);
/// let body = writer.into_body();
/// assert_eq!(body[..], [1, 0x21]);
///
/// let mut reader = Reader::new(body);
/// let mut point = Point::default();
/// reader.read(&mut point, &Deployment::Empty);
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// [`Serialize`]: crate::Serialize
/// [`Deserialize`]: crate::Deserialize
#[macro_export]
macro_rules! impl_struct {
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => { 1usize + $crate::impl_struct!(@count $($tail)*) };
    ($t:ident { $($field:ident),* $(,)? } $(, deployment = $deployment:expr)? $(,)?) => {
        $crate::__impl_type_deployment!($t $(, $deployment)?);

        impl $crate::Serialize for $t {
            fn serialize(
                &self,
                writer: &mut $crate::Writer,
                deployment: &$crate::Deployment,
            ) -> ::core::result::Result<(), $crate::SerializeError> {
                writer.serialize_struct(
                    deployment,
                    $crate::impl_struct!(@count $($field)*),
                    |fields| {
                        let _ = &fields;
                        $(fields.field(&self.$field)?;)*
                        ::core::result::Result::Ok(())
                    },
                )
            }
        }

        impl $crate::Deserialize for $t {
            fn deserialize(
                reader: &mut $crate::Reader,
                deployment: &$crate::Deployment,
            ) -> ::core::result::Result<Self, $crate::DeserializeError> {
                reader.deserialize_struct(
                    deployment,
                    $crate::impl_struct!(@count $($field)*),
                    |fields| {
                        let _ = &fields;
                        ::core::result::Result::Ok(Self {
                            $($field: fields.field()?,)*
                        })
                    },
                )
            }
        }
    };
}

/// Implements [`Serialize`] and [`Deserialize`] for an [`Enumeration`].
///
/// Values that fail to decode under an enumeration deployment are replaced by its invalid value,
/// built with [`Enumeration::from_invalid`]. An optional `deployment` parameter declares the deployment of the
/// enumeration type.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{impl_enumeration, Deployment, EnumerationDeployment, Enumeration, Reader};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Switch {
///     Off = 0,
///     On = 1,
///     Unknown = 3,
/// }
///
/// impl Enumeration for Switch {
///     const BIT_WIDTH: u8 = 8;
///
///     fn ordinal(&self) -> i64 {
///         *self as i64
///     }
///
///     fn from_ordinal(ordinal: i64) -> Option<Self> {
///         match ordinal {
///             0 => Some(Self::Off),
///             1 => Some(Self::On),
///             3 => Some(Self::Unknown),
///             _ => None,
///         }
///     }
/// }
///
/// impl_enumeration!(Switch, deployment = EnumerationDeployment::new(2, false, 3));
///
/// let mut reader = Reader::new(vec![0b10]);
/// let mut switch = Switch::Off;
/// reader.read(&mut switch, &Deployment::Empty);
/// assert_eq!(switch, Switch::Unknown);
/// ```
///
/// [`Serialize`]: crate::Serialize
/// [`Deserialize`]: crate::Deserialize
/// [`Enumeration`]: crate::Enumeration
/// [`Enumeration::from_invalid`]: crate::Enumeration::from_invalid
#[macro_export]
macro_rules! impl_enumeration {
    ($t:ident $(, deployment = $deployment:expr)? $(,)?) => {
        $crate::__impl_type_deployment!($t $(, $deployment)?);

        impl $crate::Serialize for $t {
            fn serialize(
                &self,
                writer: &mut $crate::Writer,
                deployment: &$crate::Deployment,
            ) -> ::core::result::Result<(), $crate::SerializeError> {
                writer.serialize_enum(self, deployment)
            }
        }

        impl $crate::Deserialize for $t {
            fn deserialize(
                reader: &mut $crate::Reader,
                deployment: &$crate::Deployment,
            ) -> ::core::result::Result<Self, $crate::DeserializeError> {
                reader.deserialize_enum(deployment)
            }

            fn fallback(deployment: &$crate::Deployment) -> ::core::option::Option<Self> {
                <Self as $crate::Enumeration>::fallback(deployment)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{
        testing::{decode, encode, round_trip},
        Deployment, EnumerationDeployment, Enumeration, IntegerDeployment, LengthWidth,
        StructDeployment,
    };

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        #[default]
        Idle = 0,
        Run = 1,
        Fault = 7,
    }

    impl Enumeration for Mode {
        const BIT_WIDTH: u8 = 8;

        fn ordinal(&self) -> i64 {
            *self as i64
        }

        fn from_ordinal(ordinal: i64) -> Option<Self> {
            match ordinal {
                0 => Some(Self::Idle),
                1 => Some(Self::Run),
                7 => Some(Self::Fault),
                _ => None,
            }
        }
    }

    impl_enumeration!(Mode, deployment = EnumerationDeployment::new(3, false, 7));

    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    struct Status {
        mode: Mode,
        level: u8,
        healthy: bool,
    }

    impl_struct!(
        Status { mode, level, healthy },
        deployment = StructDeployment::new(LengthWidth::U8)
            .with_field(Deployment::Empty)
            .with_field(IntegerDeployment::new(4))
            .with_field(IntegerDeployment::new(1)),
    );

    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    struct Unit {}

    impl_struct!(Unit {});

    #[test]
    fn type_deployments_apply_without_site() {
        let value = Status {
            mode: Mode::Run,
            level: 9,
            healthy: true,
        };
        // healthy (1 bit) | level (4 bits) | mode (3 bits)
        assert_eq!(
            encode(&value, &Deployment::Empty),
            Some(vec![1, 0b1100_1001])
        );
        assert_eq!(round_trip(&value, &Deployment::Empty), Some(value));
    }

    #[test]
    fn site_deployment_overrides_type_deployment() {
        let value = Status {
            mode: Mode::Fault,
            level: 2,
            healthy: false,
        };
        let site = StructDeployment::new(LengthWidth::None).into();
        assert_eq!(encode(&value, &site), Some(vec![7, 2, 0]));
        assert_eq!(round_trip(&value, &site), Some(value));
    }

    #[test]
    fn enumeration_fallback_applies_through_macro() {
        assert_eq!(decode::<Mode>(&[0b101], &Deployment::Empty), Some(Mode::Fault));
        assert_eq!(
            decode::<Mode>(&[5], &EnumerationDeployment::new(8, false, 1).into()),
            Some(Mode::Run)
        );
    }

    #[test]
    fn empty_struct_has_no_fields() {
        assert_eq!(encode(&Unit {}, &Deployment::Empty), Some(vec![]));
        assert_eq!(
            encode(&Unit {}, &StructDeployment::new(LengthWidth::U16).into()),
            Some(vec![0, 0])
        );
    }
}
