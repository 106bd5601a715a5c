//! Deployment descriptors.
//!
//! A [`Deployment`] parameterizes how a logical value is mapped to bytes: bit widths, length
//! fields, size bounds, string encodings, and the deployments of nested elements, fields and
//! alternatives. Deployments are immutable once built and can be shared between threads.

use crate::{LengthWidth, TypeWidth};

/// How a value is laid out on the wire.
///
/// [`Deployment::Empty`] imposes no constraints: values are encoded at their native width and
/// dynamically sized values use a 4 byte length field.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{ArrayDeployment, Deployment, IntegerDeployment, LengthWidth};
///
/// let deployment: Deployment =
///     ArrayDeployment::new(IntegerDeployment::new(4), 0, 4, LengthWidth::None).into();
/// assert_eq!(deployment.kind(), "array");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Deployment {
    #[default]
    Empty,
    Integer(IntegerDeployment),
    RangedInteger(RangedIntegerDeployment),
    Enumeration(EnumerationDeployment),
    String(StringDeployment),
    ByteBuffer(ByteBufferDeployment),
    Array(ArrayDeployment),
    Map(MapDeployment),
    Struct(StructDeployment),
    Union(UnionDeployment),
}

impl Deployment {
    /// Returns a short name of the kind of deployment.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Integer(_) => "integer",
            Self::RangedInteger(_) => "ranged integer",
            Self::Enumeration(_) => "enumeration",
            Self::String(_) => "string",
            Self::ByteBuffer(_) => "byte buffer",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
            Self::Union(_) => "union",
        }
    }

    /// Whether this is [`Deployment::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

macro_rules! deployment_from {
    ($variant:ident, $t:ty) => {
        impl From<$t> for Deployment {
            fn from(value: $t) -> Self {
                Self::$variant(value)
            }
        }
    };
}

deployment_from!(Integer, IntegerDeployment);
deployment_from!(RangedInteger, RangedIntegerDeployment);
deployment_from!(Enumeration, EnumerationDeployment);
deployment_from!(String, StringDeployment);
deployment_from!(ByteBuffer, ByteBufferDeployment);
deployment_from!(Array, ArrayDeployment);
deployment_from!(Map, MapDeployment);
deployment_from!(Struct, StructDeployment);
deployment_from!(Union, UnionDeployment);

/// Integer packed into `bit_width` bits.
///
/// Widths larger than the integer type are clamped to the size of the type. Widths up to 8
/// bits are packed into a bit stream shared with adjacent sub-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegerDeployment {
    pub bit_width: u8,
}

impl IntegerDeployment {
    /// Creates a new [`IntegerDeployment`].
    #[inline]
    #[must_use]
    pub const fn new(bit_width: u8) -> Self {
        Self { bit_width }
    }
}

/// Integer restricted to the inclusive range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangedIntegerDeployment {
    pub min: i64,
    pub max: i64,
}

impl RangedIntegerDeployment {
    /// Creates a new [`RangedIntegerDeployment`].
    #[inline]
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_deploy::RangedIntegerDeployment;
    ///
    /// let deployment = RangedIntegerDeployment::new(-5, 5);
    /// assert!(deployment.contains(-5));
    /// assert!(!deployment.contains(6));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains(&self, value: i128) -> bool {
        i128::from(self.min) <= value && value <= i128::from(self.max)
    }
}

/// Enumeration packed into `bit_width` bits.
///
/// Ordinals without a matching enumerator are read as `invalid_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumerationDeployment {
    pub bit_width: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_synthesized: bool,
    pub invalid_value: i64,
}

impl EnumerationDeployment {
    /// Creates a new [`EnumerationDeployment`].
    #[inline]
    #[must_use]
    pub const fn new(bit_width: u8, is_synthesized: bool, invalid_value: i64) -> Self {
        Self {
            bit_width,
            is_synthesized,
            invalid_value,
        }
    }
}

/// Character encoding of a string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
}

impl StringEncoding {
    /// Byte order mark preceding strings in this encoding.
    #[must_use]
    pub const fn bom(self) -> &'static [u8] {
        match self {
            Self::Utf8 => &[0xef, 0xbb, 0xbf],
            Self::Utf16Be => &[0xfe, 0xff],
            Self::Utf16Le => &[0xff, 0xfe],
        }
    }

    /// Size of a single code unit, which is also the size of the terminator.
    #[must_use]
    pub const fn unit_size(self) -> usize {
        match self {
            Self::Utf8 => 1,
            Self::Utf16Be | Self::Utf16Le => 2,
        }
    }
}

/// String with a byte budget and an optional length field.
///
/// Without a length field the string occupies exactly `max_length` bytes. With one, a
/// `max_length` of `0` leaves the string unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringDeployment {
    pub max_length: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub length_width: LengthWidth,
    #[cfg_attr(feature = "serde", serde(default))]
    pub encoding: StringEncoding,
}

impl StringDeployment {
    /// Creates a new [`StringDeployment`].
    #[inline]
    #[must_use]
    pub const fn new(max_length: usize, length_width: LengthWidth, encoding: StringEncoding) -> Self {
        Self {
            max_length,
            length_width,
            encoding,
        }
    }
}

impl Default for StringDeployment {
    fn default() -> Self {
        Self::new(0, LengthWidth::U32, StringEncoding::Utf8)
    }
}

/// Byte buffer with size bounds and an optional length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteBufferDeployment {
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_length: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_length: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub length_width: LengthWidth,
}

impl ByteBufferDeployment {
    /// Creates a new [`ByteBufferDeployment`].
    #[inline]
    #[must_use]
    pub const fn new(min_length: usize, max_length: usize, length_width: LengthWidth) -> Self {
        Self {
            min_length,
            max_length,
            length_width,
        }
    }
}

impl Default for ByteBufferDeployment {
    fn default() -> Self {
        Self::new(0, 0, LengthWidth::U32)
    }
}

/// Array of elements sharing a single element deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayDeployment {
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Box<Deployment>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub length_width: LengthWidth,
}

impl ArrayDeployment {
    /// Creates a new [`ArrayDeployment`].
    #[must_use]
    pub fn new(
        element: impl Into<Deployment>,
        min_count: usize,
        max_count: usize,
        length_width: LengthWidth,
    ) -> Self {
        Self {
            element: Box::new(element.into()),
            min_count,
            max_count,
            length_width,
        }
    }
}

/// Map with key and value deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDeployment {
    #[cfg_attr(feature = "serde", serde(default))]
    pub key: Box<Deployment>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Box<Deployment>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub length_width: LengthWidth,
}

impl MapDeployment {
    /// Creates a new [`MapDeployment`].
    #[must_use]
    pub fn new(
        key: impl Into<Deployment>,
        value: impl Into<Deployment>,
        min_count: usize,
        max_count: usize,
        length_width: LengthWidth,
    ) -> Self {
        Self {
            key: Box::new(key.into()),
            value: Box::new(value.into()),
            min_count,
            max_count,
            length_width,
        }
    }
}

/// Struct with an optional length field and one deployment per field.
///
/// An empty list of fields means that no field deployments were given, so every field uses the
/// deployment of its type.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructDeployment {
    #[cfg_attr(feature = "serde", serde(default))]
    pub length_width: LengthWidth,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fields: Vec<Deployment>,
}

impl StructDeployment {
    /// Creates a new [`StructDeployment`] without field deployments.
    #[inline]
    #[must_use]
    pub const fn new(length_width: LengthWidth) -> Self {
        Self {
            length_width,
            fields: Vec::new(),
        }
    }

    /// Returns `self` with the given field deployment appended.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rsomeip_deploy::{Deployment, IntegerDeployment, LengthWidth, StructDeployment};
    ///
    /// let deployment = StructDeployment::new(LengthWidth::U8)
    ///     .with_field(IntegerDeployment::new(4))
    ///     .with_field(Deployment::Empty);
    /// assert_eq!(deployment.fields.len(), 2);
    /// ```
    #[must_use]
    pub fn with_field(mut self, field: impl Into<Deployment>) -> Self {
        self.fields.push(field.into());
        self
    }
}

/// Union with a type field, an optional length field and one deployment per alternative.
///
/// By default the length field precedes the type field. The extended format swaps them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnionDeployment {
    #[cfg_attr(feature = "serde", serde(default))]
    pub length_width: LengthWidth,
    #[cfg_attr(feature = "serde", serde(default))]
    pub type_width: TypeWidth,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_extended_format: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_length: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternatives: Vec<Deployment>,
}

impl UnionDeployment {
    /// Creates a new [`UnionDeployment`] without alternative deployments.
    #[inline]
    #[must_use]
    pub const fn new(
        length_width: LengthWidth,
        type_width: TypeWidth,
        is_extended_format: bool,
        max_length: usize,
    ) -> Self {
        Self {
            length_width,
            type_width,
            is_extended_format,
            max_length,
            alternatives: Vec::new(),
        }
    }

    /// Returns `self` with the given alternative deployment appended.
    #[must_use]
    pub fn with_alternative(mut self, alternative: impl Into<Deployment>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Returns the deployment of the alternative with the given 1-based `index`, if any.
    #[must_use]
    pub fn alternative(&self, index: u32) -> Option<&Deployment> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        self.alternatives.get(position)
    }
}

impl Default for UnionDeployment {
    fn default() -> Self {
        Self::new(LengthWidth::U32, TypeWidth::U32, false, 0)
    }
}

/// Deployment declared for a type as a whole.
///
/// Types without a deployment of their own keep the default implementation, so their sites
/// resolve to [`Deployment::Empty`] unless the site declares a deployment.
///
/// # Examples
///
/// ```rust
/// use std::sync::LazyLock;
/// use rsomeip_deploy::{Deployment, IntegerDeployment, TypeDeployment};
///
/// struct Nibble(u8);
///
/// impl TypeDeployment for Nibble {
///     fn type_deployment() -> Option<&'static Deployment> {
///         static DEPLOYMENT: LazyLock<Deployment> =
///             LazyLock::new(|| IntegerDeployment::new(4).into());
///         Some(&DEPLOYMENT)
///     }
/// }
///
/// assert!(Nibble::type_deployment().is_some());
/// ```
pub trait TypeDeployment {
    /// Returns the deployment declared for the type, if any.
    fn type_deployment() -> Option<&'static Deployment> {
        None
    }
}

static EMPTY: Deployment = Deployment::Empty;

/// Resolves the effective deployment of a value site.
///
/// A deployment declared at the `site` overrides the one declared at the type level. When
/// neither is present, the site resolves to [`Deployment::Empty`]. An [`Deployment::Empty`]
/// site counts as absent.
///
/// # Examples
///
/// ```rust
/// use rsomeip_deploy::{resolve, Deployment, IntegerDeployment};
///
/// let site = Deployment::from(IntegerDeployment::new(4));
/// let type_level = Deployment::from(IntegerDeployment::new(2));
///
/// assert_eq!(resolve(Some(&site), Some(&type_level)), &site);
/// assert_eq!(resolve(Some(&Deployment::Empty), Some(&type_level)), &type_level);
/// assert_eq!(resolve(None, None), &Deployment::Empty);
/// ```
#[must_use]
pub fn resolve<'a>(site: Option<&'a Deployment>, type_level: Option<&'a Deployment>) -> &'a Deployment {
    site.filter(|deployment| !deployment.is_empty())
        .or(type_level)
        .unwrap_or(&EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_alternatives_are_one_based() {
        let deployment = UnionDeployment::new(LengthWidth::U8, TypeWidth::U8, false, 0)
            .with_alternative(IntegerDeployment::new(3))
            .with_alternative(Deployment::Empty);
        assert_eq!(
            deployment.alternative(1),
            Some(&Deployment::Integer(IntegerDeployment::new(3)))
        );
        assert_eq!(deployment.alternative(2), Some(&Deployment::Empty));
        assert_eq!(deployment.alternative(0), None);
        assert_eq!(deployment.alternative(3), None);
    }

    #[test]
    fn defaults_match_empty_deployment_layout() {
        assert_eq!(StringDeployment::default().length_width, LengthWidth::U32);
        assert_eq!(ByteBufferDeployment::default().length_width, LengthWidth::U32);
        let union = UnionDeployment::default();
        assert_eq!(union.length_width, LengthWidth::U32);
        assert_eq!(union.type_width, TypeWidth::U32);
        assert!(!union.is_extended_format);
    }

    #[test]
    fn site_overrides_type_level() {
        let site = Deployment::from(RangedIntegerDeployment::new(0, 1));
        let type_level = Deployment::from(IntegerDeployment::new(8));
        assert_eq!(resolve(Some(&site), Some(&type_level)), &site);
        assert_eq!(resolve(None, Some(&type_level)), &type_level);
        assert_eq!(resolve(Some(&site), None), &site);
        assert!(resolve(None, None).is_empty());
    }

    #[test]
    fn nested_deployments_are_boxed() {
        let deployment = MapDeployment::new(
            StringDeployment::new(16, LengthWidth::U8, StringEncoding::Utf8),
            ArrayDeployment::new(IntegerDeployment::new(4), 0, 2, LengthWidth::None),
            1,
            8,
            LengthWidth::U16,
        );
        assert_eq!(deployment.key.kind(), "string");
        assert_eq!(deployment.value.kind(), "array");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn load_from_toml() {
        let source = r#"
            kind = "struct"
            length_width = 2

            [[fields]]
            kind = "integer"
            bit_width = 4

            [[fields]]
            kind = "array"
            max_count = 4
            length_width = 1
            element = { kind = "string", max_length = 10, encoding = "utf16_le" }

            [[fields]]
            kind = "empty"
        "#;
        let deployment: Deployment = toml::from_str(source).expect("should parse the deployment");
        let expected = StructDeployment::new(LengthWidth::U16)
            .with_field(IntegerDeployment::new(4))
            .with_field(ArrayDeployment::new(
                StringDeployment::new(10, LengthWidth::None, StringEncoding::Utf16Le),
                0,
                4,
                LengthWidth::U8,
            ))
            .with_field(Deployment::Empty);
        assert_eq!(deployment, Deployment::Struct(expected));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn load_rejects_invalid_widths() {
        let source = r#"
            kind = "byte_buffer"
            length_width = 3
        "#;
        assert!(toml::from_str::<Deployment>(source).is_err());
    }
}
