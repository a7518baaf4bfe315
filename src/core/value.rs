//! Runtime values carried by sampled data sources.
//!
//! [`Value`] is a closed tagged union over the kinds the composition core
//! inspects, plus an [`Value::Any`] branch for opaque collaborator types
//! (render products, material networks, ...). [`ValueType`] maps Rust
//! types to and from their `Value` variant and is what typed sampled data
//! sources are parameterised over.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use half::f16;

use crate::core::Locator;
use crate::util::{
    DMat4, DVec2, DVec3, DVec4, IVec2, IVec3, IVec4, Path, Quat, Quath, Token, Vec2, Vec3, Vec4,
};

// ============================================================================
// Array
// ============================================================================

/// Immutable shared array. Cloning shares the storage.
pub struct Array<T>(Arc<[T]>);

impl<T> Array<T> {
    /// Create an array from a vector.
    pub fn new(values: Vec<T>) -> Self {
        Self(Arc::from(values))
    }

    /// Check whether two arrays share storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Array<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl<T> Deref for Array<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T: PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0[..] == other.0[..]
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values)
    }
}

impl<T: Clone> From<&[T]> for Array<T> {
    fn from(values: &[T]) -> Self {
        Self(Arc::from(values))
    }
}

impl<T> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// String-keyed dictionary of values.
pub type Dictionary = BTreeMap<String, Value>;

// ============================================================================
// Any
// ============================================================================

/// Opaque value of a type the core does not interpret.
#[derive(Clone)]
pub struct AnyValue {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl AnyValue {
    /// Wrap an arbitrary value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Name of the wrapped type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Any<{}>", self.type_name)
    }
}

// ============================================================================
// Value
// ============================================================================

/// Dynamically typed scene value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value
    #[default]
    Empty,
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Half(f16),
    Token(Token),
    String(String),
    Path(Path),
    Locator(Locator),
    Vec2f(Vec2),
    Vec3f(Vec3),
    Vec4f(Vec4),
    Vec2d(DVec2),
    Vec3d(DVec3),
    Vec4d(DVec4),
    Vec2i(IVec2),
    Vec3i(IVec3),
    Vec4i(IVec4),
    Matrix4d(DMat4),
    Quatf(Quat),
    Quath(Quath),
    BoolArray(Array<bool>),
    IntArray(Array<i32>),
    FloatArray(Array<f32>),
    DoubleArray(Array<f64>),
    TokenArray(Array<Token>),
    StringArray(Array<String>),
    PathArray(Array<Path>),
    Vec2fArray(Array<Vec2>),
    Vec3fArray(Array<Vec3>),
    Vec4fArray(Array<Vec4>),
    Vec3dArray(Array<DVec3>),
    Vec4dArray(Array<DVec4>),
    QuatfArray(Array<Quat>),
    QuathArray(Array<Quath>),
    Matrix4dArray(Array<DMat4>),
    Dictionary(Arc<Dictionary>),
    /// Value of a type outside the closed set
    Any(AnyValue),
}

impl Value {
    /// Wrap an arbitrary collaborator value.
    pub fn from_any<T: Any + Send + Sync>(value: T) -> Self {
        Self::Any(AnyValue::new(value))
    }

    /// Check if this holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Extract a typed value.
    #[inline]
    pub fn get<T: ValueType>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Extract a typed value, falling back to `default` on mismatch.
    #[inline]
    pub fn get_or<T: ValueType>(&self, default: T) -> T {
        T::from_value(self).unwrap_or(default)
    }

    /// Borrow an opaque value of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Any(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Check if this is an array value.
    pub fn is_array(&self) -> bool {
        self.array_len().is_some()
    }

    /// Number of elements for arrays, 0 otherwise.
    pub fn array_size(&self) -> usize {
        self.array_len().unwrap_or(0)
    }

    fn array_len(&self) -> Option<usize> {
        Some(match self {
            Self::BoolArray(a) => a.len(),
            Self::IntArray(a) => a.len(),
            Self::FloatArray(a) => a.len(),
            Self::DoubleArray(a) => a.len(),
            Self::TokenArray(a) => a.len(),
            Self::StringArray(a) => a.len(),
            Self::PathArray(a) => a.len(),
            Self::Vec2fArray(a) => a.len(),
            Self::Vec3fArray(a) => a.len(),
            Self::Vec4fArray(a) => a.len(),
            Self::Vec3dArray(a) => a.len(),
            Self::Vec4dArray(a) => a.len(),
            Self::QuatfArray(a) => a.len(),
            Self::QuathArray(a) => a.len(),
            Self::Matrix4dArray(a) => a.len(),
            _ => return None,
        })
    }

    /// Short name of the held type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Int64(_) => "int64",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Half(_) => "half",
            Self::Token(_) => "token",
            Self::String(_) => "string",
            Self::Path(_) => "path",
            Self::Locator(_) => "locator",
            Self::Vec2f(_) => "float2",
            Self::Vec3f(_) => "float3",
            Self::Vec4f(_) => "float4",
            Self::Vec2d(_) => "double2",
            Self::Vec3d(_) => "double3",
            Self::Vec4d(_) => "double4",
            Self::Vec2i(_) => "int2",
            Self::Vec3i(_) => "int3",
            Self::Vec4i(_) => "int4",
            Self::Matrix4d(_) => "matrix4d",
            Self::Quatf(_) => "quatf",
            Self::Quath(_) => "quath",
            Self::BoolArray(_) => "bool[]",
            Self::IntArray(_) => "int[]",
            Self::FloatArray(_) => "float[]",
            Self::DoubleArray(_) => "double[]",
            Self::TokenArray(_) => "token[]",
            Self::StringArray(_) => "string[]",
            Self::PathArray(_) => "path[]",
            Self::Vec2fArray(_) => "float2[]",
            Self::Vec3fArray(_) => "float3[]",
            Self::Vec4fArray(_) => "float4[]",
            Self::Vec3dArray(_) => "double3[]",
            Self::Vec4dArray(_) => "double4[]",
            Self::QuatfArray(_) => "quatf[]",
            Self::QuathArray(_) => "quath[]",
            Self::Matrix4dArray(_) => "matrix4d[]",
            Self::Dictionary(_) => "dictionary",
            Self::Any(any) => any.type_name(),
        }
    }

    /// JSON rendering for debugging dumps.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value as Json};

        fn arr<T, F: Fn(&T) -> Json>(a: &[T], f: F) -> Json {
            Json::Array(a.iter().map(f).collect())
        }

        match self {
            Self::Empty => Json::Null,
            Self::Bool(v) => json!(v),
            Self::Int(v) => json!(v),
            Self::Int64(v) => json!(v),
            Self::Float(v) => json!(v),
            Self::Double(v) => json!(v),
            Self::Half(v) => json!(v.to_f32()),
            Self::Token(v) => json!(v.as_str()),
            Self::String(v) => json!(v),
            Self::Path(v) => json!(v.to_string()),
            Self::Locator(v) => json!(v.to_string()),
            Self::Vec2f(v) => json!(v.to_array()),
            Self::Vec3f(v) => json!(v.to_array()),
            Self::Vec4f(v) => json!(v.to_array()),
            Self::Vec2d(v) => json!(v.to_array()),
            Self::Vec3d(v) => json!(v.to_array()),
            Self::Vec4d(v) => json!(v.to_array()),
            Self::Vec2i(v) => json!(v.to_array()),
            Self::Vec3i(v) => json!(v.to_array()),
            Self::Vec4i(v) => json!(v.to_array()),
            Self::Matrix4d(m) => json!(m.to_cols_array()),
            Self::Quatf(q) => json!(q.to_array()),
            Self::Quath(q) => json!(q.to_quat().to_array()),
            Self::BoolArray(a) => arr(a, |v| json!(v)),
            Self::IntArray(a) => arr(a, |v| json!(v)),
            Self::FloatArray(a) => arr(a, |v| json!(v)),
            Self::DoubleArray(a) => arr(a, |v| json!(v)),
            Self::TokenArray(a) => arr(a, |v| json!(v.as_str())),
            Self::StringArray(a) => arr(a, |v| json!(v)),
            Self::PathArray(a) => arr(a, |v| json!(v.to_string())),
            Self::Vec2fArray(a) => arr(a, |v| json!(v.to_array())),
            Self::Vec3fArray(a) => arr(a, |v| json!(v.to_array())),
            Self::Vec4fArray(a) => arr(a, |v| json!(v.to_array())),
            Self::Vec3dArray(a) => arr(a, |v| json!(v.to_array())),
            Self::Vec4dArray(a) => arr(a, |v| json!(v.to_array())),
            Self::QuatfArray(a) => arr(a, |v| json!(v.to_array())),
            Self::QuathArray(a) => arr(a, |v| json!(v.to_quat().to_array())),
            Self::Matrix4dArray(a) => arr(a, |v| json!(v.to_cols_array())),
            Self::Dictionary(d) => Json::Object(
                d.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Any(any) => json!(format!("<{}>", any.type_name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("<empty>"),
            Self::Token(t) => write!(f, "{}", t),
            Self::String(s) => write!(f, "{}", s),
            Self::Path(p) => write!(f, "{}", p),
            Self::Locator(l) => write!(f, "{}", l),
            Self::Any(any) => write!(f, "<{}>", any.type_name()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

// ============================================================================
// ValueType
// ============================================================================

/// Rust types that have a [`Value`] variant.
pub trait ValueType: Clone + Default + Send + Sync + 'static {
    /// Extract from a value, `None` on type mismatch.
    fn from_value(value: &Value) -> Option<Self>;

    /// Wrap into a value.
    fn into_value(self) -> Value;
}

impl ValueType for Value {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    #[inline]
    fn into_value(self) -> Value {
        self
    }
}

macro_rules! impl_value_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ValueType for $ty {
                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }

                #[inline]
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_type! {
    bool => Bool,
    i32 => Int,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
    f16 => Half,
    Token => Token,
    String => String,
    Path => Path,
    Locator => Locator,
    Vec2 => Vec2f,
    Vec3 => Vec3f,
    Vec4 => Vec4f,
    DVec2 => Vec2d,
    DVec3 => Vec3d,
    DVec4 => Vec4d,
    IVec2 => Vec2i,
    IVec3 => Vec3i,
    IVec4 => Vec4i,
    DMat4 => Matrix4d,
    Quat => Quatf,
    Quath => Quath,
    Array<bool> => BoolArray,
    Array<i32> => IntArray,
    Array<f32> => FloatArray,
    Array<f64> => DoubleArray,
    Array<Token> => TokenArray,
    Array<String> => StringArray,
    Array<Path> => PathArray,
    Array<Vec2> => Vec2fArray,
    Array<Vec3> => Vec3fArray,
    Array<Vec4> => Vec4fArray,
    Array<DVec3> => Vec3dArray,
    Array<DVec4> => Vec4dArray,
    Array<Quat> => QuatfArray,
    Array<Quath> => QuathArray,
    Array<DMat4> => Matrix4dArray,
    Arc<Dictionary> => Dictionary,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
