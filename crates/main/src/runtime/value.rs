////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    any::{Any, TypeId},
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

use crate::runtime::{ExpressionResult, Scope};

/// A signature of the runtime functions bound to the bytecode commands.
///
/// The callback receives the evaluation [Scope] and the window of the value
/// stack that holds the call arguments, and returns the single result of the
/// call.
///
/// Callbacks are plain function pointers. The plugins compare them by address
/// and the compiled programs that store them remain `Send + Sync`.
pub type Callback = fn(&mut Scope<'_>, &[Value]) -> ExpressionResult<Value>;

/// A runtime type tag of the [Value].
///
/// The tag is always available without running user code: see
/// [Value::ty].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    /// The type of the [Value::Void] value. Also serves as the right-hand side
    /// type of the unary operator keys.
    Void,

    /// The type of the [Value::Boolean] values.
    Boolean,

    /// The type of the [Value::Integer] values (`i64`).
    Integer,

    /// The type of the [Value::Float] values (`f64`).
    Float,

    /// The type of the [Value::String] values.
    String,

    /// A host-defined type represented by the Rust type identifier of the
    /// payload.
    Custom(TypeId),
}

impl Type {
    /// Returns the Type of the Rust type `T`.
    ///
    /// The built-in Rust representations (`()`, `bool`, `i64`, `f64`, `str`,
    /// `String`) map to the built-in tags. Any other type maps to
    /// [Type::Custom].
    pub fn of<T: Any + ?Sized>() -> Self {
        let id = TypeId::of::<T>();

        match id {
            _ if id == TypeId::of::<()>() => Self::Void,
            _ if id == TypeId::of::<bool>() => Self::Boolean,
            _ if id == TypeId::of::<i64>() => Self::Integer,
            _ if id == TypeId::of::<f64>() => Self::Float,
            _ if id == TypeId::of::<str>() || id == TypeId::of::<String>() => Self::String,
            _ => Self::Custom(id),
        }
    }

    /// Returns the default display name of the built-in types, or None for
    /// the [Type::Custom] types.
    #[inline(always)]
    pub fn builtin_name(&self) -> Option<&'static str> {
        match self {
            Self::Void => Some("Void"),
            Self::Boolean => Some("Boolean"),
            Self::Integer => Some("Integer"),
            Self::Float => Some("Float"),
            Self::String => Some("String"),
            Self::Custom(_) => None,
        }
    }

    /// Returns true if this type is one of the numeric-like built-in types
    /// (Boolean, Integer or Float).
    #[inline(always)]
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Boolean | Self::Integer | Self::Float)
    }
}

/// A type-erased runtime value.
///
/// Values are used uniformly for the constants embedded into the bytecode,
/// for the slots of the evaluation stack, and for the arguments of the
/// callbacks. Cloning is cheap: strings and custom payloads are reference
/// counted.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Void,

    /// A boolean value.
    Boolean(bool),

    /// A signed 64-bit integer value.
    Integer(i64),

    /// A 64-bit floating-point value.
    Float(f64),

    /// An immutable string value.
    String(Arc<str>),

    /// A host-defined value.
    Custom(CustomValue),
}

impl Debug for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => formatter.write_str("Void"),
            Self::Boolean(value) => formatter.write_fmt(format_args!("Boolean({value})")),
            Self::Integer(value) => formatter.write_fmt(format_args!("Integer({value})")),
            Self::Float(value) => formatter.write_fmt(format_args!("Float({value:?})")),
            Self::String(value) => formatter.write_fmt(format_args!("String({value:?})")),
            Self::Custom(value) => Debug::fmt(value, formatter),
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => Ok(()),
            Self::Boolean(value) => Display::fmt(value, formatter),
            Self::Integer(value) => Display::fmt(value, formatter),
            Self::Float(value) => formatter.write_str(&format_float(*value)),
            Self::String(value) => formatter.write_str(value),
            Self::Custom(value) => formatter.write_fmt(format_args!("<{:?}>", value.ty)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Boolean(lhs), Self::Boolean(rhs)) => lhs == rhs,
            (Self::Integer(lhs), Self::Integer(rhs)) => lhs == rhs,
            (Self::Float(lhs), Self::Float(rhs)) => lhs == rhs,
            (Self::String(lhs), Self::String(rhs)) => lhs == rhs,
            (Self::Custom(lhs), Self::Custom(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Void, Self::Void) => Some(Ordering::Equal),
            (Self::Boolean(lhs), Self::Boolean(rhs)) => lhs.partial_cmp(rhs),
            (Self::Integer(lhs), Self::Integer(rhs)) => lhs.partial_cmp(rhs),
            (Self::Float(lhs), Self::Float(rhs)) => lhs.partial_cmp(rhs),
            (Self::String(lhs), Self::String(rhs)) => lhs.partial_cmp(rhs),
            _ => None,
        }
    }
}

impl From<()> for Value {
    #[inline(always)]
    fn from(_: ()) -> Self {
        Self::Void
    }
}

impl From<bool> for Value {
    #[inline(always)]
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    #[inline(always)]
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    #[inline(always)]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    #[inline(always)]
    fn from(value: &str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    #[inline(always)]
    fn from(value: Arc<str>) -> Self {
        Self::String(value)
    }
}

impl Value {
    /// Creates a [Value::Custom] value from the host data.
    #[inline(always)]
    pub fn custom<T: Any + Send + Sync>(data: T) -> Self {
        Self::Custom(CustomValue::new(data))
    }

    /// Returns the runtime type tag of this value.
    #[inline(always)]
    pub fn ty(&self) -> Type {
        match self {
            Self::Void => Type::Void,
            Self::Boolean(_) => Type::Boolean,
            Self::Integer(_) => Type::Integer,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::Custom(value) => Type::Custom(value.ty),
        }
    }

    /// Interprets this value as a condition.
    ///
    /// False, zero, zero float (and NaN), the empty string, and void are
    /// false. Custom values are always true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Void => false,
            Self::Boolean(value) => *value,
            Self::Integer(value) => *value != 0,
            Self::Float(value) => *value != 0.0 && !value.is_nan(),
            Self::String(value) => !value.is_empty(),
            Self::Custom(_) => true,
        }
    }

    /// Returns the boolean payload, if this is a [Value::Boolean].
    #[inline(always)]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is a [Value::Integer].
    #[inline(always)]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a [Value::Float].
    #[inline(always)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a [Value::String].
    #[inline(always)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a reference to the host data, if this is a [Value::Custom]
    /// value of type `T`.
    #[inline(always)]
    pub fn as_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Converts a Boolean, Integer or Float value into `i64`.
    ///
    /// Floats are truncated toward zero and saturate at the integer bounds.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Self::Boolean(value) => Some(*value as i64),
            Self::Integer(value) => Some(*value),
            Self::Float(value) => Some(match cast::i64(value.trunc()) {
                Ok(value) => value,
                Err(_) if value.is_nan() => 0,
                Err(_) if *value < 0.0 => i64::MIN,
                Err(_) => i64::MAX,
            }),
            _ => None,
        }
    }

    /// Converts a Boolean, Integer or Float value into `f64`.
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Self::Boolean(value) => Some(match value {
                true => 1.0,
                false => 0.0,
            }),
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }
}

/// A payload of the [Value::Custom] values.
#[derive(Clone)]
pub struct CustomValue {
    ty: TypeId,
    data: Arc<dyn Any + Send + Sync>,
}

impl Debug for CustomValue {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("Custom({:?})", self.ty))
    }
}

impl PartialEq for CustomValue {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl CustomValue {
    /// Wraps the host data.
    #[inline(always)]
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self {
            ty: TypeId::of::<T>(),
            data: Arc::new(data),
        }
    }

    /// Returns the Rust type identifier of the wrapped data.
    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    /// Returns a reference to the wrapped data if it is of type `T`.
    #[inline(always)]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

/// Renders a float so that integral values keep the fractional part
/// (`1.0` rather than `1`), which keeps rendered literals typed as floats.
///
/// Large finite values are rendered in the exponent notation (`1e20`).
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }

    if value.abs() >= 1e16 {
        return format!("{value:e}");
    }

    if value.fract() == 0.0 {
        return format!("{value:.1}");
    }

    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::Void.ty(), Type::Void);
        assert_eq!(Value::from(true).ty(), Type::Boolean);
        assert_eq!(Value::from(3i64).ty(), Type::Integer);
        assert_eq!(Value::from(3.5).ty(), Type::Float);
        assert_eq!(Value::from("abc").ty(), Type::String);
        assert_eq!(Value::custom(7u8).ty(), Type::of::<u8>());
        assert_eq!(Type::of::<String>(), Type::String);
        assert_eq!(Type::of::<str>(), Type::String);
    }

    #[test]
    fn test_value_truthiness() {
        assert!(!Value::Void.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(!Value::from(0i64).is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(-1i64).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::custom(()).is_truthy());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(true).to_integer(), Some(1));
        assert_eq!(Value::from(-2.9).to_integer(), Some(-2));
        assert_eq!(Value::from(1e300).to_integer(), Some(i64::MAX));
        assert_eq!(Value::from(5i64).to_float(), Some(5.0));
        assert_eq!(Value::from("5").to_integer(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from(1.0).to_string(), "1.0");
        assert_eq!(Value::from(0.25).to_string(), "0.25");
        assert_eq!(Value::from(1e20).to_string(), "1e20");
        assert_eq!(Value::from(-7i64).to_string(), "-7");
        assert_eq!(Value::from("text").to_string(), "text");
        assert_eq!(Value::Void.to_string(), "");
    }

    #[test]
    fn test_custom_identity() {
        let first = Value::custom(10u32);
        let second = Value::custom(10u32);

        assert_eq!(first, first.clone());
        assert_ne!(first, second);
        assert_eq!(first.as_custom::<u32>(), Some(&10));
        assert_eq!(first.as_custom::<u64>(), None);
    }
}
